pub mod anonymizer;
pub mod archive;
mod error;
pub mod garbage;
pub mod orchestrator;
pub mod slides;

pub use anonymizer::{
    Anonymizer, AnonymizerError, DEFAULT_ANONYMIZER, InvocationStyle, ProcessAnonymizer,
};
pub use archive::ExtractedCase;
pub use error::EngineError;
pub use garbage::detect_garbage;
pub use orchestrator::{
    NoopObserver, RunObserver, RunOptions, RunOutcome, RunReport, WorkLayout, run,
};
pub use slides::discover_slides;
