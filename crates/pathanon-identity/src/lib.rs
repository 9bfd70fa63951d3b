pub mod allocator;
pub mod mapping;
pub mod validate;

pub use allocator::IdentifierAllocator;
pub use mapping::IdentifierMap;
pub use validate::{ValidatedLedger, validate_ledger};
