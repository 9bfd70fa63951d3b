use std::fs::File;
use std::path::{Component, Path, PathBuf};

use pathanon_domain::{CaseId, RowErrorKind};

const MACOS_METADATA_DIR: &str = "__MACOSX";

/// A zipped case unpacked under the temporary directory. The extraction is
/// left on disk until `remove` is called, so a failed case can be inspected.
#[derive(Debug)]
pub struct ExtractedCase {
    dir: PathBuf,
    root: PathBuf,
}

impl ExtractedCase {
    pub fn extract(
        archive_path: &Path,
        tmpdir: &Path,
        case_id: &CaseId,
        case_name: &str,
    ) -> Result<Self, RowErrorKind> {
        let unreadable = || RowErrorKind::ArchiveUnreadable {
            case: case_name.to_string(),
        };
        let io_failed = |detail: &str| RowErrorKind::CaseUnreadable {
            case: case_name.to_string(),
            detail: detail.to_string(),
        };

        let dir = tmpdir.join(format!("{}.extract", case_id.as_str()));
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .map_err(|_| io_failed("stale extraction directory could not be removed"))?;
        }
        std::fs::create_dir_all(&dir)
            .map_err(|_| io_failed("extraction directory could not be created"))?;

        let file = File::open(archive_path).map_err(|_| unreadable())?;
        let mut archive = zip::ZipArchive::new(file).map_err(|_| unreadable())?;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|_| unreadable())?;

            if let Some(mode) = entry.unix_mode()
                && mode & 0o170000 == 0o120000
            {
                return Err(RowErrorKind::ArchiveUnsafeEntry {
                    case: case_name.to_string(),
                });
            }
            let Some(relative) = entry.enclosed_name() else {
                return Err(RowErrorKind::ArchiveUnsafeEntry {
                    case: case_name.to_string(),
                });
            };
            if is_macos_metadata(&relative) {
                continue;
            }

            let target = dir.join(&relative);
            if entry.is_dir() {
                std::fs::create_dir_all(&target)
                    .map_err(|_| io_failed("archive directory could not be created"))?;
                continue;
            }
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|_| io_failed("archive directory could not be created"))?;
            }
            let mut out =
                File::create(&target).map_err(|_| io_failed("archive entry could not be written"))?;
            std::io::copy(&mut entry, &mut out).map_err(|_| unreadable())?;
        }

        let root = single_case_dir(&dir, case_id).unwrap_or_else(|| dir.clone());
        Ok(Self { dir, root })
    }

    /// Directory holding the `BLOCK_STAIN` subdirectories.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn remove(self) -> std::io::Result<()> {
        std::fs::remove_dir_all(&self.dir)
    }
}

fn is_macos_metadata(relative: &Path) -> bool {
    matches!(
        relative.components().next(),
        Some(Component::Normal(first)) if first == MACOS_METADATA_DIR
    )
}

// Archives are usually made by zipping the case folder itself, so the slide
// directories sit one level down inside `<case_id>/`.
fn single_case_dir(dir: &Path, case_id: &CaseId) -> Option<PathBuf> {
    let mut entries = std::fs::read_dir(dir).ok()?;
    let only = entries.next()?.ok()?;
    if entries.next().is_some() {
        return None;
    }
    let is_dir = only.file_type().ok()?.is_dir();
    (is_dir && only.file_name() == case_id.as_str()).then(|| only.path())
}
