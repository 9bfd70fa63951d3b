use std::path::Path;

use pathanon_domain::{LedgerSchema, RowErrorKind, SlideRecord, split_slide_dir_name};

/// Finds the single slide image in each `BLOCK_STAIN` subdirectory of a case.
/// Subdirectories are visited in name order.
pub fn discover_slides(
    case_root: &Path,
    case_name: &str,
    schema: &LedgerSchema,
) -> Result<Vec<SlideRecord>, RowErrorKind> {
    let unreadable = |detail: &str| RowErrorKind::CaseUnreadable {
        case: case_name.to_string(),
        detail: detail.to_string(),
    };

    let mut slide_dirs = Vec::new();
    let entries = std::fs::read_dir(case_root).map_err(|_| unreadable("not a readable directory"))?;
    for entry in entries {
        let entry = entry.map_err(|_| unreadable("directory listing failed"))?;
        let file_type = entry
            .file_type()
            .map_err(|_| unreadable("directory listing failed"))?;
        if file_type.is_dir() {
            slide_dirs.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    slide_dirs.sort();

    let mut slides = Vec::with_capacity(slide_dirs.len());
    for dir_name in slide_dirs {
        let Some((block, stain)) = split_slide_dir_name(&dir_name) else {
            return Err(RowErrorKind::InvalidSlideDirectory {
                directory: dir_name,
                case: case_name.to_string(),
            });
        };

        let dir_path = case_root.join(&dir_name);
        let mut found = Vec::new();
        let files = std::fs::read_dir(&dir_path).map_err(|_| unreadable("slide directory unreadable"))?;
        for file in files {
            let file = file.map_err(|_| unreadable("slide directory unreadable"))?;
            let is_file = file.file_type().is_ok_and(|t| t.is_file());
            let name = file.file_name().to_string_lossy().into_owned();
            if is_file && schema.is_slide_file(&name) {
                found.push(name);
            }
        }
        found.sort();

        if found.len() != 1 {
            return Err(RowErrorKind::SlideCount {
                directory: dir_name,
                case: case_name.to_string(),
                found,
            });
        }
        let file_name = found.remove(0);
        slides.push(SlideRecord {
            block: block.to_string(),
            stain: stain.to_string(),
            source_path: dir_path.join(&file_name),
            relative_path: format!("{dir_name}/{file_name}"),
        });
    }

    if slides.is_empty() {
        return Err(RowErrorKind::NoSlides {
            case: case_name.to_string(),
        });
    }
    Ok(slides)
}
