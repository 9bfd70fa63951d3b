use std::collections::BTreeSet;
use std::path::Path;

use pathanon_domain::Barcode;

/// Files in the output directory whose barcode the ledger does not know.
/// Nothing is deleted. A missing directory has no garbage.
pub fn detect_garbage(
    out_dir: &Path,
    known: &BTreeSet<Barcode>,
) -> Result<Vec<String>, std::io::Error> {
    let entries = match std::fs::read_dir(out_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut garbage = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !known.contains(&Barcode::from_output_file_name(&name)) {
            garbage.push(name);
        }
    }
    garbage.sort();
    Ok(garbage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathanon_domain::AnonId;

    #[test]
    fn unknown_barcodes_are_reported_sorted() {
        let dir = std::env::temp_dir().join(format!(
            "pathanon_garbage_test_{}_sorted",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("subdir")).expect("mkdir");
        for name in [
            "P001;P001;A;HE_anon.svs",
            "P009;P009;A;HE_anon.svs",
            "README",
        ] {
            std::fs::write(dir.join(name), b"x").expect("write");
        }

        let known = BTreeSet::from([Barcode::new(
            &AnonId::new("P001").expect("anon"),
            "A",
            "HE",
        )]);
        let garbage = detect_garbage(&dir, &known).expect("scan");
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(garbage, vec!["P009;P009;A;HE_anon.svs", "README"]);
    }

    #[test]
    fn missing_directory_has_no_garbage() {
        let dir = std::env::temp_dir().join(format!(
            "pathanon_garbage_test_{}_missing",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        assert!(detect_garbage(&dir, &BTreeSet::new()).expect("scan").is_empty());
    }
}
