use core::fmt;

macro_rules! text_id_newtype {
    ($name:ident) => {
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

text_id_newtype!(CaseId);
text_id_newtype!(AnonId);
text_id_newtype!(Barcode);

const ARCHIVE_SUFFIX: &str = ".zip";

/// Last path component of a case reference. Ledgers are edited on several
/// platforms, so both separators are accepted.
pub fn case_basename(case_ref: &str) -> &str {
    let trimmed = case_ref.trim();
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed)
        .trim()
}

pub fn is_archive_ref(case_ref: &str) -> bool {
    let name = case_basename(case_ref);
    name.len() > ARCHIVE_SUFFIX.len()
        && name
            .get(name.len() - ARCHIVE_SUFFIX.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_SUFFIX))
}

impl CaseId {
    pub fn from_case_ref(case_ref: &str) -> Option<Self> {
        let name = case_basename(case_ref);
        let id = if is_archive_ref(name) {
            &name[..name.len() - ARCHIVE_SUFFIX.len()]
        } else {
            name
        };
        if id.is_empty() {
            return None;
        }
        Some(Self(id.to_string()))
    }
}

impl AnonId {
    pub fn new(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(Self(raw.to_string()))
    }
}

impl Barcode {
    pub fn new(anon_id: &AnonId, block: &str, stain: &str) -> Self {
        Self(format!("{0};{0};{1};{2}", anon_id.as_str(), block, stain))
    }

    /// Anonymized outputs are named `<barcode>_<suffix>`; everything before the
    /// last underscore is the barcode.
    pub fn from_output_file_name(file_name: &str) -> Self {
        let stem = match file_name.rsplit_once('_') {
            Some((stem, _)) => stem,
            None => file_name,
        };
        Self(stem.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonIdFormat {
    prefix: String,
    digits: usize,
}

impl AnonIdFormat {
    pub fn new(prefix: &str, digits: usize) -> Option<Self> {
        if digits == 0 || digits > 18 {
            return None;
        }
        if prefix.chars().last().is_some_and(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            prefix: prefix.to_string(),
            digits,
        })
    }

    /// Derives prefix and width from an id such as `P001`.
    pub fn infer(anon_id: &AnonId) -> Option<Self> {
        let raw = anon_id.as_str();
        let prefix_len = raw.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        Self::new(&raw[..prefix_len], raw.len() - prefix_len)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn digits(&self) -> usize {
        self.digits
    }

    pub fn max_number(&self) -> u64 {
        10_u64.pow(self.digits as u32) - 1
    }

    pub fn parse_number(&self, anon_id: &AnonId) -> Option<u64> {
        let raw = anon_id.as_str();
        let suffix = raw.strip_prefix(self.prefix.as_str())?;
        if suffix.len() != self.digits || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number = suffix.parse::<u64>().ok()?;
        (number > 0).then_some(number)
    }

    pub fn format(&self, number: u64) -> Option<AnonId> {
        if number == 0 || number > self.max_number() {
            return None;
        }
        Some(AnonId(format!(
            "{}{:0width$}",
            self.prefix,
            number,
            width = self.digits
        )))
    }
}

impl fmt::Display for AnonIdFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, "#".repeat(self.digits))
    }
}
