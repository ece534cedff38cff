//! File layout of one run directory.
//!
//! ```text
//! validation_<YYYYMMDD_HHMMSS>/
//!     valid/matched_signals.xlsx
//!     valid/matched_signals.json
//!     valid/validation_summary.txt
//!     not_valid/ce_unmatched.xlsx
//!     not_valid/pe_unmatched.xlsx
//!     validation_meta.json
//!     summary.xlsx
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

pub const VALID_DIR: &str = "valid";
pub const NOT_VALID_DIR: &str = "not_valid";

/// Paths of every artifact under a run directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    base: PathBuf,
}

impl RunLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Directory name for a run started at `ts`.
    pub fn dir_name(ts: &NaiveDateTime) -> String {
        format!("validation_{}", ts.format("%Y%m%d_%H%M%S"))
    }

    /// First free run directory under `root` for a run started at `ts`.
    ///
    /// Appends `_1`, `_2`, ... when the plain name is taken.
    pub fn allocate(root: &Path, ts: &NaiveDateTime) -> Self {
        let name = Self::dir_name(ts);
        let mut candidate = root.join(&name);
        let mut n = 1;
        while candidate.exists() {
            candidate = root.join(format!("{}_{}", name, n));
            n += 1;
        }
        Self::new(candidate)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn valid_dir(&self) -> PathBuf {
        self.base.join(VALID_DIR)
    }

    pub fn not_valid_dir(&self) -> PathBuf {
        self.base.join(NOT_VALID_DIR)
    }

    pub fn matched_xlsx(&self) -> PathBuf {
        self.valid_dir().join("matched_signals.xlsx")
    }

    pub fn matched_json(&self) -> PathBuf {
        self.valid_dir().join("matched_signals.json")
    }

    pub fn text_summary(&self) -> PathBuf {
        self.valid_dir().join("validation_summary.txt")
    }

    pub fn ce_unmatched_xlsx(&self) -> PathBuf {
        self.not_valid_dir().join("ce_unmatched.xlsx")
    }

    pub fn pe_unmatched_xlsx(&self) -> PathBuf {
        self.not_valid_dir().join("pe_unmatched.xlsx")
    }

    pub fn meta_json(&self) -> PathBuf {
        self.base.join("validation_meta.json")
    }

    pub fn summary_xlsx(&self) -> PathBuf {
        self.base.join("summary.xlsx")
    }

    /// Every artifact path, in write order.
    pub fn artifacts(&self) -> Vec<PathBuf> {
        vec![
            self.matched_xlsx(),
            self.matched_json(),
            self.text_summary(),
            self.ce_unmatched_xlsx(),
            self.pe_unmatched_xlsx(),
            self.meta_json(),
            self.summary_xlsx(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    #[test]
    fn test_dir_name() {
        assert_eq!(RunLayout::dir_name(&ts()), "validation_20240105_090507");
    }

    #[test]
    fn test_paths() {
        let layout = RunLayout::new("/runs/validation_20240105_090507");
        assert_eq!(
            layout.matched_json(),
            PathBuf::from("/runs/validation_20240105_090507/valid/matched_signals.json")
        );
        assert_eq!(
            layout.pe_unmatched_xlsx(),
            PathBuf::from("/runs/validation_20240105_090507/not_valid/pe_unmatched.xlsx")
        );
        assert_eq!(
            layout.meta_json(),
            PathBuf::from("/runs/validation_20240105_090507/validation_meta.json")
        );
        assert_eq!(layout.artifacts().len(), 7);
    }

    #[test]
    fn test_allocate_skips_taken_names() {
        let root = tempfile::tempdir().unwrap();
        let first = RunLayout::allocate(root.path(), &ts());
        assert_eq!(first.base(), root.path().join("validation_20240105_090507"));

        std::fs::create_dir(first.base()).unwrap();
        let second = RunLayout::allocate(root.path(), &ts());
        assert_eq!(second.base(), root.path().join("validation_20240105_090507_1"));
    }
}
