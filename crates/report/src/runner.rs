//! Validation runner.
//!
//! Drives one run over the three streams: normalize, match, summarize, and
//! write the artifact set into a fresh run directory. Artifacts are written
//! into a hidden staging directory that is renamed into place once every file
//! is on disk; a run directory that exists is always complete.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{info, warn};
use validator_core::config::ReportConfig;
use validator_core::{Config, Error, NormalizedRecord, RawRecord, Result, Streams};
use validator_ingestion::normalize_streams;
use validator_matching::{CrossStreamMatcher, MatchOutcome};

use crate::export::{self, MatchedRow};
use crate::layout::RunLayout;
use crate::reports;
use crate::summary::{RunSummary, ValidationMeta};
use crate::xlsx;

/// Everything one run computes, before anything is written.
#[derive(Debug, Clone)]
pub struct ValidationRun {
    pub generated_at: NaiveDateTime,
    pub streams: Streams<Vec<NormalizedRecord>>,
    pub outcome: MatchOutcome,
    pub summary: RunSummary,
}

impl ValidationRun {
    /// Metadata digest of this run.
    pub fn meta(&self) -> ValidationMeta {
        ValidationMeta::new(&self.generated_at, &self.streams, self.outcome.matched.len())
    }

    /// Rows of the matched-signals export.
    pub fn matched_rows(&self) -> Vec<MatchedRow> {
        self.outcome.matched.iter().map(MatchedRow::from).collect()
    }
}

/// Where a finished run put its artifacts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub base_directory: PathBuf,
    pub matched_json_file: PathBuf,
    pub meta_json_file: PathBuf,
    pub summary: RunSummary,
}

/// Runs validations with a fixed configuration.
pub struct ValidationRunner {
    config: Config,
    matcher: CrossStreamMatcher,
}

impl Default for ValidationRunner {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl ValidationRunner {
    /// Create a runner from configuration.
    pub fn new(config: Config) -> Self {
        let matcher = CrossStreamMatcher::from_config(&config.matching);
        Self { config, matcher }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Normalize, match and summarize without touching the filesystem.
    pub fn evaluate(
        &self,
        ce: &[RawRecord],
        pe: &[RawRecord],
        index: &[RawRecord],
        generated_at: NaiveDateTime,
    ) -> ValidationRun {
        let streams = normalize_streams(ce, pe, index);
        let outcome = self
            .matcher
            .match_streams(&streams.ce, &streams.pe, &streams.index);
        let summary = RunSummary::new(&streams, &outcome);

        ValidationRun {
            generated_at,
            streams,
            outcome,
            summary,
        }
    }

    /// Run a validation stamped with the current local time.
    pub fn run(&self, ce: &[RawRecord], pe: &[RawRecord], index: &[RawRecord]) -> Result<RunResult> {
        self.run_at(ce, pe, index, Local::now().naive_local())
    }

    /// Run a validation stamped with `generated_at`.
    pub fn run_at(
        &self,
        ce: &[RawRecord],
        pe: &[RawRecord],
        index: &[RawRecord],
        generated_at: NaiveDateTime,
    ) -> Result<RunResult> {
        info!(
            ce = ce.len(),
            pe = pe.len(),
            index = index.len(),
            "starting validation run"
        );
        let run = self.evaluate(ce, pe, index, generated_at);
        self.write(&run)
    }

    /// Write the artifact set of `run` into a new run directory.
    pub fn write(&self, run: &ValidationRun) -> Result<RunResult> {
        let root = self.config.report.output_root.as_path();
        fs::create_dir_all(root)?;

        let layout = RunLayout::allocate(root, &run.generated_at);
        let staging = RunLayout::new(staging_dir(root, &layout)?);
        if staging.base().exists() {
            fs::remove_dir_all(staging.base())?;
        }

        let written = write_artifacts(&staging, run, &self.config.report)
            .and_then(|()| fs::rename(staging.base(), layout.base()).map_err(Error::from));

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_dir_all(staging.base()) {
                warn!(path = %staging.base().display(), error = %cleanup, "failed to remove staging directory");
            }
            return Err(e);
        }

        info!(
            path = %layout.base().display(),
            valid = run.summary.valid_trades,
            ce_not_confirmed = run.summary.ce_not_confirmed,
            pe_not_confirmed = run.summary.pe_not_confirmed,
            match_pct = run.summary.match_percentage,
            "validation run written"
        );

        Ok(RunResult {
            base_directory: layout.base().to_path_buf(),
            matched_json_file: layout.matched_json(),
            meta_json_file: layout.meta_json(),
            summary: run.summary.clone(),
        })
    }
}

/// Run a validation with the default configuration.
pub fn run_validation(ce: &[RawRecord], pe: &[RawRecord], index: &[RawRecord]) -> Result<RunResult> {
    ValidationRunner::default().run(ce, pe, index)
}

fn staging_dir(root: &Path, layout: &RunLayout) -> Result<PathBuf> {
    let name = layout
        .base()
        .file_name()
        .ok_or_else(|| Error::report("run directory has no name"))?
        .to_string_lossy();
    Ok(root.join(format!(".{}.{}.partial", name, std::process::id())))
}

fn write_artifacts(layout: &RunLayout, run: &ValidationRun, config: &ReportConfig) -> Result<()> {
    let pad = config.column_padding;
    let indent = config.json_indent;

    fs::create_dir_all(layout.valid_dir())?;
    fs::create_dir_all(layout.not_valid_dir())?;

    xlsx::write_table(
        &reports::matched_table(&run.outcome.matched),
        &layout.matched_xlsx(),
        pad,
        &run.generated_at,
    )?;
    export::write_json(&layout.matched_json(), &run.matched_rows(), indent)?;
    fs::write(layout.text_summary(), run.summary.text_report(&run.generated_at))?;

    xlsx::write_table(
        &reports::ce_unmatched_table(&run.outcome.ce_unmatched),
        &layout.ce_unmatched_xlsx(),
        pad,
        &run.generated_at,
    )?;
    xlsx::write_table(
        &reports::pe_unmatched_table(&run.outcome.pe_unmatched),
        &layout.pe_unmatched_xlsx(),
        pad,
        &run.generated_at,
    )?;

    export::write_json(&layout.meta_json(), &run.meta(), indent)?;
    xlsx::write_table(
        &reports::summary_table(&run.summary),
        &layout.summary_xlsx(),
        pad,
        &run.generated_at,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap()
    }

    fn make_record(trade_no: i64, minute: &str, signal: &str) -> RawRecord {
        RawRecord::new(
            "SYM",
            trade_no,
            format!("Date/Time\nJan 05, 2024, 10:{}", minute),
            format!("Signal\n{}", signal),
            "Type\nEntry Long",
        )
    }

    fn runner_in(root: &Path) -> ValidationRunner {
        let mut config = Config::default();
        config.report.output_root = root.to_path_buf();
        ValidationRunner::new(config)
    }

    #[test]
    fn test_evaluate_does_not_write() {
        let root = tempfile::tempdir().unwrap();
        let runner = runner_in(&root.path().join("out"));
        let run = runner.evaluate(
            &[make_record(1, "00", "BUY")],
            &[make_record(2, "00", "SELL")],
            &[make_record(3, "01", "BUY")],
            ts(),
        );
        assert_eq!(run.summary.valid_trades, 1);
        assert!(!root.path().join("out").exists());
    }

    #[test]
    fn test_run_writes_complete_artifact_set() {
        let root = tempfile::tempdir().unwrap();
        let runner = runner_in(root.path());

        let result = runner
            .run_at(
                &[make_record(1, "00", "BUY"), make_record(4, "30", "SELL")],
                &[make_record(2, "00", "SELL")],
                &[make_record(3, "01", "BUY")],
                ts(),
            )
            .unwrap();

        assert_eq!(result.base_directory, root.path().join("validation_20240105_153000"));
        for artifact in RunLayout::new(&result.base_directory).artifacts() {
            assert!(artifact.is_file(), "missing {}", artifact.display());
        }
        assert_eq!(result.summary.valid_trades, 1);
        assert_eq!(result.summary.ce_not_confirmed, 1);

        // Only the finished run directory remains.
        let entries: Vec<_> = fs::read_dir(root.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_output_root_is_a_file() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let runner = runner_in(&blocker);
        assert!(runner.run_at(&[], &[], &[], ts()).is_err());
    }

    #[test]
    fn test_same_second_runs_get_distinct_directories() {
        let root = tempfile::tempdir().unwrap();
        let runner = runner_in(root.path());
        let a = runner.run_at(&[], &[], &[], ts()).unwrap();
        let b = runner.run_at(&[], &[], &[], ts()).unwrap();
        assert_ne!(a.base_directory, b.base_directory);
        assert!(b.base_directory.ends_with("validation_20240105_153000_1"));
    }
}
