//! Artifact store abstraction.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;
use validator_core::config::RemoteConfig;
use validator_core::Result;

/// Layout of upload run identifiers.
pub const RUN_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Identifier for an upload started now.
pub fn new_run_id() -> String {
    Local::now().format(RUN_ID_FORMAT).to_string()
}

/// What an upload stored, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub run_id: String,
    /// Remote folder holding the run.
    pub folder: String,
    /// Remote path of every uploaded file, in upload order.
    pub paths: Vec<String>,
}

impl UploadReceipt {
    /// Public raw-content link of every uploaded file.
    pub fn raw_urls(&self, config: &RemoteConfig) -> Vec<String> {
        let base = config.raw_base.trim_end_matches('/');
        self.paths
            .iter()
            .map(|p| format!("{}/{}/{}/{}", base, config.repo, config.branch, p))
            .collect()
    }

    /// Browsable link to the run folder.
    pub fn folder_url(&self, config: &RemoteConfig) -> String {
        format!(
            "{}/{}/tree/{}/{}",
            config.web_base.trim_end_matches('/'),
            config.repo,
            config.branch,
            self.folder
        )
    }
}

/// Remote store for run artifacts.
pub trait ArtifactStore {
    /// Folder under which every run is stored.
    fn results_prefix(&self) -> &str;

    /// Create or replace one file.
    fn put_file(&self, remote_path: &str, content: &[u8]) -> Result<()>;

    /// Remove one file.
    fn delete(&self, remote_path: &str) -> Result<()>;

    /// Paths of the entries of a remote folder.
    fn list(&self, remote_dir: &str) -> Result<Vec<String>>;

    /// Upload every file under `local_dir` into a new run folder.
    fn upload_dir(&self, local_dir: &Path) -> Result<UploadReceipt> {
        self.upload_dir_as(local_dir, &new_run_id())
    }

    /// Upload every file under `local_dir` into the run folder for `run_id`.
    ///
    /// Stops at the first failed file; files already stored stay stored.
    fn upload_dir_as(&self, local_dir: &Path, run_id: &str) -> Result<UploadReceipt> {
        let folder = format!("{}/validation_{}", self.results_prefix().trim_end_matches('/'), run_id);
        let files = collect_files(local_dir)?;

        let mut paths = Vec::with_capacity(files.len());
        for (local, relative) in files {
            let remote = format!("{}/{}", folder, relative);
            self.put_file(&remote, &fs::read(&local)?)?;
            paths.push(remote);
        }

        info!(folder = %folder, files = paths.len(), "uploaded run directory");
        Ok(UploadReceipt {
            run_id: run_id.to_string(),
            folder,
            paths,
        })
    }
}

/// Every file under `dir` with its `/`-separated path relative to `dir`,
/// sorted by that path.
pub fn collect_files(dir: &Path) -> Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    walk(dir, "", &mut files)?;
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

fn walk(dir: &Path, prefix: &str, out: &mut Vec<(PathBuf, String)>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        };

        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk(&path, &relative, out)?;
        } else {
            out.push((path, relative));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use validator_core::Error;

    #[derive(Default)]
    struct MemoryStore {
        files: RefCell<Vec<(String, Vec<u8>)>>,
        fail_on: Option<&'static str>,
    }

    impl ArtifactStore for MemoryStore {
        fn results_prefix(&self) -> &str {
            "validation_results"
        }

        fn put_file(&self, remote_path: &str, content: &[u8]) -> Result<()> {
            if self.fail_on.is_some_and(|f| remote_path.ends_with(f)) {
                return Err(Error::upload("{\"message\": \"Bad credentials\"}"));
            }
            self.files
                .borrow_mut()
                .push((remote_path.to_string(), content.to_vec()));
            Ok(())
        }

        fn delete(&self, remote_path: &str) -> Result<()> {
            self.files.borrow_mut().retain(|(p, _)| p != remote_path);
            Ok(())
        }

        fn list(&self, remote_dir: &str) -> Result<Vec<String>> {
            Ok(self
                .files
                .borrow()
                .iter()
                .filter(|(p, _)| p.starts_with(remote_dir))
                .map(|(p, _)| p.clone())
                .collect())
        }
    }

    fn make_run_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("valid")).unwrap();
        fs::create_dir_all(dir.path().join("not_valid")).unwrap();
        fs::write(dir.path().join("valid/matched_signals.json"), "[]").unwrap();
        fs::write(dir.path().join("not_valid/pe_unmatched.xlsx"), b"xlsx").unwrap();
        fs::write(dir.path().join("validation_meta.json"), "{}").unwrap();
        dir
    }

    fn make_config() -> RemoteConfig {
        RemoteConfig {
            repo: "acme/results".to_string(),
            ..RemoteConfig::default()
        }
    }

    #[test]
    fn test_collect_files_sorted_relative() {
        let dir = make_run_dir();
        let relative: Vec<String> = collect_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|(_, r)| r)
            .collect();
        assert_eq!(
            relative,
            vec![
                "not_valid/pe_unmatched.xlsx",
                "valid/matched_signals.json",
                "validation_meta.json",
            ]
        );
    }

    #[test]
    fn test_upload_dir_as() {
        let dir = make_run_dir();
        let store = MemoryStore::default();

        let receipt = store.upload_dir_as(dir.path(), "20240105_160000").unwrap();

        assert_eq!(receipt.run_id, "20240105_160000");
        assert_eq!(receipt.folder, "validation_results/validation_20240105_160000");
        assert_eq!(receipt.paths.len(), 3);
        assert_eq!(
            receipt.paths[1],
            "validation_results/validation_20240105_160000/valid/matched_signals.json"
        );

        let files = store.files.borrow();
        assert_eq!(files[0].1, b"xlsx");
        assert_eq!(files[1].1, b"[]");
    }

    #[test]
    fn test_upload_failure_carries_remote_message() {
        let dir = make_run_dir();
        let store = MemoryStore {
            fail_on: Some("matched_signals.json"),
            ..MemoryStore::default()
        };

        let err = store.upload_dir_as(dir.path(), "x").unwrap_err();
        assert!(err.to_string().contains("Bad credentials"));
        assert_eq!(store.files.borrow().len(), 1);
    }

    #[test]
    fn test_list_then_delete() {
        let dir = make_run_dir();
        let store = MemoryStore::default();
        let receipt = store.upload_dir_as(dir.path(), "1").unwrap();

        store.delete(&receipt.paths[0]).unwrap();
        let left = store.list(&receipt.folder).unwrap();
        assert_eq!(left, receipt.paths[1..].to_vec());
    }

    #[test]
    fn test_upload_missing_dir() {
        let store = MemoryStore::default();
        let missing = Path::new("/nonexistent/validation_run");
        assert!(matches!(store.upload_dir(missing), Err(Error::Io(_))));
    }

    #[test]
    fn test_receipt_links() {
        let receipt = UploadReceipt {
            run_id: "20240105_160000".to_string(),
            folder: "validation_results/validation_20240105_160000".to_string(),
            paths: vec!["validation_results/validation_20240105_160000/summary.xlsx".to_string()],
        };
        let config = make_config();

        assert_eq!(
            receipt.raw_urls(&config),
            vec![
                "https://raw.githubusercontent.com/acme/results/main/validation_results/validation_20240105_160000/summary.xlsx"
            ]
        );
        assert_eq!(
            receipt.folder_url(&config),
            "https://github.com/acme/results/tree/main/validation_results/validation_20240105_160000"
        );
    }

    #[test]
    fn test_new_run_id_shape() {
        let id = new_run_id();
        assert_eq!(id.len(), 15);
        assert_eq!(id.as_bytes()[8], b'_');
    }
}
