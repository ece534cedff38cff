//! PyO3 bindings for the trade validator.
//!
//! Exposes the validation run and its remote collaborators to a Python
//! service layer:
//! - Record and result types
//! - `run_validation` over record lists or JSON
//! - Stream fetching, run upload and remote delete

use std::path::{Path, PathBuf};

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use validator_core::config::RemoteConfig;
use validator_core::{
    Config, Error, RawRecord as RustRawRecord, Stream, TradeNo, ValidationRequest,
};
use validator_remote::{
    ArtifactStore, GitHubStore, HttpRecordSource, RecordSource, UploadReceipt as RustUploadReceipt,
};
use validator_report::{
    RunResult as RustRunResult, RunSummary as RustRunSummary, ValidationRunner,
};

// ============================================================================
// Errors
// ============================================================================

/// Bad input surfaces as `ValueError`, everything else as `RuntimeError`.
fn to_py_err(e: Error) -> PyErr {
    match e {
        Error::Data(_) | Error::Json(_) | Error::Config(_) => PyValueError::new_err(e.to_string()),
        _ => PyRuntimeError::new_err(e.to_string()),
    }
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// One input record as sent by the producer.
#[pyclass]
#[derive(Clone)]
pub struct RawRecord {
    inner: RustRawRecord,
}

#[pymethods]
impl RawRecord {
    #[new]
    #[pyo3(signature = (symbol=None, trade_no=None, date_time=None, signal=None, trade_type=None))]
    fn new(
        symbol: Option<String>,
        trade_no: Option<&Bound<'_, PyAny>>,
        date_time: Option<String>,
        signal: Option<String>,
        trade_type: Option<String>,
    ) -> PyResult<Self> {
        let trade_no = trade_no.map(extract_trade_no).transpose()?;
        Ok(RawRecord {
            inner: RustRawRecord {
                symbol,
                trade_no,
                date_time,
                signal,
                trade_type,
            },
        })
    }

    #[getter]
    fn symbol(&self) -> Option<String> {
        self.inner.symbol.clone()
    }

    #[getter]
    fn trade_no(&self, py: Python<'_>) -> PyObject {
        match &self.inner.trade_no {
            None => py.None(),
            Some(TradeNo::Int(n)) => (*n).into_py(py),
            Some(TradeNo::Float(x)) => (*x).into_py(py),
            Some(TradeNo::Text(s)) => s.as_str().into_py(py),
        }
    }

    #[getter]
    fn date_time(&self) -> Option<String> {
        self.inner.date_time.clone()
    }

    #[getter]
    fn signal(&self) -> Option<String> {
        self.inner.signal.clone()
    }

    #[getter]
    fn trade_type(&self) -> Option<String> {
        self.inner.trade_type.clone()
    }

    fn __repr__(&self) -> String {
        format!(
            "RawRecord(symbol={:?}, trade_no={})",
            self.inner.symbol,
            self.inner
                .trade_no
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "None".to_string())
        )
    }
}

fn extract_trade_no(obj: &Bound<'_, PyAny>) -> PyResult<TradeNo> {
    if let Ok(n) = obj.extract::<i64>() {
        return Ok(TradeNo::Int(n));
    }
    if let Ok(x) = obj.extract::<f64>() {
        return Ok(TradeNo::Float(x));
    }
    Ok(TradeNo::Text(obj.str()?.to_string()))
}

impl From<RawRecord> for RustRawRecord {
    fn from(r: RawRecord) -> Self {
        r.inner
    }
}

impl From<RustRawRecord> for RawRecord {
    fn from(r: RustRawRecord) -> Self {
        RawRecord { inner: r }
    }
}

/// Counts and ratios of one run.
#[pyclass]
#[derive(Clone)]
pub struct RunSummary {
    #[pyo3(get)]
    pub total_ce: usize,
    #[pyo3(get)]
    pub total_pe: usize,
    #[pyo3(get)]
    pub total_index: usize,
    #[pyo3(get)]
    pub valid_trades: usize,
    #[pyo3(get)]
    pub ce_not_confirmed: usize,
    #[pyo3(get)]
    pub pe_not_confirmed: usize,
    #[pyo3(get)]
    pub ce_skipped_signal: usize,
    #[pyo3(get)]
    pub bullish: usize,
    #[pyo3(get)]
    pub bearish: usize,
    #[pyo3(get)]
    pub match_percentage: f64,
}

#[pymethods]
impl RunSummary {
    fn __repr__(&self) -> String {
        format!(
            "RunSummary(valid_trades={}, ce_not_confirmed={}, pe_not_confirmed={}, match_percentage={:.2})",
            self.valid_trades, self.ce_not_confirmed, self.pe_not_confirmed, self.match_percentage
        )
    }
}

impl From<RustRunSummary> for RunSummary {
    fn from(s: RustRunSummary) -> Self {
        RunSummary {
            total_ce: s.total_ce,
            total_pe: s.total_pe,
            total_index: s.total_index,
            valid_trades: s.valid_trades,
            ce_not_confirmed: s.ce_not_confirmed,
            pe_not_confirmed: s.pe_not_confirmed,
            ce_skipped_signal: s.ce_skipped_signal,
            bullish: s.bullish,
            bearish: s.bearish,
            match_percentage: s.match_percentage,
        }
    }
}

/// Where a finished run put its artifacts.
#[pyclass]
#[derive(Clone)]
pub struct RunResult {
    #[pyo3(get)]
    pub base_directory: String,
    #[pyo3(get)]
    pub matched_json_file: String,
    #[pyo3(get)]
    pub meta_json_file: String,
    #[pyo3(get)]
    pub summary: RunSummary,
}

#[pymethods]
impl RunResult {
    fn __repr__(&self) -> String {
        format!("RunResult(base_directory={:?})", self.base_directory)
    }
}

fn path_string(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

impl From<RustRunResult> for RunResult {
    fn from(r: RustRunResult) -> Self {
        RunResult {
            base_directory: path_string(&r.base_directory),
            matched_json_file: path_string(&r.matched_json_file),
            meta_json_file: path_string(&r.meta_json_file),
            summary: r.summary.into(),
        }
    }
}

/// What an upload stored, with its public links.
#[pyclass]
#[derive(Clone)]
pub struct UploadReceipt {
    #[pyo3(get)]
    pub run_id: String,
    #[pyo3(get)]
    pub folder: String,
    #[pyo3(get)]
    pub paths: Vec<String>,
    #[pyo3(get)]
    pub raw_urls: Vec<String>,
    #[pyo3(get)]
    pub folder_url: String,
}

#[pymethods]
impl UploadReceipt {
    fn __repr__(&self) -> String {
        format!("UploadReceipt(run_id={:?}, files={})", self.run_id, self.paths.len())
    }
}

impl UploadReceipt {
    fn new(receipt: RustUploadReceipt, config: &RemoteConfig) -> Self {
        UploadReceipt {
            raw_urls: receipt.raw_urls(config),
            folder_url: receipt.folder_url(config),
            run_id: receipt.run_id,
            folder: receipt.folder,
            paths: receipt.paths,
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

fn make_runner(output_root: Option<String>) -> ValidationRunner {
    let mut config = Config::default();
    if let Some(root) = output_root {
        config.report.output_root = PathBuf::from(root);
    }
    ValidationRunner::new(config)
}

fn run_streams(
    py: Python<'_>,
    ce: Vec<RustRawRecord>,
    pe: Vec<RustRawRecord>,
    index: Vec<RustRawRecord>,
    output_root: Option<String>,
) -> PyResult<RunResult> {
    let runner = make_runner(output_root);
    py.allow_threads(|| runner.run(&ce, &pe, &index))
        .map(RunResult::from)
        .map_err(to_py_err)
}

fn parse_records(json: &str) -> PyResult<Vec<RustRawRecord>> {
    serde_json::from_str(json).map_err(|e| to_py_err(e.into()))
}

fn remote_config(repo: Option<String>, token: Option<String>) -> RemoteConfig {
    let mut config = RemoteConfig::from_env();
    if let Some(repo) = repo {
        config.repo = repo;
    }
    if token.is_some() {
        config.token = token;
    }
    config
}

/// Run a validation over three record lists.
#[pyfunction]
#[pyo3(signature = (ce, pe, index, output_root=None))]
fn run_validation(
    py: Python<'_>,
    ce: Vec<RawRecord>,
    pe: Vec<RawRecord>,
    index: Vec<RawRecord>,
    output_root: Option<String>,
) -> PyResult<RunResult> {
    let convert = |records: Vec<RawRecord>| -> Vec<RustRawRecord> {
        records.into_iter().map(RustRawRecord::from).collect()
    };
    run_streams(py, convert(ce), convert(pe), convert(index), output_root)
}

/// Run a validation over three JSON arrays of records.
#[pyfunction]
#[pyo3(signature = (ce_json, pe_json, index_json, output_root=None))]
fn run_validation_json(
    py: Python<'_>,
    ce_json: &str,
    pe_json: &str,
    index_json: &str,
    output_root: Option<String>,
) -> PyResult<RunResult> {
    run_streams(
        py,
        parse_records(ce_json)?,
        parse_records(pe_json)?,
        parse_records(index_json)?,
        output_root,
    )
}

/// Run a validation over a `{"ce_data", "pe_data", "index_data"}` payload.
///
/// Every stream must be present and non-empty.
#[pyfunction]
#[pyo3(signature = (payload_json, output_root=None))]
fn run_request_json(py: Python<'_>, payload_json: &str, output_root: Option<String>) -> PyResult<RunResult> {
    let request: ValidationRequest = serde_json::from_str(payload_json).map_err(|e| to_py_err(e.into()))?;
    let streams = request.into_streams().map_err(to_py_err)?;
    run_streams(py, streams.ce, streams.pe, streams.index, output_root)
}

/// Fetch one stream's records from a JSON URL.
#[pyfunction]
fn fetch_stream(py: Python<'_>, url: &str, stream: &str) -> PyResult<Vec<RawRecord>> {
    let stream: Stream = stream.parse().map_err(to_py_err)?;
    let source = HttpRecordSource::new(&RemoteConfig::from_env()).map_err(to_py_err)?;
    let records = py
        .allow_threads(|| source.fetch(stream, url))
        .map_err(to_py_err)?;
    Ok(records.into_iter().map(RawRecord::from).collect())
}

/// Upload a run directory to the content store.
#[pyfunction]
#[pyo3(signature = (directory, repo=None, token=None))]
fn upload_run(
    py: Python<'_>,
    directory: &str,
    repo: Option<String>,
    token: Option<String>,
) -> PyResult<UploadReceipt> {
    let config = remote_config(repo, token);
    let store = GitHubStore::new(&config).map_err(to_py_err)?;
    let receipt = py
        .allow_threads(|| store.upload_dir(Path::new(directory)))
        .map_err(to_py_err)?;
    Ok(UploadReceipt::new(receipt, &config))
}

/// Delete one file from the content store.
#[pyfunction]
#[pyo3(signature = (path, repo=None, token=None))]
fn delete_remote(py: Python<'_>, path: &str, repo: Option<String>, token: Option<String>) -> PyResult<()> {
    let store = GitHubStore::new(&remote_config(repo, token)).map_err(to_py_err)?;
    py.allow_threads(|| store.delete(path)).map_err(to_py_err)
}

/// List a folder of the content store.
#[pyfunction]
#[pyo3(signature = (path, repo=None, token=None))]
fn list_remote(py: Python<'_>, path: &str, repo: Option<String>, token: Option<String>) -> PyResult<Vec<String>> {
    let store = GitHubStore::new(&remote_config(repo, token)).map_err(to_py_err)?;
    py.allow_threads(|| store.list(path)).map_err(to_py_err)
}

// ============================================================================
// Module
// ============================================================================

fn init_tracing() {
    // A host that already installed a subscriber keeps it.
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer())
        .try_init();
}

#[pymodule]
fn trade_validator_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    dotenv::dotenv().ok();
    init_tracing();
    info!("trade_validator_core loaded");

    // Types
    m.add_class::<RawRecord>()?;
    m.add_class::<RunSummary>()?;
    m.add_class::<RunResult>()?;
    m.add_class::<UploadReceipt>()?;

    // Validation
    m.add_function(wrap_pyfunction!(run_validation, m)?)?;
    m.add_function(wrap_pyfunction!(run_validation_json, m)?)?;
    m.add_function(wrap_pyfunction!(run_request_json, m)?)?;

    // Remote
    m.add_function(wrap_pyfunction!(fetch_stream, m)?)?;
    m.add_function(wrap_pyfunction!(upload_run, m)?)?;
    m.add_function(wrap_pyfunction!(delete_remote, m)?)?;
    m.add_function(wrap_pyfunction!(list_remote, m)?)?;

    Ok(())
}
