//! Python bindings for the lattes-score crate.
//!
//! Results cross the boundary as plain dicts and lists (via `pythonize`), so
//! the JSON an `Analyzer` returns is the same JSON the CLI and MCP server
//! print.
//!
//! `Analyzer` owns a tokio runtime to drive table loading; the module-level
//! `analyze` and `lookup` build one per call from the environment.

use pyo3::prelude::*;
use pyo3::types::PyAny;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::ScoreError;
use crate::pipeline::analyze_input;
use crate::resolve::ReferenceTables;
use crate::roster::{classify_authors, ContainmentMatcher};
use crate::types::{YearRange, YearlyScoreRow};

/// Convert a ScoreError into a Python exception.
fn to_py_err(e: ScoreError) -> PyErr {
    match e {
        ScoreError::UnsupportedFormat(_) | ScoreError::Config(_) => {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string())
        }
        ScoreError::Io(_) => PyErr::new::<pyo3::exceptions::PyIOError, _>(e.to_string()),
        _ => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()),
    }
}

/// Convert any serializable value to a Python object.
fn to_py<T: Serialize>(py: Python<'_>, value: &T) -> PyResult<PyObject> {
    pythonize::pythonize(py, value)
        .map(|bound| bound.unbind())
        .map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("conversion error: {}", e))
        })
}

// ---------------------------------------------------------------------------
// Analyzer: configuration plus the runtime that loads reference tables
// ---------------------------------------------------------------------------

#[pyclass(name = "Analyzer")]
struct PyAnalyzer {
    config: Config,
    runtime: tokio::runtime::Runtime,
}

impl PyAnalyzer {
    fn tables(&self) -> ReferenceTables {
        self.runtime.block_on(ReferenceTables::load(&self.config))
    }
}

#[pymethods]
impl PyAnalyzer {
    /// Create an analyzer.
    ///
    /// `config` is a JSON configuration file; without one the
    /// `LATTES_SCORE_CONFIG` and `LATTES_SCORE_DATA_DIR` variables apply.
    /// `data_dir` overrides the directory holding the tables.
    #[new]
    #[pyo3(signature = (config=None, data_dir=None))]
    fn new(config: Option<PathBuf>, data_dir: Option<PathBuf>) -> PyResult<Self> {
        let mut config = match config {
            Some(path) => Config::from_file(path).map_err(to_py_err)?,
            None => Config::from_env().map_err(to_py_err)?,
        };
        if let Some(dir) = data_dir {
            config = config.with_data_dir(dir);
        }
        let runtime = tokio::runtime::Runtime::new().map_err(|e| {
            PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!(
                "Failed to create async runtime: {}",
                e
            ))
        })?;
        Ok(Self { config, runtime })
    }

    /// Score a curriculum file (.xml or .zip).
    ///
    /// Example: Analyzer().analyze("curriculo.zip", start_year=2017)
    #[pyo3(signature = (path, start_year=None, end_year=None))]
    fn analyze(
        &self,
        py: Python<'_>,
        path: PathBuf,
        start_year: Option<i32>,
        end_year: Option<i32>,
    ) -> PyResult<PyObject> {
        let bytes = std::fs::read(&path).map_err(|e| to_py_err(ScoreError::Io(e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tables = self.tables();
        let range = YearRange::from_bounds(start_year, end_year);

        let report = py
            .allow_threads(|| analyze_input(&file_name, &bytes, &tables, range))
            .map_err(to_py_err)?;
        to_py(py, &report)
    }

    /// Classify a journal by ISSN.
    fn lookup(&self, py: Python<'_>, issn: &str) -> PyResult<PyObject> {
        to_py(py, &self.tables().classify_journal(issn))
    }

    /// Count roster members among a "; "-separated author list.
    fn classify_authors(&self, py: Python<'_>, authors: &str) -> PyResult<PyObject> {
        let tables = self.tables();
        to_py(py, &classify_authors(authors, &tables.roster, &ContainmentMatcher))
    }

    fn __repr__(&self) -> String {
        format!("Analyzer(data_dir='{}')", self.config.data_dir.display())
    }
}

// ---------------------------------------------------------------------------
// Module-level functions
// ---------------------------------------------------------------------------

/// Score a curriculum file with the configuration from the environment.
#[pyfunction]
#[pyo3(signature = (path, start_year=None, end_year=None, data_dir=None))]
fn analyze(
    py: Python<'_>,
    path: PathBuf,
    start_year: Option<i32>,
    end_year: Option<i32>,
    data_dir: Option<PathBuf>,
) -> PyResult<PyObject> {
    PyAnalyzer::new(None, data_dir)?.analyze(py, path, start_year, end_year)
}

/// Classify a journal by ISSN with the configuration from the environment.
#[pyfunction]
#[pyo3(signature = (issn, data_dir=None))]
fn lookup(py: Python<'_>, issn: &str, data_dir: Option<PathBuf>) -> PyResult<PyObject> {
    PyAnalyzer::new(None, data_dir)?.lookup(py, issn)
}

/// Strip hyphens and surrounding whitespace from an ISSN.
#[pyfunction]
fn normalize_identifier(raw: &str) -> String {
    crate::identifier::normalize_identifier(raw)
}

/// Format an ISSN as XXXX-XXXX when it has eight characters.
#[pyfunction]
fn format_identifier(raw: &str) -> String {
    crate::identifier::format_identifier(raw)
}

/// Turn a DOI into a resolver URL; URLs pass through.
#[pyfunction]
fn format_external_id(raw: &str) -> String {
    crate::identifier::format_external_id(raw)
}

/// Render the `yearly_scores` list of an analysis as report text.
#[pyfunction]
fn format_report(yearly_scores: &Bound<'_, PyAny>) -> PyResult<String> {
    let rows: Vec<YearlyScoreRow> = pythonize::depythonize(yearly_scores).map_err(|e| {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("invalid yearly scores: {}", e))
    })?;
    Ok(crate::report::format_report(&rows))
}

// ---------------------------------------------------------------------------
// Module registration
// ---------------------------------------------------------------------------

/// Lattes curriculum scoring.
///
/// Usage:
///     import lattes_score
///     report = lattes_score.analyze("curriculo.zip", start_year=2017)
///     print(lattes_score.format_report(report["yearly_scores"]))
#[pymodule]
#[pyo3(name = "lattes_score")]
pub fn init_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyAnalyzer>()?;

    m.add_function(wrap_pyfunction!(analyze, m)?)?;
    m.add_function(wrap_pyfunction!(lookup, m)?)?;
    m.add_function(wrap_pyfunction!(normalize_identifier, m)?)?;
    m.add_function(wrap_pyfunction!(format_identifier, m)?)?;
    m.add_function(wrap_pyfunction!(format_external_id, m)?)?;
    m.add_function(wrap_pyfunction!(format_report, m)?)?;

    Ok(())
}
