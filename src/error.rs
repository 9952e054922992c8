use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Splib07Error {
    #[error("archive markup mismatch in {context}: expected {expected}, found {found}")]
    StructuralMismatch {
        context: String,
        expected: usize,
        found: usize,
    },

    #[error("table of contents references unknown sampling '{0}'")]
    UnknownSampling(String),

    #[error("datatable row '{row}' has no link in required cell '{cell}'; raw cells: {raw_cells:?}")]
    MissingRequiredField {
        row: String,
        cell: &'static str,
        raw_cells: Vec<String>,
    },

    #[error("unknown spectrum: {0}")]
    UnknownSpectrum(String),

    #[error("sampling '{0}' is not present in the index")]
    UnknownResamplingTarget(String),

    #[error("spectrum '{spectrum}' has no spectrum data in sampling '{sampling}'")]
    MissingData { spectrum: String, sampling: String },

    #[error("invalid splib07 archive root '{root}': missing {missing:?}, actual contents: {contents:?}")]
    InvalidArchiveRoot {
        root: Utf8PathBuf,
        missing: Vec<String>,
        contents: Vec<String>,
    },

    #[error("archive read failed: {0}")]
    Archive(String),

    #[error("failed to parse archive markup: {0}")]
    Markup(String),

    #[error("failed to parse ASCIIdata file {path}: {detail}")]
    AsciiData { path: Utf8PathBuf, detail: String },

    #[error("index cache error: {0}")]
    Cache(String),

    #[error("invalid search pattern: {0}")]
    InvalidPattern(String),
}
