use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between an IDX file on disk and a
/// validated dataset split.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' is not an IDX file (bad magic bytes)")]
    BadMagic { path: PathBuf },

    #[error("'{path}': unsupported IDX element type 0x{code:02x}")]
    UnsupportedType { path: PathBuf, code: u8 },

    #[error("'{path}': expected {expected} payload bytes, found {found}")]
    PayloadLength {
        path:     PathBuf,
        expected: usize,
        found:    usize,
    },

    #[error("'{path}': header declares dimensions {dims:?}, too large to address")]
    HeaderOverflow { path: PathBuf, dims: Vec<usize> },

    #[error("cannot encode an IDX header for dimensions {dims:?}")]
    Unencodable { dims: Vec<usize> },

    #[error("'{path}': label {value} at index {index} is not a whole number")]
    NonIntegerLabel {
        path:  PathBuf,
        index: usize,
        value: f32,
    },

    #[error("'{path}': expected shape {expected}, found {found:?}")]
    BadShape {
        path:     PathBuf,
        expected: String,
        found:    Vec<usize>,
    },

    #[error("no '{split}' files in '{dir}'")]
    MissingSplit { split: String, dir: PathBuf },

    #[error("{split}: {images} images but {labels} labels")]
    CountMismatch {
        split:  String,
        images: usize,
        labels: usize,
    },

    #[error("{split}: label {label} at index {index} is outside 0..=9")]
    LabelOutOfRange {
        split: String,
        index: usize,
        label: i64,
    },

    #[error("{split}: no examples of classes {missing:?}")]
    MissingClasses { split: String, missing: Vec<u8> },
}
