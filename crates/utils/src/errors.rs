use thiserror::Error;

/// Errors raised while reading or validating a project description.
///
/// All of these are fatal and reported before any transformation begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read project file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed project file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

/// Errors raised while loading module fixtures into the in-memory model.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read module file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed module file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate module name '{0}'")]
    DuplicateModule(String),
}

/// Errors raised by the string-hiding transform and its decoder.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The requested byte range does not lie inside the encoded blob.
    #[error("hidden string range {offset}+{len} is out of bounds")]
    RangeOutOfBounds { offset: usize, len: usize },

    /// The unmasked byte range is not a valid UTF-8 string.
    #[error("hidden string is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Top-level error for a whole obfuscation run.
#[derive(Debug, Error)]
pub enum ObfuscateError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// File read/write error while saving modules or the mapping report.
    #[error("file error: {0}")]
    File(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
