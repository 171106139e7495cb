//! Error types for liveconf.

/// Result type alias for liveconf operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors surfaced by store construction and manual reloads.
///
/// The background reload loop never returns these to callers: read and
/// decode failures during a watched reload are logged and absorbed so the
/// store keeps serving the last good snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The file contents were rejected by every supported decoder.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The filesystem watcher could not be created or attached to the path.
    #[error("failed to watch configuration file: {0}")]
    Watch(#[from] notify::Error),
}

/// Decode failure carrying the outcome of both format attempts.
///
/// YAML is the primary format; the JSON attempt only runs once YAML has
/// rejected the document. Both rejections are preserved so callers can tell
/// which format the file was meant to be.
#[derive(Debug, thiserror::Error)]
#[error("configuration is not valid YAML ({yaml}) nor JSON ({json})")]
pub struct DecodeError {
    /// Failure from the primary (YAML) attempt.
    pub yaml: FormatError,
    /// Failure from the fallback (JSON) attempt.
    pub json: FormatError,
}

/// A single decoder's reason for rejecting the file contents.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The YAML parser rejected the document.
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The JSON parser rejected the document.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed, but its top level is not a mapping.
    #[error("document is not a mapping")]
    NotAMapping,

    /// The mapping contains a key that is not a string.
    #[error("mapping contains a non-string key")]
    NonStringKey,

    /// A value is not representable as a flat scalar.
    #[error("value for key `{0}` is not a scalar")]
    NonScalar(String),
}
