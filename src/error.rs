use thiserror::Error;

/// Failure taxonomy for hierarchy inspection.
///
/// `Decode`/`Parse` are fatal to the operation that hit them. `Protocol`
/// means the agent explicitly reported a known failure and carries the
/// remediation text verbatim. Malformed individual fields never surface
/// here; they degrade to absent values during projection.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed hierarchy document: {0}")]
    Decode(String),

    #[error("malformed subtree document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{what} '{key}' not found")]
    NotFound { what: &'static str, key: String },

    #[error("required tool '{tool}' is not installed")]
    Dependency { tool: &'static str },

    #[error("{0}")]
    Protocol(String),

    #[error("{0}")]
    Agent(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<plist::Error> for Error {
    fn from(err: plist::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Error::NotFound {
            what,
            key: key.into(),
        }
    }
}
