use thiserror::Error;

/// Errors raised while building or configuring the core types.
///
/// Steady-state operations (`push`, `ingest_tick`, `handle`) never fail.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        name:   &'static str,
        reason: String,
    },

    #[error("malformed message: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument { name, reason: reason.into() }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
