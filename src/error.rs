#![warn(clippy::all, clippy::nursery, clippy::pedantic)]

use std::error::Error as StdError;

use thiserror::Error;

/// Errors used in this API
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Enumerating display identities failed in a mandatory source
    #[error("Failed to enumerate display identities")]
    EnumerationFailed(#[source] Box<dyn StdError + Send + Sync>),
}

/// A whole-source platform failure: one of the underlying enumeration
/// calls reported a non-zero status. Fatal for the enumeration pass.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SourceError {
    #[error("`{api}` failed with platform status {status}")]
    PlatformCall { api: &'static str, status: i32 },
}

/// Outcome of one active-path table snapshot query.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TableQueryError {
    /// The active-path count changed between the size and data calls.
    #[error("display configuration changed between size and data queries")]
    ConfigurationChanged,
    #[error(transparent)]
    Platform(#[from] SourceError),
}

/// Failure to resolve the source id for a single display target.
///
/// Never fatal for the enumeration pass: the engine absorbs it into a
/// partial record with `source_id` absent.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ResolveError {
    #[error("no active path with target id {target_id}")]
    NoMatchingTarget { target_id: u32 },
    #[error("display configuration kept changing while scanning the path table")]
    ConfigurationChanged,
    #[error(transparent)]
    Platform(#[from] SourceError),
}

impl From<SourceError> for Error {
    fn from(e: SourceError) -> Self {
        match &e {
            SourceError::PlatformCall { .. } => Self::EnumerationFailed(Box::new(e)),
        }
    }
}
