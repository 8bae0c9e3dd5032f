//! Errors surfaced by a refresh run.

use thiserror::Error;

use crate::{cache::CacheError, github::GithubApiError, svg::TemplateError};

/// Everything that can stop a refresh, aggregated for the collector's
/// signature. The binary attaches context and reports it at top level.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A GitHub API interaction failed.
    #[error(transparent)]
    Api(#[from] GithubApiError),
    /// The LOC cache could not be read or written.
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// A template could not be rewritten.
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// GitHub returned an account creation date that does not parse.
    #[error("invalid `createdAt` timestamp `{value}`")]
    Timestamp {
        value: String,
        #[source]
        source: time::error::Parse,
    },
}
