//! GitHub GraphQL API access.

/// Authenticated GraphQL client and its operations.
pub mod client;
/// Error types for API interactions.
pub mod error;
/// Typed response models.
pub mod models;

pub use client::{
    ALL_AFFILIATIONS, ContributionTotals, GithubClient, OWNER_ONLY, RepoCommitTotal,
};
pub use error::{ApiResult, GithubApiError};
