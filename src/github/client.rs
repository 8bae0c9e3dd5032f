//! GraphQL client for the GitHub API.

use std::{
    collections::HashMap,
    sync::Mutex,
};

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::{
    error::{ApiResult, GithubApiError},
    models::{
        CommitHistoryPage, ContributionData, GraphqlEnvelope, HistoryData, IdentityData,
        RepoCommitTotalsData, RepoOverviewData, RepoStarsNode, RepositoryConnection, UserIdentity,
    },
};

const GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";
const CLIENT_USER_AGENT: &str = concat!("octo-stats/", env!("CARGO_PKG_VERSION"));

/// Affiliation filter selecting only repositories the user owns.
pub const OWNER_ONLY: &[&str] = &["OWNER"];
/// Affiliation filter selecting every repository the user can push to.
pub const ALL_AFFILIATIONS: &[&str] = &["OWNER", "COLLABORATOR", "ORGANIZATION_MEMBER"];

const IDENTITY_QUERY: &str = r"
    query ($login: String!) {
        user(login: $login) {
            id
            createdAt
        }
    }
";

const REPO_OVERVIEW_QUERY: &str = r"
    query ($owner_affiliation: [RepositoryAffiliation], $login: String!, $cursor: String) {
        user(login: $login) {
            repositories(first: 100, after: $cursor, ownerAffiliations: $owner_affiliation) {
                totalCount
                edges {
                    node {
                        ... on Repository {
                            nameWithOwner
                            stargazers {
                                totalCount
                            }
                        }
                    }
                }
                pageInfo {
                    endCursor
                    hasNextPage
                }
            }
        }
    }
";

const REPO_COMMIT_TOTALS_QUERY: &str = r"
    query ($owner_affiliation: [RepositoryAffiliation], $login: String!, $cursor: String) {
        user(login: $login) {
            repositories(first: 60, after: $cursor, ownerAffiliations: $owner_affiliation) {
                edges {
                    node {
                        ... on Repository {
                            nameWithOwner
                            defaultBranchRef {
                                target {
                                    ... on Commit {
                                        history {
                                            totalCount
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                pageInfo {
                    endCursor
                    hasNextPage
                }
            }
        }
    }
";

const COMMIT_HISTORY_QUERY: &str = r"
    query ($name: String!, $owner: String!, $cursor: String) {
        repository(name: $name, owner: $owner) {
            defaultBranchRef {
                target {
                    ... on Commit {
                        history(first: 100, after: $cursor) {
                            totalCount
                            edges {
                                node {
                                    ... on Commit {
                                        additions
                                        deletions
                                        author {
                                            user {
                                                id
                                            }
                                        }
                                    }
                                }
                            }
                            pageInfo {
                                endCursor
                                hasNextPage
                            }
                        }
                    }
                }
            }
        }
    }
";

const CONTRIBUTIONS_QUERY: &str = r"
    query ($login: String!) {
        user(login: $login) {
            pullRequests(first: 1) {
                totalCount
            }
            issues {
                totalCount
            }
        }
    }
";

/// A repository paired with its live default-branch commit total.
///
/// This is what the LOC cache reconciles against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCommitTotal {
    pub name_with_owner: String,
    pub commit_total: i64,
}

/// Issue and pull-request totals for the profile owner.
#[derive(Debug, Clone, Copy)]
pub struct ContributionTotals {
    pub issues: i64,
    pub pull_requests: i64,
}

/// Authenticated client for the GitHub GraphQL endpoint.
///
/// Every operation is tallied in a per-run call ledger so the binary can
/// report how many API calls a refresh cost.
pub struct GithubClient {
    client: Client,
    token: String,
    ledger: Mutex<HashMap<&'static str, usize>>,
}

impl GithubClient {
    /// Build a client carrying the given bearer token.
    pub fn new(token: impl Into<String>) -> ApiResult<Self> {
        let client = Client::builder()
            .user_agent(CLIENT_USER_AGENT)
            .build()
            .map_err(|source| GithubApiError::ClientBuilder { source })?;

        Ok(Self {
            client,
            token: token.into(),
            ledger: Mutex::new(HashMap::new()),
        })
    }

    fn record(&self, operation: &'static str) {
        if let Ok(mut ledger) = self.ledger.lock() {
            *ledger.entry(operation).or_insert(0) += 1;
        }
    }

    /// Snapshot of the per-operation call counts, sorted by operation name.
    pub fn call_ledger(&self) -> Vec<(&'static str, usize)> {
        let mut calls = self
            .ledger
            .lock()
            .map(|ledger| ledger.iter().map(|(op, count)| (*op, *count)).collect::<Vec<_>>())
            .unwrap_or_default();
        calls.sort_unstable_by_key(|(operation, _)| *operation);
        calls
    }

    async fn graphql<T>(
        &self,
        operation: &'static str,
        query: &'static str,
        variables: Value,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        self.record(operation);

        let response = self
            .client
            .post(GRAPHQL_ENDPOINT)
            .bearer_auth(&self.token)
            .json(&json!({
                "query": query,
                "variables": variables,
            }))
            .send()
            .await
            .map_err(|source| GithubApiError::RequestSend { operation, source })?;

        match response.status() {
            StatusCode::FORBIDDEN => Err(GithubApiError::AbuseLimited { operation }),
            status if status.is_success() => {
                let envelope = response
                    .json::<GraphqlEnvelope<T>>()
                    .await
                    .map_err(|source| GithubApiError::DecodeResponse { operation, source })?;

                if let Some(error) = envelope.errors.first() {
                    return Err(GithubApiError::OperationFailed {
                        operation,
                        message: error.message.clone(),
                    });
                }

                envelope.data.ok_or(GithubApiError::MissingData {
                    operation,
                    field: "data",
                })
            }
            status => Err(GithubApiError::RequestStatus { operation, status }),
        }
    }

    /// Resolve the profile owner's GraphQL node id and account creation date.
    pub async fn viewer_identity(&self, login: &str) -> ApiResult<UserIdentity> {
        const OPERATION: &str = "viewer_identity";
        let data: IdentityData = self
            .graphql(OPERATION, IDENTITY_QUERY, json!({ "login": login }))
            .await?;
        data.user.ok_or(GithubApiError::MissingData {
            operation: OPERATION,
            field: "user",
        })
    }

    async fn overview_page(
        &self,
        login: &str,
        affiliations: &[&str],
        cursor: Option<&str>,
    ) -> ApiResult<RepositoryConnection<RepoStarsNode>> {
        const OPERATION: &str = "repository_overview";
        let data: RepoOverviewData = self
            .graphql(
                OPERATION,
                REPO_OVERVIEW_QUERY,
                json!({
                    "login": login,
                    "owner_affiliation": affiliations,
                    "cursor": cursor,
                }),
            )
            .await?;
        Ok(data
            .user
            .ok_or(GithubApiError::MissingData {
                operation: OPERATION,
                field: "user",
            })?
            .repositories)
    }

    /// Total stargazers across the repositories matching `affiliations`.
    pub async fn star_count(&self, login: &str, affiliations: &[&str]) -> ApiResult<i64> {
        let mut stars = 0;
        let mut cursor: Option<String> = None;
        loop {
            let page = self.overview_page(login, affiliations, cursor.as_deref()).await?;
            stars += page
                .edges
                .iter()
                .map(|edge| edge.node.stargazers.total_count)
                .sum::<i64>();
            if !page.page_info.has_next_page {
                break;
            }
            cursor = page.page_info.end_cursor;
            if cursor.is_none() {
                break;
            }
        }
        Ok(stars)
    }

    /// Number of repositories matching `affiliations`.
    pub async fn repository_count(&self, login: &str, affiliations: &[&str]) -> ApiResult<i64> {
        let page = self.overview_page(login, affiliations, None).await?;
        page.total_count.ok_or(GithubApiError::MissingData {
            operation: "repository_overview",
            field: "repositories.totalCount",
        })
    }

    /// Live default-branch commit totals for every repository matching
    /// `affiliations`, in listing order.
    pub async fn repository_commit_totals(
        &self,
        login: &str,
        affiliations: &[&str],
    ) -> ApiResult<Vec<RepoCommitTotal>> {
        const OPERATION: &str = "repository_commit_totals";
        let mut totals = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let data: RepoCommitTotalsData = self
                .graphql(
                    OPERATION,
                    REPO_COMMIT_TOTALS_QUERY,
                    json!({
                        "login": login,
                        "owner_affiliation": affiliations,
                        "cursor": cursor,
                    }),
                )
                .await?;
            let page = data
                .user
                .ok_or(GithubApiError::MissingData {
                    operation: OPERATION,
                    field: "user",
                })?
                .repositories;

            totals.extend(page.edges.into_iter().map(|edge| RepoCommitTotal {
                commit_total: edge.node.commit_total(),
                name_with_owner: edge.node.name_with_owner,
            }));

            if !page.page_info.has_next_page {
                break;
            }
            cursor = page.page_info.end_cursor;
            if cursor.is_none() {
                break;
            }
        }
        Ok(totals)
    }

    /// One page of a repository's default-branch commit history.
    ///
    /// Returns `None` for an empty repository (no default branch).
    pub async fn commit_history_page(
        &self,
        owner: &str,
        name: &str,
        cursor: Option<&str>,
    ) -> ApiResult<Option<CommitHistoryPage>> {
        const OPERATION: &str = "commit_history";
        let data: HistoryData = self
            .graphql(
                OPERATION,
                COMMIT_HISTORY_QUERY,
                json!({
                    "owner": owner,
                    "name": name,
                    "cursor": cursor,
                }),
            )
            .await?;
        let repository = data.repository.ok_or(GithubApiError::MissingData {
            operation: OPERATION,
            field: "repository",
        })?;
        Ok(repository
            .default_branch_ref
            .and_then(|branch| branch.target)
            .map(|target| target.history))
    }

    /// Issue and pull-request totals for the profile owner.
    pub async fn contribution_totals(&self, login: &str) -> ApiResult<ContributionTotals> {
        const OPERATION: &str = "contribution_totals";
        let data: ContributionData = self
            .graphql(OPERATION, CONTRIBUTIONS_QUERY, json!({ "login": login }))
            .await?;
        let user = data.user.ok_or(GithubApiError::MissingData {
            operation: OPERATION,
            field: "user",
        })?;
        Ok(ContributionTotals {
            issues: user.issues.total_count,
            pull_requests: user.pull_requests.total_count,
        })
    }
}
