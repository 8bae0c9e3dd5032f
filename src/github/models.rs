//! Typed models for the GraphQL response shapes the client consumes.

use serde::Deserialize;

/// Envelope every GraphQL response arrives in.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct GraphqlEnvelope<T> {
    /// Payload of the operation, absent when the query failed outright.
    #[serde(default)]
    pub data: Option<T>,
    /// GraphQL-level errors reported alongside (or instead of) the data.
    #[serde(default)]
    pub errors: Vec<GraphqlErrorEntry>,
}

/// A single entry of the GraphQL `errors` array.
#[derive(Debug, Deserialize)]
pub struct GraphqlErrorEntry {
    pub message: String,
}

/// Cursor bookkeeping shared by every paginated connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// Wrapper for connection edges.
#[derive(Debug, Deserialize)]
pub struct Edge<N> {
    pub node: N,
}

/// A bare `{ totalCount }` counter field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountField {
    pub total_count: i64,
}

/// `user { id createdAt }` payload.
#[derive(Debug, Deserialize)]
pub struct IdentityData {
    pub user: Option<UserIdentity>,
}

/// The profile owner's GraphQL node id and account creation date.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub created_at: String,
}

/// `user { repositories { ... stargazers } }` payload.
#[derive(Debug, Deserialize)]
pub struct RepoOverviewData {
    pub user: Option<RepoOverviewUser>,
}

#[derive(Debug, Deserialize)]
pub struct RepoOverviewUser {
    pub repositories: RepositoryConnection<RepoStarsNode>,
}

/// A page of a repository connection, generic over the node shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConnection<N> {
    #[serde(default)]
    pub total_count: Option<i64>,
    pub edges: Vec<Edge<N>>,
    pub page_info: PageInfo,
}

/// Repository node carrying its stargazer total.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoStarsNode {
    pub name_with_owner: String,
    pub stargazers: CountField,
}

/// `user { repositories { ... defaultBranchRef } }` payload.
#[derive(Debug, Deserialize)]
pub struct RepoCommitTotalsData {
    pub user: Option<RepoCommitTotalsUser>,
}

#[derive(Debug, Deserialize)]
pub struct RepoCommitTotalsUser {
    pub repositories: RepositoryConnection<RepoCommitsNode>,
}

/// Repository node carrying its default-branch commit total.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoCommitsNode {
    pub name_with_owner: String,
    pub default_branch_ref: Option<BranchRef>,
}

#[derive(Debug, Deserialize)]
pub struct BranchRef {
    pub target: Option<HistoryCountTarget>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryCountTarget {
    pub history: CountField,
}

impl RepoCommitsNode {
    /// Default-branch commit total, zero for an empty repository.
    pub fn commit_total(&self) -> i64 {
        self.default_branch_ref
            .as_ref()
            .and_then(|branch| branch.target.as_ref())
            .map_or(0, |target| target.history.total_count)
    }
}

/// `repository { defaultBranchRef { ... history } }` payload.
#[derive(Debug, Deserialize)]
pub struct HistoryData {
    pub repository: Option<HistoryRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRepository {
    pub default_branch_ref: Option<HistoryBranchRef>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryBranchRef {
    pub target: Option<HistoryTarget>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryTarget {
    pub history: CommitHistoryPage,
}

/// One page of a default-branch commit history walk.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitHistoryPage {
    pub total_count: i64,
    pub edges: Vec<Edge<CommitNode>>,
    pub page_info: PageInfo,
}

/// A single commit with its line deltas and author identity.
#[derive(Debug, Deserialize)]
pub struct CommitNode {
    pub additions: i64,
    pub deletions: i64,
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
pub struct CommitAuthor {
    pub user: Option<AuthorUser>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorUser {
    pub id: String,
}

impl CommitNode {
    /// Whether the commit was authored by the given GraphQL user id.
    ///
    /// Commits with no associated user account never match.
    pub fn authored_by(&self, user_id: &str) -> bool {
        self.author
            .as_ref()
            .and_then(|author| author.user.as_ref())
            .is_some_and(|user| user.id == user_id)
    }
}

/// `user { pullRequests issues }` payload.
#[derive(Debug, Deserialize)]
pub struct ContributionData {
    pub user: Option<ContributionUser>,
}

/// Issue and pull-request totals for the profile owner.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionUser {
    pub pull_requests: CountField,
    pub issues: CountField,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_total_defaults_to_zero_for_empty_repository() {
        let node: RepoCommitsNode = serde_json::from_value(serde_json::json!({
            "nameWithOwner": "octocat/empty",
            "defaultBranchRef": null,
        }))
        .unwrap();
        assert_eq!(node.commit_total(), 0);
    }

    #[test]
    fn commit_total_reads_history_count() {
        let node: RepoCommitsNode = serde_json::from_value(serde_json::json!({
            "nameWithOwner": "octocat/hello",
            "defaultBranchRef": {
                "target": { "history": { "totalCount": 42 } }
            },
        }))
        .unwrap();
        assert_eq!(node.commit_total(), 42);
    }

    #[test]
    fn authored_by_ignores_commits_without_user() {
        let commit: CommitNode = serde_json::from_value(serde_json::json!({
            "additions": 10,
            "deletions": 2,
            "author": { "user": null },
        }))
        .unwrap();
        assert!(!commit.authored_by("MDQ6VXNlcjE="));
    }

    #[test]
    fn authored_by_matches_on_node_id() {
        let commit: CommitNode = serde_json::from_value(serde_json::json!({
            "additions": 1,
            "deletions": 0,
            "author": { "user": { "id": "MDQ6VXNlcjE=" } },
        }))
        .unwrap();
        assert!(commit.authored_by("MDQ6VXNlcjE="));
        assert!(!commit.authored_by("MDQ6VXNlcjI="));
    }

    #[test]
    fn envelope_collects_graphql_errors() {
        let envelope: GraphqlEnvelope<IdentityData> = serde_json::from_value(serde_json::json!({
            "data": null,
            "errors": [{ "message": "Could not resolve to a User" }],
        }))
        .unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.errors.len(), 1);
    }
}
