//! Orchestrates the fetch phases of a refresh into a single report.

use std::time::Instant;

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::{
    cache::{self, CacheEntry, CommitCache, LocTotals, archive},
    config::AppConfig,
    error::GenerateError,
    github::{ALL_AFFILIATIONS, GithubClient, OWNER_ONLY, RepoCommitTotal},
};

use super::report::{ProfileStats, account_age, parse_created_at};

/// Commit and LOC figures for a single walked repository.
#[derive(Debug, Default, Clone, Copy)]
struct RepoLoc {
    added: i64,
    deleted: i64,
    commits: i64,
}

/// Run every fetch phase and assemble the profile report.
///
/// Phases with no data dependency run concurrently; the LOC phase needs the
/// owner's node id first, so it follows identity resolution.
pub async fn collect_profile_stats(
    client: &GithubClient,
    config: &AppConfig,
) -> Result<ProfileStats, GenerateError> {
    let login = config.user_name.as_str();

    let phase = Instant::now();
    let identity = client.viewer_identity(login).await?;
    let created_at = parse_created_at(&identity.created_at).map_err(|source| {
        GenerateError::Timestamp {
            value: identity.created_at.clone(),
            source,
        }
    })?;
    info!(
        elapsed_ms = phase.elapsed().as_millis() as u64,
        "resolved account identity"
    );

    let phase = Instant::now();
    let (stars, owned_repos, contributed_repos, contributions) = tokio::try_join!(
        client.star_count(login, OWNER_ONLY),
        client.repository_count(login, OWNER_ONLY),
        client.repository_count(login, ALL_AFFILIATIONS),
        client.contribution_totals(login),
    )?;
    info!(
        elapsed_ms = phase.elapsed().as_millis() as u64,
        stars,
        owned_repos,
        contributed_repos,
        issues = contributions.issues,
        pull_requests = contributions.pull_requests,
        "fetched repository overview"
    );

    let phase = Instant::now();
    let live = client
        .repository_commit_totals(login, ALL_AFFILIATIONS)
        .await?;
    let mut commit_cache = CommitCache::load_or_init(&config.cache_dir, login)?;
    let cache_hit = reconcile(
        client,
        &identity.id,
        &live,
        &mut commit_cache,
        config.force_refresh,
    )
    .await?;
    commit_cache.persist()?;
    info!(
        elapsed_ms = phase.elapsed().as_millis() as u64,
        repositories = live.len(),
        cache_hit,
        "reconciled LOC cache"
    );

    let archived = archive::read(&config.cache_dir)?;
    let cached = commit_cache.totals();
    let loc = LocTotals {
        added: cached.added + archived.added,
        deleted: cached.deleted + archived.deleted,
        commits: cached.commits + archived.commits,
    };

    Ok(ProfileStats {
        age: account_age(created_at.date(), OffsetDateTime::now_utc().date()),
        stars,
        owned_repos,
        contributed_repos: contributed_repos + archived.repositories,
        issues: contributions.issues,
        pull_requests: contributions.pull_requests,
        loc,
        cache_hit,
    })
}

/// Bring the cache in line with the live repository listing.
///
/// A repository is served from the cache when its fingerprint is present and
/// its commit total has not moved; everything else is re-walked. Entries for
/// repositories that left the listing are dropped. Returns whether the whole
/// refresh was served from the cache.
async fn reconcile(
    client: &GithubClient,
    owner_id: &str,
    live: &[RepoCommitTotal],
    commit_cache: &mut CommitCache,
    force_refresh: bool,
) -> Result<bool, GenerateError> {
    let mut entries = Vec::with_capacity(live.len());
    let mut walked = 0usize;

    for repo in live {
        let repo_hash = cache::fingerprint(&repo.name_with_owner);
        let cached = if force_refresh {
            None
        } else {
            commit_cache.find(&repo_hash)
        };

        match cached {
            Some(entry) if entry.commit_total == repo.commit_total => {
                entries.push(entry.clone());
            }
            _ => {
                let loc = walk_repository_loc(client, owner_id, &repo.name_with_owner).await?;
                walked += 1;
                debug!(
                    repository = %repo.name_with_owner,
                    commits = loc.commits,
                    added = loc.added,
                    deleted = loc.deleted,
                    "re-walked commit history"
                );
                entries.push(CacheEntry {
                    repo_hash,
                    commit_total: repo.commit_total,
                    my_commits: loc.commits,
                    loc_added: loc.added,
                    loc_deleted: loc.deleted,
                });
            }
        }
    }

    commit_cache.replace_entries(entries);
    Ok(walked == 0)
}

/// Page through a repository's default-branch history, summing the line
/// deltas of commits authored by the profile owner.
async fn walk_repository_loc(
    client: &GithubClient,
    owner_id: &str,
    name_with_owner: &str,
) -> Result<RepoLoc, GenerateError> {
    let (owner, name) = name_with_owner.split_once('/').unwrap_or((name_with_owner, ""));

    let mut totals = RepoLoc::default();
    let mut cursor: Option<String> = None;
    loop {
        let Some(page) = client.commit_history_page(owner, name, cursor.as_deref()).await? else {
            // Empty repository: no default branch, nothing to count.
            break;
        };

        for edge in &page.edges {
            if edge.node.authored_by(owner_id) {
                totals.commits += 1;
                totals.added += edge.node.additions;
                totals.deleted += edge.node.deletions;
            }
        }

        if !page.page_info.has_next_page || page.edges.is_empty() {
            break;
        }
        cursor = page.page_info.end_cursor;
        if cursor.is_none() {
            break;
        }
    }

    Ok(totals)
}
