use ingest::git::{CloneDepth, GitEnv, web_url};
use ingest::IngestError;
use tracing::{instrument, warn};

use crate::entity::plugin;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::ingestion::UpdateCheckResponse;
use crate::services::credentials;
use crate::state::AppState;

/// Upstream state observed by a shallow clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamHead {
    pub commit: String,
    pub latest_tag: Option<String>,
}

/// Which commit a plugin should move to and whether that differs from what is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    pub target_commit: String,
    pub has_update: bool,
}

/// Whether two commit ids name the same commit when one may be abbreviated.
pub fn same_commit(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    !short.is_empty()
        && long
            .get(..short.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(short))
}

/// The pinned recommendation wins over upstream HEAD. An abbreviated pin is
/// expanded when it names the stored or the upstream commit.
pub fn compute_drift(current: Option<&str>, recommended: Option<&str>, latest: &str) -> Drift {
    let target = match recommended {
        Some(pin) if same_commit(pin, latest) => latest,
        Some(pin) => current.filter(|c| same_commit(pin, c)).unwrap_or(pin),
        None => latest,
    };
    Drift {
        target_commit: target.to_string(),
        has_update: !current.is_some_and(|c| same_commit(c, target)),
    }
}

/// Compare link between the stored and target commits on the hosting
/// service, or a plain commit link when nothing is stored yet. `None` when
/// already on the target.
pub fn changelog_url(repository: &str, current: Option<&str>, target: &str) -> Option<String> {
    let web = web_url(repository)?;
    match current {
        Some(current) if current == target => None,
        Some(current) => Some(format!("{web}/compare/{current}...{target}")),
        None => Some(format!("{web}/commit/{target}")),
    }
}

pub fn repository_of(plugin: &plugin::Model) -> Result<&str, AppError> {
    plugin
        .repository
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Plugin has no repository URL.".into()))
}

/// Shallow-clones the remote and reads HEAD plus the newest tag.
pub async fn inspect_upstream(
    state: &AppState,
    actor: &AuthUser,
    plugin: &plugin::Model,
) -> Result<UpstreamHead, AppError> {
    let repo_url = repository_of(plugin)?;
    let candidates = credentials::key_candidates(actor, plugin.submitted_by);
    let transport = credentials::resolve_transport(
        &state.db,
        state.secrets.as_ref(),
        &candidates,
        repo_url,
    )
    .await;
    let env = transport
        .as_ref()
        .map(|t| t.env().clone())
        .unwrap_or_else(GitEnv::new);

    let workdir = tempfile::tempdir()
        .map_err(|e| AppError::Unexpected(format!("Failed to create work directory: {e}")))?;
    let dest = workdir.path().join("repo");

    state
        .git
        .clone_repository(repo_url, &dest, CloneDepth::Shallow, &env)
        .await
        .map_err(IngestError::from)?;
    let commit = state
        .git
        .head_commit(&dest)
        .await
        .map_err(IngestError::from)?;

    let latest_tag = match state.git.fetch_tags(&dest, &env).await {
        Ok(()) => state.git.latest_tag(&dest).await.unwrap_or_else(|e| {
            warn!(error = %e, "Tag lookup failed");
            None
        }),
        Err(e) => {
            warn!(error = %e, "Tag fetch failed");
            None
        }
    };

    Ok(UpstreamHead { commit, latest_tag })
}

#[instrument(skip(state, actor, plugin), fields(plugin_id = %plugin.id))]
pub async fn check_for_update(
    state: &AppState,
    actor: &AuthUser,
    plugin: &plugin::Model,
) -> Result<UpdateCheckResponse, AppError> {
    let upstream = inspect_upstream(state, actor, plugin).await?;
    let repo_url = repository_of(plugin)?;

    let drift = compute_drift(
        plugin.commit_hash.as_deref(),
        plugin.recommended_commit.as_deref(),
        &upstream.commit,
    );
    let changelog_url = changelog_url(repo_url, plugin.commit_hash.as_deref(), &drift.target_commit);

    Ok(UpdateCheckResponse {
        plugin_id: plugin.id.clone(),
        current_commit: plugin.commit_hash.clone(),
        latest_commit: upstream.commit,
        recommended_commit: plugin.recommended_commit.clone(),
        target_commit: drift.target_commit,
        latest_stable_tag: upstream
            .latest_tag
            .or_else(|| plugin.latest_stable_tag.clone()),
        has_update: drift.has_update,
        changelog_url,
    })
}
