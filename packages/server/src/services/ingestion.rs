use chrono::Utc;
use ingest::git::{CloneDepth, GitEnv, ProbeOutcome};
use ingest::{Descriptor, IngestError, TransportKey, readme};
use sea_orm::*;
use tracing::{debug, info, instrument, warn};

use crate::entity::plugin::{self, PluginStatus};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::ingestion::{BatchItemResult, BatchSubmitResponse};
use crate::models::plugin::PluginResponse;
use crate::models::shared::validate_repository_url;
use crate::services::{credentials, normalizer, plugins, taxonomy};
use crate::state::AppState;

/// Author assigned to imported descriptors that name none.
pub const IMPORT_DEFAULT_AUTHOR: &str = "CauldronGO Team";
/// Category assigned to imported descriptors that name none.
pub const IMPORT_DEFAULT_CATEGORY: &str = "utilities";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// First submission or resubmission. Status is recomputed.
    Submit,
    /// Re-read the stored repository. Status and submitter are kept.
    Refresh,
    /// Refresh that also records the newest tag.
    SyncLatest,
}

pub struct IngestRequest<'a> {
    pub repo_url: &'a str,
    pub actor: &'a AuthUser,
    pub mode: IngestMode,
    /// Run the anonymous access probe before cloning.
    pub probe: bool,
    /// Plugin being refreshed. Its id wins over the one in the descriptor.
    pub existing: Option<&'a plugin::Model>,
}

pub struct IngestOutcome {
    pub plugin: PluginResponse,
    pub created: bool,
}

/// Everything read from one clone, gathered before the database is touched.
struct Checkout {
    descriptor: Descriptor,
    commit: String,
    latest_tag: Option<String>,
    readme: String,
}

#[instrument(skip(state, request), fields(repo_url = request.repo_url, mode = ?request.mode, user_id = request.actor.user_id))]
pub async fn ingest_repository(
    state: &AppState,
    request: IngestRequest<'_>,
) -> Result<IngestOutcome, AppError> {
    let probed_auth = if request.probe {
        probe_access(state, request.repo_url).await
    } else {
        None
    };

    let candidates = credentials::key_candidates(
        request.actor,
        request.existing.and_then(|p| p.submitted_by),
    );
    let transport = credentials::resolve_transport(
        &state.db,
        state.secrets.as_ref(),
        &candidates,
        request.repo_url,
    )
    .await;
    let used_key = transport.is_some();

    let checkout = checkout(
        state,
        request.repo_url,
        transport.as_ref(),
        request.mode == IngestMode::SyncLatest,
    )
    .await;
    // Removes the key file before anything else can fail.
    drop(transport);
    let checkout = checkout?;

    let descriptor_id = checkout
        .descriptor
        .id()
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Plugin ID not found in {}.",
                state.config.registry.descriptor_file
            ))
        })?
        .to_string();
    let plugin_id = match request.existing {
        Some(existing) => {
            if existing.id != descriptor_id {
                warn!(
                    plugin_id = %existing.id,
                    descriptor_id = %descriptor_id,
                    "Descriptor id differs from stored plugin; keeping stored id"
                );
            }
            existing.id.clone()
        }
        None => descriptor_id,
    };

    let txn = state.db.begin().await?;

    let (author_id, category_id) = resolve_taxonomy(&txn, &checkout.descriptor, None).await?;
    let row = plugin::Entity::find_by_id(plugin_id.clone()).one(&txn).await?;
    let created = row.is_none();
    let now = Utc::now();

    let mut active = match row {
        Some(row) => {
            if request.mode == IngestMode::Submit {
                request.actor.require_owner_or_staff(row.submitted_by)?;
            }
            row.into_active_model()
        }
        None => new_plugin(
            &plugin_id,
            Some(request.actor.user_id),
            PluginStatus::initial(state.config.registry.auto_approve),
            probed_auth.unwrap_or(used_key),
        ),
    };

    apply_descriptor(&mut active, &plugin_id, &checkout.descriptor, author_id, category_id);
    active.repository = Set(Some(request.repo_url.to_string()));
    active.commit_hash = Set(Some(checkout.commit.clone()));
    active.readme = Set(Some(checkout.readme));
    if let Some(requires_auth) = probed_auth {
        active.requires_auth = Set(requires_auth);
    }
    match request.mode {
        IngestMode::Submit => {
            active.status = Set(PluginStatus::initial(state.config.registry.auto_approve));
        }
        IngestMode::SyncLatest => active.latest_stable_tag = Set(checkout.latest_tag),
        IngestMode::Refresh => {}
    }
    active.updated_at = Set(now);

    let model = save(&txn, active, created).await?;
    normalizer::sync_components(&txn, &plugin_id, &checkout.descriptor).await?;
    txn.commit().await?;

    info!(plugin_id = %model.id, created, commit = %checkout.commit, "Ingested plugin");
    let plugin = plugins::load_response(&state.db, model).await?;
    Ok(IngestOutcome { plugin, created })
}

/// Ingests each URL in order as a submission, collecting per-URL outcomes.
/// One failure never aborts the rest.
#[instrument(skip(state, actor, urls), fields(user_id = actor.user_id, count = urls.len()))]
pub async fn ingest_batch(
    state: &AppState,
    actor: &AuthUser,
    urls: &[String],
) -> BatchSubmitResponse {
    let allow_local = state.config.registry.allow_local_repositories;
    let mut results = Vec::with_capacity(urls.len());

    for url in urls {
        let outcome = match validate_repository_url(url, allow_local) {
            Ok(repo_url) => {
                ingest_repository(
                    state,
                    IngestRequest {
                        repo_url: &repo_url,
                        actor,
                        mode: IngestMode::Submit,
                        probe: false,
                        existing: None,
                    },
                )
                .await
            }
            Err(e) => Err(e),
        };

        results.push(match outcome {
            Ok(outcome) => BatchItemResult::succeeded(url.clone(), outcome.plugin.id, outcome.created),
            Err(e) => {
                warn!(repo_url = %url, error = %e, "Batch item failed");
                BatchItemResult::failed(url.clone(), e.message())
            }
        });
    }

    let response = BatchSubmitResponse::from_results(results);
    info!(
        total = response.total,
        created = response.created,
        updated = response.updated,
        failed = response.failed,
        "Batch submission finished"
    );
    response
}

/// Upserts a descriptor read from local disk as an approved plugin with no
/// repository. Missing author and category fall back to fixed defaults.
pub async fn import_descriptor(
    db: &DatabaseConnection,
    descriptor: &Descriptor,
    readme_html: Option<String>,
) -> Result<(plugin::Model, bool), AppError> {
    let plugin_id = descriptor
        .id()
        .ok_or_else(|| AppError::Validation("Plugin ID not found in descriptor.".into()))?
        .to_string();

    let txn = db.begin().await?;
    let (author_id, category_id) = resolve_taxonomy(
        &txn,
        descriptor,
        Some((IMPORT_DEFAULT_AUTHOR, IMPORT_DEFAULT_CATEGORY)),
    )
    .await?;

    let row = plugin::Entity::find_by_id(plugin_id.clone()).one(&txn).await?;
    let created = row.is_none();
    let mut active = match row {
        Some(row) => row.into_active_model(),
        None => new_plugin(&plugin_id, None, PluginStatus::Approved, false),
    };
    apply_descriptor(&mut active, &plugin_id, descriptor, author_id, category_id);
    active.status = Set(PluginStatus::Approved);
    if readme_html.is_some() {
        active.readme = Set(readme_html);
    }
    active.updated_at = Set(Utc::now());

    let model = save(&txn, active, created).await?;
    normalizer::sync_components(&txn, &plugin_id, descriptor).await?;
    txn.commit().await?;

    info!(plugin_id = %model.id, created, "Imported plugin descriptor");
    Ok((model, created))
}

async fn probe_access(state: &AppState, repo_url: &str) -> Option<bool> {
    match state.git.probe(repo_url).await {
        ProbeOutcome::Public => Some(false),
        ProbeOutcome::RequiresAuth => {
            info!(repo_url, "Repository requires authentication");
            Some(true)
        }
        ProbeOutcome::Failed(e) => {
            warn!(repo_url, error = %e, "Access probe failed; continuing with full clone");
            None
        }
    }
}

async fn checkout(
    state: &AppState,
    repo_url: &str,
    transport: Option<&TransportKey>,
    with_tags: bool,
) -> Result<Checkout, AppError> {
    let env = transport.map(|t| t.env().clone()).unwrap_or_else(GitEnv::new);
    let workdir = tempfile::tempdir()
        .map_err(|e| AppError::Unexpected(format!("Failed to create work directory: {e}")))?;
    let repo = workdir.path().join("repo");

    state
        .git
        .clone_repository(repo_url, &repo, CloneDepth::Full, &env)
        .await
        .map_err(IngestError::from)?;
    let commit = state
        .git
        .head_commit(&repo)
        .await
        .map_err(IngestError::from)?;
    debug!(repo_url, %commit, "Cloned repository");

    let registry = &state.config.registry;
    let descriptor = Descriptor::load(&repo, &registry.descriptor_file).await?;
    debug!(plugin_id = ?descriptor.id(), "Parsed descriptor");

    let latest_tag = if with_tags {
        state.git.latest_tag(&repo).await.unwrap_or_else(|e| {
            warn!(error = %e, "Tag lookup failed");
            None
        })
    } else {
        None
    };

    let readme = readme::compose(
        &repo,
        &registry.readme_file,
        &descriptor,
        state.diagrams.as_ref(),
    );

    Ok(Checkout {
        descriptor,
        commit,
        latest_tag,
        readme,
    })
}

async fn resolve_taxonomy<C: ConnectionTrait>(
    conn: &C,
    descriptor: &Descriptor,
    defaults: Option<(&str, &str)>,
) -> Result<(Option<i32>, Option<i32>), DbErr> {
    let author = descriptor
        .plugin
        .author
        .as_deref()
        .or(defaults.map(|(author, _)| author));
    let category = descriptor
        .plugin
        .category
        .as_deref()
        .or(defaults.map(|(_, category)| category));

    let author_id = match author {
        Some(name) => Some(taxonomy::get_or_create_author(conn, name).await?.id),
        None => None,
    };
    let category_id = match category {
        Some(name) => Some(taxonomy::get_or_create_category(conn, name).await?.id),
        None => None,
    };
    Ok((author_id, category_id))
}

fn new_plugin(
    plugin_id: &str,
    submitted_by: Option<i32>,
    status: PluginStatus,
    requires_auth: bool,
) -> plugin::ActiveModel {
    plugin::ActiveModel {
        id: Set(plugin_id.to_string()),
        status: Set(status),
        submitted_by: Set(submitted_by),
        requires_auth: Set(requires_auth),
        repository: Set(None),
        commit_hash: Set(None),
        recommended_commit: Set(None),
        latest_stable_tag: Set(None),
        readme: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
}

/// Overwrites descriptor-derived metadata. Name falls back to the id.
fn apply_descriptor(
    active: &mut plugin::ActiveModel,
    plugin_id: &str,
    descriptor: &Descriptor,
    author_id: Option<i32>,
    category_id: Option<i32>,
) {
    let meta = &descriptor.plugin;
    active.name = Set(meta
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| plugin_id.to_string()));
    active.description = Set(meta.description.clone().unwrap_or_default());
    active.version = Set(meta.version.clone().unwrap_or_default());
    active.author_id = Set(author_id);
    active.category_id = Set(category_id);
    active.subcategory = Set(meta.subcategory.clone());
    active.icon = Set(meta.icon.clone());
    active.diagram_enabled = Set(descriptor.diagram_enabled);
    active.citation_enabled = Set(descriptor.citation_enabled);
}

async fn save<C: ConnectionTrait>(
    conn: &C,
    active: plugin::ActiveModel,
    created: bool,
) -> Result<plugin::Model, AppError> {
    let result = if created {
        active.insert(conn).await
    } else {
        active.update(conn).await
    };
    result.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Plugin is being ingested concurrently; retry the request".into())
        }
        _ => AppError::from(e),
    })
}
