use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for submitting one repository.
#[derive(Deserialize, ToSchema)]
pub struct SubmitPluginRequest {
    /// Git remote containing `plugin.yaml` at its root.
    #[schema(example = "https://github.com/lab/fold-change")]
    pub repo_url: String,
}

/// Request body for batch submission.
#[derive(Deserialize, ToSchema)]
pub struct BatchSubmitRequest {
    #[schema(example = json!(["https://github.com/lab/a", "git@github.com:lab/b.git"]))]
    pub repo_urls: Vec<String>,
}

/// Outcome for one URL of a batch, in request order.
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchItemResult {
    pub repo_url: String,
    pub success: bool,
    pub plugin_id: Option<String>,
    /// Whether the plugin row was newly created. Absent on failure.
    pub created: Option<bool>,
    pub error: Option<String>,
}

impl BatchItemResult {
    pub fn succeeded(repo_url: String, plugin_id: String, created: bool) -> Self {
        Self {
            repo_url,
            success: true,
            plugin_id: Some(plugin_id),
            created: Some(created),
            error: None,
        }
    }

    pub fn failed(repo_url: String, error: String) -> Self {
        Self {
            repo_url,
            success: false,
            plugin_id: None,
            created: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchSubmitResponse {
    pub total: usize,
    /// Number of URLs ingested successfully (`created + updated`).
    pub submitted: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub results: Vec<BatchItemResult>,
}

impl BatchSubmitResponse {
    pub fn from_results(results: Vec<BatchItemResult>) -> Self {
        let created = results.iter().filter(|r| r.created == Some(true)).count();
        let submitted = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            submitted,
            created,
            updated: submitted - created,
            failed: results.len() - submitted,
            results,
        }
    }
}

/// Upstream drift report for a plugin.
#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateCheckResponse {
    pub plugin_id: String,
    /// Commit the stored metadata came from.
    pub current_commit: Option<String>,
    /// Upstream HEAD.
    pub latest_commit: String,
    pub recommended_commit: Option<String>,
    /// The recommended commit when pinned, otherwise upstream HEAD.
    pub target_commit: String,
    pub latest_stable_tag: Option<String>,
    pub has_update: bool,
    /// Compare (or commit) link on the hosting service, when the remote has one.
    pub changelog_url: Option<String>,
}

/// Pin (or with `null`, unpin) the recommended commit.
#[derive(Deserialize, ToSchema)]
pub struct RecommendedCommitRequest {
    #[schema(example = "3f2a9c1")]
    pub commit: Option<String>,
}
