use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::GitError;

pub const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(300);

/// Extra environment applied to every git invocation of one ingestion,
/// e.g. `GIT_SSH_COMMAND` for keyed transport.
#[derive(Debug, Clone, Default)]
pub struct GitEnv {
    vars: Vec<(String, String)>,
}

impl GitEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push((key.into(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneDepth {
    Full,
    Shallow,
}

#[derive(Debug)]
pub enum ProbeOutcome {
    /// Anonymous shallow clone succeeded.
    Public,
    /// The remote rejected anonymous access.
    RequiresAuth,
    /// Any other failure; ingestion carries on and lets the full clone report it.
    Failed(GitError),
}

/// Thin async wrapper around the `git` binary.
#[derive(Debug, Clone)]
pub struct GitClient {
    bin: String,
    timeout: Duration,
}

impl Default for GitClient {
    fn default() -> Self {
        Self::new("git", DEFAULT_CLONE_TIMEOUT)
    }
}

impl GitClient {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }

    #[instrument(skip(self, env))]
    pub async fn clone_repository(
        &self,
        url: &str,
        dest: &Path,
        depth: CloneDepth,
        env: &GitEnv,
    ) -> Result<(), GitError> {
        let mut args: Vec<&OsStr> = vec![OsStr::new("clone"), OsStr::new("--quiet")];
        if depth == CloneDepth::Shallow {
            args.extend([OsStr::new("--depth"), OsStr::new("1")]);
        }
        args.extend([OsStr::new("--"), OsStr::new(url), dest.as_os_str()]);
        self.run("clone", &args, None, env).await.map(|_| ())
    }

    /// Anonymous shallow clone into a scratch directory to learn whether the
    /// remote needs credentials.
    #[instrument(skip(self))]
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        let scratch = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => return ProbeOutcome::Failed(GitError::Spawn(e)),
        };
        let env = GitEnv::new().with("GIT_SSH_COMMAND", ANONYMOUS_SSH_COMMAND);
        let dest = scratch.path().join("probe");
        match self
            .clone_repository(url, &dest, CloneDepth::Shallow, &env)
            .await
        {
            Ok(()) => ProbeOutcome::Public,
            Err(e) if e.is_auth_failure() => ProbeOutcome::RequiresAuth,
            Err(e) => ProbeOutcome::Failed(e),
        }
    }

    pub async fn head_commit(&self, repo: &Path) -> Result<String, GitError> {
        let out = self
            .run(
                "rev-parse",
                &[OsStr::new("rev-parse"), OsStr::new("HEAD")],
                Some(repo),
                &GitEnv::new(),
            )
            .await?;
        let commit = out.trim();
        if !is_object_id(commit) {
            return Err(GitError::InvalidOutput(format!("not a commit id: {commit}")));
        }
        Ok(commit.to_string())
    }

    /// Pulls every tag of `origin` into a (possibly shallow) clone.
    pub async fn fetch_tags(&self, repo: &Path, env: &GitEnv) -> Result<(), GitError> {
        self.run(
            "fetch",
            &[
                OsStr::new("fetch"),
                OsStr::new("--quiet"),
                OsStr::new("--depth=1"),
                OsStr::new("origin"),
                OsStr::new("+refs/tags/*:refs/tags/*"),
            ],
            Some(repo),
            env,
        )
        .await
        .map(|_| ())
    }

    /// Most recent tag by commit date, if the repository has any.
    pub async fn latest_tag(&self, repo: &Path) -> Result<Option<String>, GitError> {
        let out = self
            .run(
                "for-each-ref",
                &[
                    OsStr::new("for-each-ref"),
                    OsStr::new("refs/tags"),
                    OsStr::new(TAG_FORMAT),
                ],
                Some(repo),
                &GitEnv::new(),
            )
            .await?;
        Ok(pick_latest_tag(&out))
    }

    async fn run(
        &self,
        operation: &'static str,
        args: &[&OsStr],
        cwd: Option<&Path>,
        env: &GitEnv,
    ) -> Result<String, GitError> {
        let mut cmd = Command::new(&self.bin);
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);
        for (key, value) in &env.vars {
            cmd.env(key, value);
        }
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!(operation, bin = %self.bin, "Running git");
        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| GitError::Timeout {
                operation,
                seconds: self.timeout.as_secs(),
            })?
            .map_err(GitError::Spawn)?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                operation,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Fails fast instead of prompting when no key is offered.
const ANONYMOUS_SSH_COMMAND: &str =
    "ssh -o BatchMode=yes -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null";

/// Tag name, peeled commit date (annotated tags) and direct commit date.
const TAG_FORMAT: &str =
    "--format=%(refname:short)%09%(*committerdate:unix)%09%(committerdate:unix)";

fn pick_latest_tag(for_each_ref: &str) -> Option<String> {
    let mut tags: Vec<(&str, i64)> = for_each_ref
        .lines()
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let name = parts.next()?.trim();
            let peeled = parts.next().unwrap_or_default().trim();
            let direct = parts.next().unwrap_or_default().trim();
            let stamp = if peeled.is_empty() { direct } else { peeled };
            if name.is_empty() {
                return None;
            }
            Some((name, stamp.parse().unwrap_or(0)))
        })
        .collect();
    // Same-second tags fall back to the greater name.
    tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(a.0)));
    tags.first().map(|(name, _)| name.to_string())
}

pub fn is_ssh_url(url: &str) -> bool {
    url.starts_with("ssh://") || scp_parts(url).is_some()
}

/// `git@host:owner/repo` split into (`git@host`, `owner/repo`).
fn scp_parts(url: &str) -> Option<(&str, &str)> {
    if url.contains("://") {
        return None;
    }
    let (authority, path) = url.split_once(':')?;
    if !authority.contains('@') || authority.contains('/') || path.is_empty() {
        return None;
    }
    Some((authority, path))
}

/// The URL itself followed by its alternate SSH spelling, if any:
/// `git@host:path` and `ssh://git@host/path` name the same repository.
pub fn url_spellings(url: &str) -> Vec<String> {
    let mut spellings = vec![url.to_string()];
    let alternate = if let Some(rest) = url.strip_prefix("ssh://") {
        rest.split_once('/')
            .filter(|(authority, path)| !authority.contains(':') && !path.is_empty())
            .map(|(authority, path)| format!("{authority}:{path}"))
    } else {
        scp_parts(url).map(|(authority, path)| {
            format!("ssh://{authority}/{}", path.trim_start_matches('/'))
        })
    };
    if let Some(alternate) = alternate.filter(|a| a != url) {
        spellings.push(alternate);
    }
    spellings
}

/// Browsable https location of a hosted repository, used for changelog links.
pub fn web_url(url: &str) -> Option<String> {
    let (host, path) = if let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    {
        let rest = rest.rsplit_once('@').map_or(rest, |(_, r)| r);
        rest.split_once('/')?
    } else if let Some(rest) = url.strip_prefix("ssh://") {
        let (authority, path) = rest.split_once('/')?;
        let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        (host.split(':').next().unwrap_or(host), path)
    } else {
        let (authority, path) = scp_parts(url)?;
        let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
        (host, path)
    };
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    if host.is_empty() || path.is_empty() {
        return None;
    }
    Some(format!("https://{host}/{path}"))
}

/// Full object name in a SHA-1 (40 hex) or SHA-256 (64 hex) repository.
pub fn is_object_id(id: &str) -> bool {
    matches!(id.len(), 40 | 64) && id.chars().all(|c| c.is_ascii_hexdigit())
}
