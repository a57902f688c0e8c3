use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;
use zeroize::Zeroizing;

use crate::git::GitEnv;

/// Decrypted SSH material for one repository.
pub struct SshCredential {
    pub private_key: Zeroizing<String>,
    pub passphrase: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for SshCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshCredential")
            .field("private_key", &"<redacted>")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A private key written to an owner-only temporary file plus the git
/// environment that routes SSH through it. The file is removed on drop.
pub struct TransportKey {
    key_file: NamedTempFile,
    env: GitEnv,
}

impl TransportKey {
    pub fn materialize(credential: &SshCredential) -> io::Result<Self> {
        let mut key_file = tempfile::Builder::new()
            .prefix("registry-key-")
            .tempfile()?;
        restrict_permissions(key_file.path())?;

        key_file.write_all(credential.private_key.as_bytes())?;
        // OpenSSH rejects keys without a trailing newline.
        if !credential.private_key.ends_with('\n') {
            key_file.write_all(b"\n")?;
        }
        key_file.flush()?;

        let passphrase = credential
            .passphrase
            .as_ref()
            .filter(|p| !p.is_empty());
        let command = ssh_command(key_file.path(), passphrase.is_some());
        let mut env = GitEnv::new().with("GIT_SSH_COMMAND", command);
        if let Some(passphrase) = passphrase {
            env = env.with("SSHPASS", passphrase.as_str());
        }

        debug!(key = %key_file.path().display(), "Materialized SSH key");
        Ok(Self { key_file, env })
    }

    pub fn key_path(&self) -> &Path {
        self.key_file.path()
    }

    pub fn env(&self) -> &GitEnv {
        &self.env
    }

    pub fn ssh_command(&self) -> Option<&str> {
        self.env.get("GIT_SSH_COMMAND")
    }
}

/// `GIT_SSH_COMMAND` for a key file; with a passphrase the command is wrapped
/// in `sshpass`, which reads it from `SSHPASS`.
pub fn ssh_command(key_path: &Path, with_passphrase: bool) -> String {
    let ssh = format!(
        "ssh -i '{}' -o IdentitiesOnly=yes -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null",
        key_path.display()
    );
    if with_passphrase {
        format!("sshpass -e -P passphrase {ssh}")
    } else {
        ssh
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
