use std::io;
use std::path::{Path, PathBuf};

/// Resolves `relative` against the checkout at `root`, following symlinks,
/// and refuses anything that ends up outside the checkout.
///
/// Missing files report `NotFound`; escapes report `PermissionDenied`.
pub fn resolve_within(root: &Path, relative: &Path) -> io::Result<PathBuf> {
    let root = root.canonicalize()?;
    let resolved = root.join(relative).canonicalize()?;
    if resolved.starts_with(&root) {
        Ok(resolved)
    } else {
        Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("{} resolves outside the repository", relative.display()),
        ))
    }
}
