use std::path::{Path, PathBuf};
use tracing::debug;

/// Expands tilde (~) in a path string to the user's home directory.
pub fn expand_tilde_path_buf(path_str: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path_str).as_ref())
}

/// Resolves a stored project path to an existing location, or `None` if nothing is there.
pub fn resolve_existing_path(path_str: &str) -> Option<PathBuf> {
    let expanded = expand_tilde_path_buf(path_str);
    if !expanded.exists() {
        debug!(path = %expanded.display(), "Project path does not exist");
        return None;
    }
    // dunce avoids \\?\ prefixes that cmd.exe refuses as a working directory
    Some(dunce::canonicalize(&expanded).unwrap_or(expanded))
}

/// Quotes a path for a POSIX shell by wrapping it in single quotes.
pub fn shell_single_quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}
