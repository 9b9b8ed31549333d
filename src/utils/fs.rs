//! Local file helpers shared by the shell, session, and applier.

use std::io;
use std::path::Path;

/// Read a local text file.
pub fn read_local_file(path: &str) -> io::Result<String> {
    std::fs::read_to_string(path)
}

/// Canonical absolute form of `path` when it resolves on disk; the path
/// unchanged otherwise. Used to key added-file context so that `/add foo.txt`
/// and `/add ./foo.txt` land on the same entry.
pub fn normalize_path(path: &str) -> String {
    Path::new(path)
        .canonicalize()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.to_string())
}
