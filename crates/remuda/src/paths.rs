//! Path resolution for modelfile directive arguments.
//!
//! Resolution is purely lexical: no filesystem access, no symlink
//! resolution. Existence checks happen later, at the call sites that care.

use std::path::{Component, Path, PathBuf};

/// Resolve a directive argument to an absolute path.
///
/// * `~`-prefixed paths resolve against the user's home directory, with the
///   marker stripped (`~/models/a.gguf` and `~models/a.gguf` both land under
///   home, matching common shell-adjacent tooling).
/// * Anything else resolves against `base_dir` (the modelfile's directory),
///   with `.` and `..` segments collapsed. Absolute inputs are normalized
///   as-is.
pub fn resolve_path(input: &str, base_dir: &Path) -> PathBuf {
    if let Some(rest) = input.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            let rest = rest.trim_start_matches(['/', '\\']);
            return normalize(&home.join(rest));
        }
        // No resolvable home directory: fall through to base-relative.
    }

    let path = Path::new(input);
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base_dir.join(path))
    }
}

/// Collapse `.` and `..` components lexically.
///
/// A `..` at the root is dropped rather than escaping it.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
