//! Executable discovery for CLI speech engines.

use std::path::{PathBuf, MAIN_SEPARATOR};

/// Resolve an engine binary: `env_key` wins if it names an existing file,
/// otherwise search `PATH` for `default_bin`.
pub(crate) fn get_from_env_or_path(env_key: &str, default_bin: &str) -> Option<PathBuf> {
    if let Ok(p) = std::env::var(env_key) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Some(pb);
        }
    }
    get_from_path(default_bin)
}

pub(crate) fn get_from_path(bin: &str) -> Option<PathBuf> {
    // If a path-like string is provided, respect it directly
    if bin.contains(MAIN_SEPARATOR) {
        let p = PathBuf::from(bin);
        return if p.exists() { Some(p) } else { None };
    }

    let paths_os = std::env::var_os("PATH")?;
    std::env::split_paths(&paths_os)
        .map(|dir| dir.join(bin))
        .find(|candidate| candidate.is_file())
}
