//! Utility functions shared across the crate.

use std::path::PathBuf;

use crate::cache::DiskCache;
use crate::error::Result;

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Get the user's cache directory following XDG conventions.
///
/// Returns `$XDG_CACHE_HOME` if set, otherwise `$HOME/.cache`.
pub fn cache_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
}

/// Get the default translation cache path.
pub fn translation_cache_path() -> PathBuf {
    cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("cognitranslate")
}

/// Clear the chunk translation cache on disk.
///
/// Returns the number of entries cleared.
pub fn clear_translation_cache() -> Result<usize> {
    let cache_path = translation_cache_path();

    if !cache_path.exists() {
        return Ok(0);
    }

    let disk = DiskCache::new(&cache_path)?;
    let count = disk.len();
    disk.clear()?;

    Ok(count)
}

/// File stem suitable for naming a download after its source.
///
/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
pub fn download_stem(label: &str) -> String {
    let stem = label
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(label);
    let stem = stem.strip_suffix(".pdf").unwrap_or(stem);

    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned.to_string()
    }
}
