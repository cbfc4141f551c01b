//! Storage layer: directories, YAML config, JSON dumps.

use std::fs;
use std::path::Path;

use crate::error::Result;

// ─── Directory helpers ────────────────────────────────────────────────────────

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Turn a tag into something usable as a single path component.
pub fn sanitize_tag(tag: &str) -> String {
    let cleaned: String = tag
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "untagged".to_string()
    } else {
        cleaned
    }
}

// ─── Event files ─────────────────────────────────────────────────────────────

/// Rename the event files this process left under `dir` (recursively) so a
/// new writer opened in the same second does not truncate them.
///
/// A live event file ends in `.<pid>.0`; sealed files get `.<generation>`
/// appended. Returns how many files were renamed.
pub fn seal_event_files(dir: &Path, generation: u64) -> Result<usize> {
    let live_suffix = format!(".{}.0", std::process::id());
    let mut sealed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            sealed += seal_event_files(&path, generation)?;
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with("events.out.tfevents.") && name.ends_with(&live_suffix) {
            fs::rename(&path, path.with_file_name(format!("{name}.{generation}")))?;
            sealed += 1;
        }
    }
    Ok(sealed)
}

// ─── YAML config I/O ─────────────────────────────────────────────────────────

pub fn save_yaml<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    ensure_parent(path)?;
    let content = serde_yaml::to_string(data)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T>
where
    T: Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)?;
    let val = serde_yaml::from_str(&content)?;
    Ok(val)
}

// ─── JSON dumps ──────────────────────────────────────────────────────────────

pub fn save_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    ensure_parent(path)?;
    let content = serde_json::to_string_pretty(data)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
