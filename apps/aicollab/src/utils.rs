//! Small helpers shared by commands: JSON path lookup, stderr prefixes and
//! path display.

use owo_colors::OwoColorize;
use serde_json::Value as Json;
use std::path::Path;

/// Resolve a dotted path (`$.a.b`, `a.b`, `a.0.c`) inside a JSON value.
pub fn get_json_path<'a>(root: &'a Json, path: &str) -> Option<&'a Json> {
    let p = path.trim().trim_start_matches('$').trim_start_matches('.');
    let mut cur = root;
    for seg in p.split('.').filter(|s| !s.is_empty()) {
        cur = match cur {
            Json::Object(map) => map.get(seg)?,
            Json::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cur)
}

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if colors_enabled() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if colors_enabled() {
        "note:".yellow().bold().to_string()
    } else {
        "note:".to_string()
    }
}

/// Display `target` relative to `base` when possible.
pub fn rel_to(base: &Path, target: &Path) -> String {
    pathdiff::diff_paths(target, base)
        .filter(|p| !p.as_os_str().is_empty() && !p.starts_with(".."))
        .unwrap_or_else(|| target.to_path_buf())
        .to_string_lossy()
        .replace('\\', "/")
}
