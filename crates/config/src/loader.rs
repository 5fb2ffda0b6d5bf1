use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::schema::CrosspostConfig;

/// Load a config file, TOML or JSON by extension.
///
/// `${ENV_VAR}` placeholders in the raw text are expanded before parsing,
/// so tokens can live in the environment instead of the file. Unresolvable
/// placeholders stay verbatim.
pub fn load_config(path: &Path) -> anyhow::Result<CrosspostConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let expanded = expand_placeholders(&raw, |name| std::env::var(name).ok());

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") | None => Ok(toml::from_str(&expanded)?),
        Some("json") => Ok(serde_json::from_str(&expanded)?),
        Some(other) => anyhow::bail!("unsupported config format: .{other}"),
    }
}

/// Load the first config file found, falling back to defaults.
///
/// `crosspost.toml` / `crosspost.json` are tried in the working directory
/// first, then in the user config directory. A file that fails to load is
/// logged and ignored.
pub fn discover_and_load() -> CrosspostConfig {
    let Some(path) = candidate_paths().find(|p| p.exists()) else {
        debug!("no config file found, using defaults");
        return CrosspostConfig::default();
    };

    debug!(path = %path.display(), "loading config");
    load_config(&path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
        CrosspostConfig::default()
    })
}

fn candidate_paths() -> impl Iterator<Item = PathBuf> {
    const NAMES: [&str; 2] = ["crosspost.toml", "crosspost.json"];

    let local = NAMES.into_iter().map(PathBuf::from);
    let global = directories::ProjectDirs::from("", "", "crosspost")
        .into_iter()
        .flat_map(|dirs| {
            let dir = dirs.config_dir().to_path_buf();
            NAMES.into_iter().map(move |name| dir.join(name))
        });
    local.chain(global)
}

fn expand_placeholders(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let Some(end) = tail.find('}') else {
            // Unterminated placeholder, keep the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };
        match lookup(&tail[..end]) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + end + 3]),
        }
        rest = &tail[end + 1..];
    }

    out.push_str(rest);
    out
}
