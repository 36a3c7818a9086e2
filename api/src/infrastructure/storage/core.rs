use std::path::{Component, Path};

/// Normalizes a `/`-separated store path: leading/trailing slashes and `.`
/// segments are dropped; `..` and empty results are rejected.
pub fn normalize_key(remote_path: &str) -> anyhow::Result<String> {
    let unified = remote_path.replace('\\', "/");
    let mut parts = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => continue,
            ".." => anyhow::bail!("forbidden path {remote_path}"),
            p => parts.push(p),
        }
    }
    if parts.is_empty() {
        anyhow::bail!("empty storage path");
    }
    Ok(parts.join("/"))
}

/// Key prefix derived from the configured storage root.
pub fn normalize_prefix(root: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    for comp in root.components() {
        if let Component::Normal(os) = comp {
            let s = os.to_string_lossy();
            if !s.is_empty() && s != "." {
                parts.push(s.replace('\\', "/"));
            }
        }
    }
    parts.join("/")
}

pub fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}/{key}")
    }
}

/// `base` + `/` + percent-encoded path segments.
pub fn join_url(base: &str, key: &str) -> String {
    let encoded: Vec<_> = key
        .split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect();
    format!("{}/{}", base.trim_end_matches('/'), encoded.join("/"))
}
