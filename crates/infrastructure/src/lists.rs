//! Loaders for the files that feed the matcher and the hosts override.
//!
//! Loaders only report failures; callers decide whether to degrade to an
//! empty list.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use fancy_regex::Regex;
use ferrous_split_domain::{DomainList, HostsTable, IpNetworkList, ResourceLoadError};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static DOMAIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\w\-_]+\.[\w\.\-_]+)[/*]*").expect("valid domain extraction pattern")
});

/// Pulls domain-like tokens out of free-form text such as an AdBlock-style
/// rule list. Trailing `/` and `*` are dropped.
pub fn extract_domains(text: &str) -> Vec<String> {
    DOMAIN_PATTERN
        .captures_iter(text)
        .filter_map(|captures| captures.ok())
        .filter_map(|captures| captures.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Base64-decodes a domain source and keeps the text before `cutoff_marker`
/// (all of it when the marker is absent or empty).
pub fn decode_base64_source(raw: &[u8], cutoff_marker: &str) -> Result<String, String> {
    let compact: Vec<u8> = raw
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    let decoded = STANDARD.decode(&compact).map_err(|e| e.to_string())?;
    let text = String::from_utf8_lossy(&decoded).into_owned();

    if cutoff_marker.is_empty() {
        return Ok(text);
    }
    Ok(match text.find(cutoff_marker) {
        Some(pos) => text[..pos].to_string(),
        None => text,
    })
}

pub async fn load_domain_list(
    path: &Path,
    base64_decode: bool,
    cutoff_marker: &str,
) -> Result<DomainList, ResourceLoadError> {
    let raw = read(path).await?;

    let text = if base64_decode {
        decode_base64_source(&raw, cutoff_marker).map_err(|reason| ResourceLoadError::Decode {
            path: path.display().to_string(),
            reason,
        })?
    } else {
        String::from_utf8_lossy(&raw).into_owned()
    };

    let list = DomainList::new(extract_domains(&text));
    debug!(path = %path.display(), domains = list.len(), "Domain list loaded");
    Ok(list)
}

pub async fn load_ip_network_list(path: &Path) -> Result<IpNetworkList, ResourceLoadError> {
    let raw = read(path).await?;
    let list = IpNetworkList::parse(&String::from_utf8_lossy(&raw));
    debug!(path = %path.display(), networks = list.len(), "IP network list loaded");
    Ok(list)
}

pub async fn load_hosts(path: &Path) -> Result<HostsTable, ResourceLoadError> {
    let raw = read(path).await?;
    let table = HostsTable::parse(&String::from_utf8_lossy(&raw));
    debug!(path = %path.display(), names = table.len(), "Hosts file loaded");
    Ok(table)
}

async fn read(path: &Path) -> Result<Vec<u8>, ResourceLoadError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| ResourceLoadError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}
