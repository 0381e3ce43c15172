//! Identity of the node serving requests.

use std::fs;

/// Hostname of this process, used as the visit origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    hostname: String,
}

impl NodeIdentity {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }

    /// `$HOSTNAME`, then `/etc/hostname`, then `"unknown"`.
    pub fn detect() -> Self {
        let from_env = std::env::var("HOSTNAME").ok();
        let from_file = || fs::read_to_string("/etc/hostname").ok();
        let hostname = from_env
            .or_else(from_file)
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        Self { hostname }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Short container id; Docker sets the hostname to the container id.
    pub fn container_id(&self) -> &str {
        match self.hostname.char_indices().nth(12) {
            Some((idx, _)) => &self.hostname[..idx],
            None => &self.hostname,
        }
    }
}
