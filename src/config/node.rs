// ABOUTME: Reservation nodes listed in the config file.
// ABOUTME: Parses detailed entries and short forms like "host", "user@host", "user@host:port".

use crate::reservation::{DEVICE_ATTR, Node, USER_ATTR};
use crate::types::NodeId;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeConfig {
    /// Defaults to the entry's 1-based position in the list.
    #[serde(default)]
    pub id: Option<NodeId>,
    pub ip_public: String,
    #[serde(default)]
    pub ip_local: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl NodeConfig {
    /// Parse the short form `[user@]host[:port]`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("node address cannot be empty".to_string());
        }

        let (user, rest) = match s.split_once('@') {
            Some((user, rest)) => (Some(user), rest),
            None => (None, s),
        };

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port_str)) => {
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port: {}", port_str))?;
                (host, Some(port))
            }
            None => (rest, None),
        };

        if host.is_empty() {
            return Err("hostname cannot be empty".to_string());
        }

        Ok(NodeConfig {
            id: None,
            ip_public: host.to_string(),
            ip_local: None,
            hostname: None,
            port,
            user: user.map(str::to_string),
            device: None,
            extra: BTreeMap::new(),
        })
    }

    /// Build the node at `position` (0-based) using `default_port` when unset.
    pub fn into_node(self, position: usize, default_port: u16) -> Node {
        let id = self.id.unwrap_or_else(|| NodeId::new(position as u32 + 1));
        let hostname = self.hostname.unwrap_or_else(|| self.ip_public.clone());

        let mut node = Node::new(id.get(), self.ip_public, hostname);
        node.ip_local = self.ip_local;
        node.port = self.port.unwrap_or(default_port);
        node.attributes = self.extra;
        if let Some(user) = self.user {
            node.attributes.insert(USER_ATTR.to_string(), user);
        }
        if let Some(device) = self.device {
            node.attributes.insert(DEVICE_ATTR.to_string(), device);
        }
        node
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum NodeEntry {
    Simple(String),
    Detailed(NodeConfig),
}

impl NodeEntry {
    pub(crate) fn into_node_config(self) -> Result<NodeConfig, String> {
        match self {
            NodeEntry::Simple(s) => NodeConfig::parse(&s),
            NodeEntry::Detailed(c) => Ok(c),
        }
    }
}
