// ABOUTME: Reserved cluster nodes a deployment targets.
// ABOUTME: Node addressing, login attributes, and a non-empty set unique by id.

mod parse;

pub use parse::{ParseReservationError, read_reservation};

use crate::types::NodeId;
use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use thiserror::Error;

/// Attribute holding the login user for a node.
pub const USER_ATTR: &str = "user";
/// Attribute holding an optional storage device path on a node.
pub const DEVICE_ATTR: &str = "device";

/// One reserved machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub ip_public: String,
    #[serde(default)]
    pub ip_local: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    pub hostname: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

fn default_port() -> u16 {
    22
}

impl Node {
    pub fn new(id: u32, ip_public: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(id),
            ip_public: ip_public.into(),
            ip_local: None,
            port: default_port(),
            hostname: hostname.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Login user for this node, if the reservation provides one.
    pub fn user(&self) -> Option<&str> {
        self.attributes.get(USER_ATTR).map(String::as_str)
    }

    /// Storage device path on this node, if any.
    pub fn device(&self) -> Option<&str> {
        self.attributes.get(DEVICE_ATTR).map(String::as_str)
    }

    /// Key ordering nodes by numeric public address.
    ///
    /// IP addresses sort numerically and before anything that does not parse
    /// as an address; those fall back to lexicographic order.
    pub fn address_key(&self) -> (bool, Option<IpAddr>, &str) {
        let parsed = self.ip_public.parse::<IpAddr>().ok();
        (parsed.is_none(), parsed, self.ip_public.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReservationError {
    #[error("reservation contains no nodes")]
    Empty,

    #[error("duplicate node id in reservation: {0}")]
    DuplicateId(NodeId),
}

/// Ordered, non-empty set of nodes, unique by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    nodes: NonEmpty<Node>,
}

impl Reservation {
    pub fn new(nodes: Vec<Node>) -> Result<Self, ReservationError> {
        for (index, node) in nodes.iter().enumerate() {
            if nodes[..index].iter().any(|other| other.id == node.id) {
                return Err(ReservationError::DuplicateId(node.id));
            }
        }
        NonEmpty::from_vec(nodes)
            .map(|nodes| Self { nodes })
            .ok_or(ReservationError::Empty)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn first(&self) -> &Node {
        self.nodes.first()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }
}

impl Serialize for Reservation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.nodes.iter())
    }
}

impl<'de> Deserialize<'de> for Reservation {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let nodes = Vec::<Node>::deserialize(deserializer)?;
        Reservation::new(nodes).map_err(serde::de::Error::custom)
    }
}
