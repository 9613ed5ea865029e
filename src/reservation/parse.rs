// ABOUTME: Textual reservation block parsing.
// ABOUTME: One `|id|ip_local|ip_public|port|hostname|attrs|` line per node, ended by a blank line.

use super::{Node, Reservation, ReservationError};
use crate::types::NodeId;
use std::collections::BTreeMap;
use std::io::BufRead;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseReservationError {
    #[error("line {line}: expected 6 '|'-separated fields, found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: invalid node id '{value}'")]
    InvalidId { line: usize, value: String },

    #[error("line {line}: invalid port '{value}'")]
    InvalidPort { line: usize, value: String },

    #[error("line {line}: empty public address")]
    MissingAddress { line: usize },

    #[error("line {line}: malformed attribute '{value}', expected key=value")]
    InvalidAttribute { line: usize, value: String },

    #[error(transparent)]
    Reservation(#[from] ReservationError),

    #[error("failed to read reservation: {0}")]
    Io(#[from] std::io::Error),
}

impl Reservation {
    /// Parse a reservation block.
    ///
    /// Leading blank lines and `#` comments are skipped; the first blank line
    /// after a node ends the block.
    pub fn from_text(text: &str) -> Result<Self, ParseReservationError> {
        let mut nodes = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.starts_with('#') {
                continue;
            }
            if line.is_empty() {
                if nodes.is_empty() {
                    continue;
                }
                break;
            }
            nodes.push(parse_node(index + 1, line)?);
        }
        Ok(Reservation::new(nodes)?)
    }

    /// Render the block accepted by [`Reservation::from_text`].
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for node in self.nodes() {
            let attrs = node
                .attributes
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(";");
            out.push_str(&format!(
                "|{}|{}|{}|{}|{}|{}|\n",
                node.id,
                node.ip_local.as_deref().unwrap_or(""),
                node.ip_public,
                node.port,
                node.hostname,
                attrs
            ));
        }
        out
    }
}

fn parse_node(line: usize, text: &str) -> Result<Node, ParseReservationError> {
    let inner = text.strip_prefix('|').unwrap_or(text);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    let fields: Vec<&str> = inner.split('|').map(str::trim).collect();
    if fields.len() != 6 {
        return Err(ParseReservationError::FieldCount {
            line,
            found: fields.len(),
        });
    }

    let id = fields[0]
        .parse::<NodeId>()
        .map_err(|_| ParseReservationError::InvalidId {
            line,
            value: fields[0].to_string(),
        })?;

    let port = if fields[3].is_empty() {
        22
    } else {
        fields[3]
            .parse::<u16>()
            .map_err(|_| ParseReservationError::InvalidPort {
                line,
                value: fields[3].to_string(),
            })?
    };

    if fields[2].is_empty() {
        return Err(ParseReservationError::MissingAddress { line });
    }

    let mut attributes = BTreeMap::new();
    for pair in fields[5].split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) =
            pair.split_once('=')
                .ok_or_else(|| ParseReservationError::InvalidAttribute {
                    line,
                    value: pair.to_string(),
                })?;
        attributes.insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(Node {
        id,
        ip_local: (!fields[1].is_empty()).then(|| fields[1].to_string()),
        ip_public: fields[2].to_string(),
        port,
        hostname: fields[4].to_string(),
        attributes,
    })
}

/// Read a reservation block from a reader (typically stdin).
///
/// Stops at the first blank line after the nodes. Malformed input is logged
/// and yields `None`.
pub fn read_reservation<R: BufRead>(reader: R) -> Option<Reservation> {
    let mut block = String::new();
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Could not read reservation input: {}", e);
                return None;
            }
        };
        if line.trim().is_empty() && !block.trim().is_empty() {
            break;
        }
        block.push_str(&line);
        block.push('\n');
    }

    match Reservation::from_text(&block) {
        Ok(reservation) => Some(reservation),
        Err(e) => {
            tracing::error!("Could not parse reservation. Was input malformed? {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_attributes() {
        let node = parse_node(1, "|3|192.168.1.3|10.0.0.3|2222|node3|user=bob; device=/dev/sdb|")
            .unwrap();
        assert_eq!(node.id, NodeId::new(3));
        assert_eq!(node.ip_local.as_deref(), Some("192.168.1.3"));
        assert_eq!(node.port, 2222);
        assert_eq!(node.user(), Some("bob"));
        assert_eq!(node.device(), Some("/dev/sdb"));
    }

    #[test]
    fn empty_port_defaults_to_22() {
        let node = parse_node(1, "|1||10.0.0.1||node1||").unwrap();
        assert_eq!(node.port, 22);
        assert!(node.ip_local.is_none());
        assert!(node.attributes.is_empty());
    }

    #[test]
    fn rejects_attribute_without_value() {
        let err = parse_node(4, "|1||10.0.0.1|22|node1|user|").unwrap_err();
        assert!(matches!(err, ParseReservationError::InvalidAttribute { line: 4, .. }));
    }
}
