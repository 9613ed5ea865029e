// ABOUTME: Choice of the node that receives data first for relay and gateway strategies.
// ABOUTME: Explicit id when given, otherwise the node with the lowest public address.

use super::error::DeployError;
use crate::reservation::{Node, Reservation};
use crate::types::NodeId;

/// The admin node and every other node of the reservation.
#[derive(Debug, Clone)]
pub struct AdminSelection<'a> {
    pub admin: &'a Node,
    pub others: Vec<&'a Node>,
}

/// Pick the admin node.
///
/// Without an explicit id the node with the numerically smallest public
/// address wins; addresses that are not IPs sort after all IPs.
pub fn select_admin(
    reservation: &Reservation,
    explicit: Option<NodeId>,
) -> Result<AdminSelection<'_>, DeployError> {
    let admin = match explicit {
        Some(id) => reservation.get(id).ok_or(DeployError::UnknownAdmin(id))?,
        None => reservation
            .nodes()
            .min_by(|a, b| a.address_key().cmp(&b.address_key()))
            .unwrap_or_else(|| reservation.first()),
    };

    let others = reservation
        .nodes()
        .filter(|node| node.id != admin.id)
        .collect();

    Ok(AdminSelection { admin, others })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_nodes() -> Reservation {
        Reservation::new(vec![
            Node::new(1, "10.0.0.5", "node1"),
            Node::new(2, "10.0.0.2", "node2"),
        ])
        .unwrap()
    }

    #[test]
    fn lowest_address_is_default_admin() {
        let reservation = two_nodes();
        let selection = select_admin(&reservation, None).unwrap();
        assert_eq!(selection.admin.id, NodeId::new(2));
        assert_eq!(selection.others.len(), 1);
        assert_eq!(selection.others[0].id, NodeId::new(1));
    }

    #[test]
    fn explicit_id_wins() {
        let reservation = two_nodes();
        let selection = select_admin(&reservation, Some(NodeId::new(1))).unwrap();
        assert_eq!(selection.admin.id, NodeId::new(1));
    }

    #[test]
    fn unknown_explicit_id_fails() {
        let reservation = two_nodes();
        let err = select_admin(&reservation, Some(NodeId::new(9))).unwrap_err();
        assert!(matches!(err, DeployError::UnknownAdmin(id) if id == NodeId::new(9)));
    }

    #[test]
    fn addresses_compare_numerically() {
        let reservation = Reservation::new(vec![
            Node::new(1, "10.0.0.10", "a"),
            Node::new(2, "10.0.0.9", "b"),
        ])
        .unwrap();
        assert_eq!(select_admin(&reservation, None).unwrap().admin.id, NodeId::new(2));
    }

    #[test]
    fn hostnames_sort_after_addresses() {
        let reservation = Reservation::new(vec![
            Node::new(1, "alpha.cluster", "a"),
            Node::new(2, "192.168.1.1", "b"),
        ])
        .unwrap();
        assert_eq!(select_admin(&reservation, None).unwrap().admin.id, NodeId::new(2));
    }

    #[test]
    fn single_node_has_no_others() {
        let reservation = Reservation::new(vec![Node::new(7, "10.1.1.1", "solo")]).unwrap();
        let selection = select_admin(&reservation, None).unwrap();
        assert_eq!(selection.admin.id, NodeId::new(7));
        assert!(selection.others.is_empty());
    }
}
