use std::collections::BTreeSet;

use super::error::NetworkError;
use super::network_struct::{Network, NodeType, NodeWeight};

impl Network {
    /// Remove a node that has exactly one predecessor `P` and one successor `S`, connecting
    /// `P -> S` instead
    ///
    /// The new edge carries the weight of `P -> node`. If `P -> S` already exists, that weight
    /// is added onto it. A node without predecessor or without successor is simply deleted.
    pub fn collapse_through_node(&mut self, name: &str) -> Result<(), NetworkError> {
        let node = self.get_node(name)?;
        if node.predecessors().len() > 1 || node.successors().len() > 1 {
            return Err(NetworkError::InvariantViolation(format!(
                "cannot collapse `{name}`: it has {} predecessors and {} successors",
                node.predecessors().len(),
                node.successors().len()
            )));
        }
        if node.has_self_edge() {
            return Err(NetworkError::InvariantViolation(format!(
                "cannot collapse `{name}`: it is its own successor"
            )));
        }
        let predecessor = node.predecessors().first().cloned();
        let successor = node.successors().first().cloned();

        match (predecessor, successor) {
            (Some(p), Some(s)) => {
                let weight = self.edge_weight(&p, name)?;
                self.delete_node(name)?;
                self.add_edge_weight(&p, &s, weight)?;
            }
            _ => {
                self.delete_node(name)?;
            }
        }
        tracing::debug!(node = name, "collapsed node");
        self.validate_structure()
    }

    /// Splice a dummy node into all incoming edges of `node`
    ///
    /// Every `X -> node` becomes `X -> dummy` (same weight), plus one `dummy -> node`
    /// carrying the summed weight. A self-edge of `node` stays where it is.
    /// Returns the name of the dummy.
    pub fn insert_dummy_before(&mut self, node: &str, dummy: &str) -> Result<String, NetworkError> {
        let sources = self.get_node(node)?.foreign_predecessors();
        self.splice_dummy_before(node, &sources, dummy)
    }

    /// Splice a dummy node into all outgoing edges of `node`
    ///
    /// Mirror of [`Network::insert_dummy_before`].
    pub fn insert_dummy_after(&mut self, node: &str, dummy: &str) -> Result<String, NetworkError> {
        let targets = self.get_node(node)?.foreign_successors();
        self.splice_dummy_after(node, &targets, dummy)
    }

    /// Splice a dummy node into the edges `source -> node` for the given `sources` only
    pub fn splice_dummy_before(
        &mut self,
        node: &str,
        sources: &BTreeSet<String>,
        dummy: &str,
    ) -> Result<String, NetworkError> {
        if self.get_node(node)?.is_start {
            return Err(NetworkError::PreconditionViolation(format!(
                "cannot insert a dummy before start node `{node}`"
            )));
        }
        let mut moved = Vec::with_capacity(sources.len());
        for source in sources {
            moved.push((source.clone(), self.edge_weight(source, node)?));
        }
        self.insert_node(dummy, NodeWeight::Count(0), NodeType::Dummy)?;

        let mut total: u64 = 0;
        for (source, weight) in moved {
            self.delete_edge(&source, node)?;
            self.add_edge(&source, dummy, weight)?;
            total = total.saturating_add(weight);
        }
        self.add_edge(dummy, node, total)?;
        tracing::debug!(node, dummy, "inserted dummy before node");
        self.validate_structure()?;
        Ok(dummy.to_string())
    }

    /// Splice a dummy node into the edges `node -> target` for the given `targets` only
    pub fn splice_dummy_after(
        &mut self,
        node: &str,
        targets: &BTreeSet<String>,
        dummy: &str,
    ) -> Result<String, NetworkError> {
        if self.get_node(node)?.is_end {
            return Err(NetworkError::PreconditionViolation(format!(
                "cannot insert a dummy after end node `{node}`"
            )));
        }
        let mut moved = Vec::with_capacity(targets.len());
        for target in targets {
            moved.push((target.clone(), self.edge_weight(node, target)?));
        }
        self.insert_node(dummy, NodeWeight::Count(0), NodeType::Dummy)?;

        let mut total: u64 = 0;
        for (target, weight) in moved {
            self.delete_edge(node, &target)?;
            self.add_edge(dummy, &target, weight)?;
            total = total.saturating_add(weight);
        }
        self.add_edge(node, dummy, total)?;
        tracing::debug!(node, dummy, "inserted dummy after node");
        self.validate_structure()?;
        Ok(dummy.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::network_struct::tests::sample_network;

    #[test]
    fn collapse_through_node() {
        let mut net = Network::new();
        for n in ["a", "b", "c"] {
            net.add_node(n, 0);
        }
        net.add_edge("a", "b", 4).unwrap();
        net.add_edge("b", "c", 4).unwrap();

        net.collapse_through_node("b").unwrap();

        assert!(!net.contains_node("b"));
        assert_eq!(
            net.node("a").unwrap().successors(),
            &BTreeSet::from(["c".to_string()])
        );
        assert_eq!(
            net.node("c").unwrap().predecessors(),
            &BTreeSet::from(["a".to_string()])
        );
        assert_eq!(net.edge("a", "c").unwrap().weight, 4);
    }

    #[test]
    fn collapse_adds_onto_existing_edge() {
        let mut net = Network::new();
        for n in ["a", "b", "c"] {
            net.add_node(n, 0);
        }
        net.add_edge("a", "b", 4).unwrap();
        net.add_edge("b", "c", 4).unwrap();
        net.add_edge("a", "c", 2).unwrap();

        net.collapse_through_node("b").unwrap();
        assert_eq!(net.edge("a", "c").unwrap().weight, 6);
        assert_eq!(net.edge_count(), 1);
    }

    #[test]
    fn collapse_rejects_branching_node() {
        let mut net = sample_network();
        assert!(matches!(
            net.collapse_through_node("C"),
            Err(NetworkError::InvariantViolation(_))
        ));
        assert!(matches!(
            net.collapse_through_node("D"),
            Err(NetworkError::InvariantViolation(_))
        ));
        // nothing was touched
        assert!(net.contains_node("C"));
        assert_eq!(net.edge_count(), 5);
    }

    #[test]
    fn insert_dummy_before() {
        let mut net = sample_network();
        let original_predecessors = net.node("C").unwrap().predecessors().clone();

        net.insert_dummy_before("C", "dummy1").unwrap();

        let dummy = net.node("dummy1").unwrap();
        assert_eq!(dummy.node_type, NodeType::Dummy);
        assert_eq!(dummy.predecessors(), &original_predecessors);
        assert_eq!(dummy.successors(), &BTreeSet::from(["C".to_string()]));
        assert_eq!(
            net.node("C").unwrap().predecessors(),
            &BTreeSet::from(["dummy1".to_string()])
        );
        assert_eq!(net.edge("dummy1", "C").unwrap().weight, 2);
        net.validate_structure().unwrap();
    }

    #[test]
    fn insert_dummy_after() {
        let mut net = sample_network();
        let original_successors = net.node("D").unwrap().successors().clone();

        net.insert_dummy_after("D", "dummy1").unwrap();

        let dummy = net.node("dummy1").unwrap();
        assert_eq!(dummy.node_type, NodeType::Dummy);
        assert_eq!(dummy.successors(), &original_successors);
        assert_eq!(dummy.predecessors(), &BTreeSet::from(["D".to_string()]));
        assert_eq!(
            net.node("D").unwrap().successors(),
            &BTreeSet::from(["dummy1".to_string()])
        );
        net.validate_structure().unwrap();
    }

    #[test]
    fn dummy_then_collapse_restores_network() {
        let original = sample_network();
        let mut net = original.clone();
        net.insert_dummy_before("D", "d").unwrap();
        net.collapse_through_node("d").unwrap();
        assert_eq!(net, original);
    }

    #[test]
    fn splice_dummy_after_subset() {
        let mut net = sample_network();
        net.splice_dummy_after("D", &BTreeSet::from(["E".to_string()]), "d")
            .unwrap();
        assert!(net.contains_edge("D", "F"));
        assert!(net.contains_edge("D", "d"));
        assert!(net.contains_edge("d", "E"));
        assert!(!net.contains_edge("D", "E"));
    }

    #[test]
    fn dummy_rejected_at_boundaries() {
        let mut net = sample_network();
        net.autodetect_start_nodes(true);
        net.autodetect_end_nodes(true);
        assert!(matches!(
            net.insert_dummy_before("A", "d"),
            Err(NetworkError::PreconditionViolation(_))
        ));
        assert!(matches!(
            net.insert_dummy_after("E", "d"),
            Err(NetworkError::PreconditionViolation(_))
        ));
        assert!(matches!(
            net.insert_dummy_after("C", "A"),
            Err(NetworkError::DuplicateNode(_))
        ));
        net.validate_structure().unwrap();
    }
}
