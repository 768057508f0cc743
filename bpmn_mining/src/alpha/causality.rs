use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::network::error::{MiningWarning, NetworkError};
use crate::network::network_struct::Network;

/// Causal successors of every event node: `event -> {successors that do not precede it}`
pub type CausalityMap = BTreeMap<String, BTreeSet<String>>;

impl Network {
    /// Successors of a node that are not also its predecessors (`node` strictly causes them)
    pub fn causal_successors(&self, name: &str) -> Result<BTreeSet<String>, NetworkError> {
        let node = self.get_node(name)?;
        Ok(node
            .successors()
            .difference(node.predecessors())
            .cloned()
            .collect())
    }

    /// Successors of a node that are also its predecessors (observed in either order)
    pub fn parallel_peers(&self, name: &str) -> Result<BTreeSet<String>, NetworkError> {
        let node = self.get_node(name)?;
        Ok(node
            .successors()
            .intersection(node.predecessors())
            .cloned()
            .collect())
    }

    /// `to` follows `from`, but `from` never follows `to`
    pub fn is_causality(&self, from: &str, to: &str) -> Result<bool, NetworkError> {
        let from_node = self.get_node(from)?;
        let to_node = self.get_node(to)?;
        Ok(from_node.successors().contains(to) && !to_node.successors().contains(from))
    }

    /// Both nodes directly follow each other
    pub fn are_nodes_parallel(&self, first: &str, second: &str) -> Result<bool, NetworkError> {
        let first_node = self.get_node(first)?;
        let second_node = self.get_node(second)?;
        Ok(first_node.successors().contains(second) && second_node.successors().contains(first))
    }

    /// Checks whether the given nodes are mutually parallel
    ///
    /// Only consecutive pairs (in name order) are compared, not all pairs: for three or more
    /// nodes `{a, b, c}` this accepts the group if `a ∥ b` and `b ∥ c`, whether or not `a ∥ c`.
    pub fn are_all_nodes_parallel(&self, nodes: &BTreeSet<String>) -> Result<bool, NetworkError> {
        for (first, second) in nodes.iter().tuple_windows() {
            if !self.are_nodes_parallel(first, second)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Causal successors of every [`NodeType::Event`](crate::NodeType::Event) node
    ///
    /// Gates and dummies are not keys of the map: only activities of the log take part in
    /// gate discovery.
    pub fn get_causality(&self) -> CausalityMap {
        self.nodes()
            .filter(|n| n.node_type.is_event())
            .map(|n| {
                (
                    n.name().to_string(),
                    n.successors()
                        .difference(n.predecessors())
                        .cloned()
                        .collect(),
                )
            })
            .collect()
    }

    /// Removes both edges between two parallel nodes
    ///
    /// If the nodes are not parallel, nothing is changed and a warning is returned.
    pub fn delete_parallelism(
        &mut self,
        first: &str,
        second: &str,
    ) -> Result<Option<MiningWarning>, NetworkError> {
        if !self.are_nodes_parallel(first, second)? {
            let warning = MiningWarning::NotParallel {
                first: first.to_string(),
                second: second.to_string(),
            };
            tracing::warn!("{warning}");
            return Ok(Some(warning));
        }
        self.delete_edge(first, second)?;
        self.delete_edge(second, first)?;
        self.validate_structure()?;
        Ok(None)
    }

    /// Removes parallelism between consecutive pairs (in name order) of the given nodes
    pub fn delete_parallelism_from_all(
        &mut self,
        nodes: &BTreeSet<String>,
    ) -> Result<Vec<MiningWarning>, NetworkError> {
        let mut warnings = Vec::new();
        for (first, second) in nodes.iter().tuple_windows() {
            warnings.extend(self.delete_parallelism(first, second)?);
        }
        Ok(warnings)
    }
}
