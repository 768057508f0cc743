use std::collections::BTreeSet;

use itertools::Itertools;

use crate::network::error::{MiningWarning, NetworkError};
use crate::network::network_struct::{GateFunction, GateKind, Network, NodeType, NodeWeight};

/// Outcome of inserting a gate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateInsertion {
    /// Name of the created gate (`None` if none of the requested neighbours was adjacent)
    pub gate: Option<String>,
    /// Requested neighbours that were skipped
    pub warnings: Vec<MiningWarning>,
}

fn split_gate_name(source: &str, targets: &BTreeSet<String>, kind: GateKind) -> String {
    format!("{kind}_s_{source}->[{}]", targets.iter().join(","))
}

fn merge_gate_name(sources: &BTreeSet<String>, target: &str, kind: GateKind) -> String {
    format!("{kind}_m_[{}]->{target}", sources.iter().join(","))
}

impl Network {
    ///
    /// Insert a split gate between `source` and `targets`
    ///
    /// Every `source -> target` edge is replaced by `gate -> target` with the same weight, and
    /// `source -> gate` carries the sum of the replaced weights.
    /// Targets that are not (or no longer) successors of `source` are skipped with a warning.
    ///
    pub fn insert_split_gate(
        &mut self,
        source: &str,
        targets: &BTreeSet<String>,
        kind: GateKind,
    ) -> Result<GateInsertion, NetworkError> {
        self.insert_split_gate_with_function(source, targets, kind, GateFunction::Split)
    }

    ///
    /// Insert a merge gate between `sources` and `target`
    ///
    /// Mirror of [`Network::insert_split_gate`] on the predecessor side.
    ///
    pub fn insert_merge_gate(
        &mut self,
        sources: &BTreeSet<String>,
        target: &str,
        kind: GateKind,
    ) -> Result<GateInsertion, NetworkError> {
        self.insert_merge_gate_with_function(sources, target, kind, GateFunction::Merge)
    }

    pub(crate) fn insert_split_gate_with_function(
        &mut self,
        source: &str,
        targets: &BTreeSet<String>,
        kind: GateKind,
        function: GateFunction,
    ) -> Result<GateInsertion, NetworkError> {
        self.get_node(source)?;
        let name = self.unique_name(&split_gate_name(source, targets, kind));

        let mut warnings = Vec::new();
        let mut rerouted = Vec::new();
        for target in targets {
            match self.edge(source, target) {
                Some(edge) => rerouted.push((target.clone(), edge.weight)),
                None => {
                    let warning = MiningWarning::SplitTargetNotAdjacent {
                        gate: name.clone(),
                        from: source.to_string(),
                        to: target.clone(),
                    };
                    tracing::warn!("{warning}");
                    warnings.push(warning);
                }
            }
        }
        if rerouted.is_empty() {
            return Ok(GateInsertion {
                gate: None,
                warnings,
            });
        }

        self.insert_node(name.as_str(), NodeWeight::Infinite, NodeType::Gate { kind, function })?;
        let mut aggregated: u64 = 0;
        for (target, weight) in rerouted {
            self.delete_edge(source, &target)?;
            self.add_edge(&name, &target, weight)?;
            aggregated = aggregated.saturating_add(weight);
        }
        self.add_edge(source, &name, aggregated)?;
        tracing::debug!(gate = %name, weight = aggregated, "inserted split gate");

        self.validate_structure()?;
        Ok(GateInsertion {
            gate: Some(name),
            warnings,
        })
    }

    pub(crate) fn insert_merge_gate_with_function(
        &mut self,
        sources: &BTreeSet<String>,
        target: &str,
        kind: GateKind,
        function: GateFunction,
    ) -> Result<GateInsertion, NetworkError> {
        self.get_node(target)?;
        let name = self.unique_name(&merge_gate_name(sources, target, kind));

        let mut warnings = Vec::new();
        let mut rerouted = Vec::new();
        for source in sources {
            match self.edge(source, target) {
                Some(edge) => rerouted.push((source.clone(), edge.weight)),
                None => {
                    let warning = MiningWarning::MergeSourceNotAdjacent {
                        gate: name.clone(),
                        from: source.clone(),
                        to: target.to_string(),
                    };
                    tracing::warn!("{warning}");
                    warnings.push(warning);
                }
            }
        }
        if rerouted.is_empty() {
            return Ok(GateInsertion {
                gate: None,
                warnings,
            });
        }

        self.insert_node(name.as_str(), NodeWeight::Infinite, NodeType::Gate { kind, function })?;
        let mut aggregated: u64 = 0;
        for (source, weight) in rerouted {
            self.delete_edge(&source, target)?;
            self.add_edge(&source, &name, weight)?;
            aggregated = aggregated.saturating_add(weight);
        }
        self.add_edge(&name, target, aggregated)?;
        tracing::debug!(gate = %name, weight = aggregated, "inserted merge gate");

        self.validate_structure()?;
        Ok(GateInsertion {
            gate: Some(name),
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::network_struct::tests::sample_network;

    fn names(n: &[&str]) -> BTreeSet<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    fn inflow(net: &Network, node: &str) -> u64 {
        net.node(node)
            .unwrap()
            .predecessors()
            .iter()
            .map(|p| net.edge_weight(p, node).unwrap())
            .sum()
    }

    fn outflow(net: &Network, node: &str) -> u64 {
        net.node(node)
            .unwrap()
            .successors()
            .iter()
            .map(|s| net.edge_weight(node, s).unwrap())
            .sum()
    }

    #[test]
    fn split_gate() {
        let mut net = sample_network();
        net.edge_mut("D", "E").unwrap().weight = 3;
        net.edge_mut("D", "F").unwrap().weight = 5;

        let inserted = net
            .insert_split_gate("D", &names(&["E", "F"]), GateKind::Xor)
            .unwrap();
        let gate = inserted.gate.unwrap();
        assert_eq!(gate, "XOR_s_D->[E,F]");
        assert!(inserted.warnings.is_empty());

        let node = net.node(&gate).unwrap();
        assert_eq!(
            node.node_type,
            NodeType::Gate {
                kind: GateKind::Xor,
                function: GateFunction::Split
            }
        );
        assert_eq!(node.weight, NodeWeight::Infinite);
        assert_eq!(node.successors(), &names(&["E", "F"]));
        assert_eq!(net.node("D").unwrap().successors(), &names(&[&gate]));
        assert_eq!(net.edge_weight("D", &gate).unwrap(), 8);
        assert_eq!(net.edge_weight(&gate, "E").unwrap(), 3);
        assert_eq!(inflow(&net, &gate), outflow(&net, &gate));
    }

    #[test]
    fn split_gate_weight_saturates() {
        let mut net = sample_network();
        net.edge_mut("D", "E").unwrap().weight = u64::MAX;
        net.edge_mut("D", "F").unwrap().weight = 2;

        let gate = net
            .insert_split_gate("D", &names(&["E", "F"]), GateKind::And)
            .unwrap()
            .gate
            .unwrap();
        assert_eq!(net.edge_weight("D", &gate).unwrap(), u64::MAX);
        assert_eq!(net.edge_weight(&gate, "F").unwrap(), 2);
    }

    #[test]
    fn merge_gate() {
        let mut net = sample_network();
        net.edge_mut("A", "C").unwrap().weight = 2;

        let inserted = net
            .insert_merge_gate(&names(&["A", "B"]), "C", GateKind::And)
            .unwrap();
        let gate = inserted.gate.unwrap();
        assert_eq!(gate, "AND_m_[A,B]->C");
        assert_eq!(net.node("C").unwrap().predecessors(), &names(&[&gate]));
        assert_eq!(net.node(&gate).unwrap().predecessors(), &names(&["A", "B"]));
        assert_eq!(net.edge_weight(&gate, "C").unwrap(), 3);
        assert_eq!(inflow(&net, &gate), outflow(&net, &gate));
        assert!(!net.is_merge("C").unwrap());
    }

    #[test]
    fn non_adjacent_targets_are_skipped() {
        let mut net = sample_network();
        let inserted = net
            .insert_split_gate("D", &names(&["E", "A"]), GateKind::Xor)
            .unwrap();
        assert!(inserted.gate.is_some());
        assert_eq!(
            inserted.warnings,
            vec![MiningWarning::SplitTargetNotAdjacent {
                gate: "XOR_s_D->[A,E]".to_string(),
                from: "D".to_string(),
                to: "A".to_string(),
            }]
        );
        assert!(net.contains_edge("D", "F"));

        let before = net.clone();
        let inserted = net
            .insert_merge_gate(&names(&["E", "F"]), "A", GateKind::Xor)
            .unwrap();
        assert_eq!(inserted.gate, None);
        assert_eq!(inserted.warnings.len(), 2);
        assert_eq!(net, before);
    }

    #[test]
    fn gate_names_stay_unique() {
        let mut net = sample_network();
        net.insert_node(
            "XOR_s_D->[E,F]",
            NodeWeight::Infinite,
            NodeType::Dummy,
        )
        .unwrap();
        let inserted = net
            .insert_split_gate("D", &names(&["E", "F"]), GateKind::Xor)
            .unwrap();
        assert_eq!(inserted.gate.unwrap(), "XOR_s_D->[E,F]#2");
    }

    #[test]
    fn missing_source_is_fatal() {
        let mut net = sample_network();
        assert_eq!(
            net.insert_split_gate("X", &names(&["E"]), GateKind::Xor),
            Err(NetworkError::MissingNode("X".to_string()))
        );
    }
}
