use std::collections::BTreeSet;

use crate::network::error::NetworkError;
use crate::network::network_struct::{GateFunction, GateKind, Network, NodeType, NodeWeight};

const LOOP_GATE: NodeType = NodeType::Gate {
    kind: GateKind::Xor,
    function: GateFunction::LoopGate,
};

impl Network {
    /// Is the node its own successor?
    pub fn is_self_loop(&self, name: &str) -> Result<bool, NetworkError> {
        Ok(self.get_node(name)?.has_self_edge())
    }

    ///
    /// Is the event `A` a short loop `X -> A -> Y` with bypass `X -> Y`?
    ///
    /// `A` repeats itself (`A -> A`) and, ignoring that self-edge, has exactly one predecessor
    /// `X` and exactly one successor `Y`, with `X != Y` and a direct edge `X -> Y`.
    /// Without the self-edge, `A` is merely optional, which is left to gate discovery.
    ///
    pub fn is_short_loop(&self, name: &str) -> Result<bool, NetworkError> {
        Ok(self.short_loop_neighbours(name)?.is_some())
    }

    ///
    /// Is the event `B` the second node of a two-loop `A -> B -> A`?
    ///
    /// The only predecessor and the only successor of `B` (ignoring a self-edge) is the same
    /// event `A`, which does not loop on itself.
    ///
    pub fn is_two_loop(&self, name: &str) -> Result<bool, NetworkError> {
        Ok(self.two_loop_partner(name)?.is_some())
    }

    fn short_loop_neighbours(&self, name: &str) -> Result<Option<(String, String)>, NetworkError> {
        let node = self.get_node(name)?;
        if !node.node_type.is_event() || !node.has_self_edge() {
            return Ok(None);
        }
        let (Some(x), Some(y)) = (
            single(node.foreign_predecessors()),
            single(node.foreign_successors()),
        ) else {
            return Ok(None);
        };
        if x != y && self.contains_edge(&x, &y) {
            Ok(Some((x, y)))
        } else {
            Ok(None)
        }
    }

    fn two_loop_partner(&self, name: &str) -> Result<Option<String>, NetworkError> {
        let node = self.get_node(name)?;
        if !node.node_type.is_event() {
            return Ok(None);
        }
        let (Some(predecessor), Some(successor)) = (
            single(node.foreign_predecessors()),
            single(node.foreign_successors()),
        ) else {
            return Ok(None);
        };
        if predecessor != successor {
            return Ok(None);
        }
        let partner = self.get_node(&predecessor)?;
        if partner.node_type.is_event() && !partner.has_self_edge() {
            Ok(Some(predecessor))
        } else {
            Ok(None)
        }
    }

    ///
    /// Replace the self-edge of a node by an XOR loop gate
    ///
    /// `A -> A` (weight `s`) and `A -> S_i` (weights `f_i`) become `A -> gate` (`s + Σ f_i`),
    /// `gate -> A` (`s`) and `gate -> S_i` (`f_i`).
    ///
    pub fn rewrite_self_loop(&mut self, name: &str) -> Result<String, NetworkError> {
        if !self.is_self_loop(name)? {
            return Err(NetworkError::PreconditionViolation(format!(
                "`{name}` is not a self-loop"
            )));
        }
        let self_weight = self.delete_edge(name, name)?.weight;
        let mut forward = Vec::new();
        for successor in self.get_node(name)?.successors() {
            forward.push((successor.clone(), self.edge_weight(name, successor)?));
        }

        let gate = self.unique_name(&format!("{}_loop_{name}", GateKind::Xor));
        self.insert_node(gate.as_str(), NodeWeight::Infinite, LOOP_GATE)?;
        let mut total = self_weight;
        for (successor, weight) in forward {
            self.delete_edge(name, &successor)?;
            self.add_edge(&gate, &successor, weight)?;
            total = total.saturating_add(weight);
        }
        self.add_edge(name, &gate, total)?;
        self.add_edge(&gate, name, self_weight)?;
        tracing::debug!(node = name, %gate, "rewrote self-loop");

        self.validate_structure()?;
        Ok(gate)
    }

    ///
    /// Rewrite a short loop `X -> A -> Y` with bypass `X -> Y`
    ///
    /// An entry gate `G1` merges `X` and the return from `A`, an exit gate `G2` chooses
    /// between repeating `A` and continuing with `Y`:
    ///
    /// ```text
    /// X -> G1 -> G2 -> A -> G1
    ///             G2 -> Y
    /// ```
    ///
    /// The bypass `X -> Y` is folded into `X -> G1` and `G2 -> Y`, a self-edge of `A` into
    /// `A -> G1` and `G2 -> A`. Returns `(G1, G2)`.
    ///
    pub fn rewrite_short_loop(&mut self, name: &str) -> Result<(String, String), NetworkError> {
        let Some((x, y)) = self.short_loop_neighbours(name)? else {
            return Err(NetworkError::PreconditionViolation(format!(
                "`{name}` is not a short loop"
            )));
        };
        let x_a = self.delete_edge(&x, name)?.weight;
        let x_y = self.delete_edge(&x, &y)?.weight;
        let a_y = self.delete_edge(name, &y)?.weight;
        let a_a = if self.contains_edge(name, name) {
            self.delete_edge(name, name)?.weight
        } else {
            0
        };

        let entry = self.unique_name(&format!("{}_loop_in_{name}", GateKind::Xor));
        self.insert_node(entry.as_str(), NodeWeight::Infinite, LOOP_GATE)?;
        let exit = self.unique_name(&format!("{}_loop_out_{name}", GateKind::Xor));
        self.insert_node(exit.as_str(), NodeWeight::Infinite, LOOP_GATE)?;

        let into_entry = x_a.saturating_add(x_y);
        let back_to_entry = a_a.saturating_add(a_y);
        self.add_edge(&x, &entry, into_entry)?;
        self.add_edge(name, &entry, back_to_entry)?;
        self.add_edge(&entry, &exit, into_entry.saturating_add(back_to_entry))?;
        self.add_edge(&exit, name, x_a.saturating_add(a_a))?;
        self.add_edge(&exit, &y, x_y.saturating_add(a_y))?;
        tracing::debug!(node = name, %entry, %exit, "rewrote short loop");

        self.validate_structure()?;
        Ok((entry, exit))
    }

    ///
    /// Rewrite the two-loop `A <-> B` around the second node `B`
    ///
    /// A dummy is spliced into `A -> B`, then an XOR loop gate merges all external
    /// predecessors of the pair and the return from `B` into `A`, and a second one splits `A`
    /// into the dummy (towards `B`) and all external successors.
    /// Returns the two gate names `(merge, split)`.
    ///
    pub fn rewrite_two_loop(&mut self, name: &str) -> Result<(String, String), NetworkError> {
        let Some(partner) = self.two_loop_partner(name)? else {
            return Err(NetworkError::PreconditionViolation(format!(
                "`{name}` is not part of a two-loop"
            )));
        };

        let dummy = self.unique_name(&format!("dummy_before_{name}"));
        let dummy = self.splice_dummy_before(name, &BTreeSet::from([partner.clone()]), &dummy)?;

        let mut sources = self.get_node(&partner)?.foreign_predecessors();
        sources.insert(name.to_string());
        let merge = self
            .insert_merge_gate_with_function(&sources, &partner, GateKind::Xor, GateFunction::LoopGate)?
            .gate;

        let mut targets = self.get_node(&partner)?.foreign_successors();
        targets.insert(dummy);
        let split = self
            .insert_split_gate_with_function(&partner, &targets, GateKind::Xor, GateFunction::LoopGate)?
            .gate;

        match (merge, split) {
            (Some(merge), Some(split)) => {
                tracing::debug!(node = name, %partner, %merge, %split, "rewrote two-loop");
                Ok((merge, split))
            }
            _ => Err(NetworkError::InvariantViolation(format!(
                "two-loop `{partner}` <-> `{name}` could not be wrapped in gates"
            ))),
        }
    }

    ///
    /// Resolve all loop motifs
    ///
    /// In every round, each event (in name order) is checked for a short loop, then a
    /// self-loop, then a two-loop, and rewritten accordingly. A rewrite can turn an event
    /// that was already checked into a new motif, so rounds repeat until one makes no rewrite.
    /// Returns the number of rewrites.
    ///
    pub fn process_short_loops(&mut self) -> Result<usize, NetworkError> {
        // every rewrite removes a self-edge or an edge between two events and never adds one
        let max_rounds = self.edge_count() + 1;
        let mut rewrites = 0;
        for round in 1..=max_rounds {
            let round_rewrites = self.process_short_loops_round()?;
            rewrites += round_rewrites;
            if round_rewrites == 0 {
                tracing::debug!(rewrites, rounds = round, "processed loops");
                return Ok(rewrites);
            }
        }
        Err(NetworkError::InvariantViolation(format!(
            "loop motifs left after {max_rounds} rounds of rewriting"
        )))
    }

    fn process_short_loops_round(&mut self) -> Result<usize, NetworkError> {
        let events: Vec<String> = self
            .nodes()
            .filter(|n| n.node_type.is_event())
            .map(|n| n.name().to_string())
            .collect();

        let mut rewrites = 0;
        for event in events {
            if !self.contains_node(&event) {
                continue;
            }
            if self.is_short_loop(&event)? {
                self.rewrite_short_loop(&event)?;
                rewrites += 1;
            }
            if self.is_self_loop(&event)? {
                self.rewrite_self_loop(&event)?;
                rewrites += 1;
            }
            if self.is_two_loop(&event)? {
                self.rewrite_two_loop(&event)?;
                rewrites += 1;
            }
        }
        Ok(rewrites)
    }
}

fn single(set: BTreeSet<String>) -> Option<String> {
    if set.len() == 1 {
        set.into_iter().next()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::succession::network_factory::BoundaryDetection;
    use crate::succession::succession_struct::SuccessionRelation;

    fn network(successions: &[(&str, &str, u64)]) -> Network {
        let mut relation = SuccessionRelation::new();
        for (from, to, count) in successions {
            relation.add_succession(*from, *to, *count);
        }
        Network::from_succession_relation(&relation, BoundaryDetection::Autodetect).unwrap()
    }

    fn assert_loop_free(net: &Network) {
        for name in net.node_names() {
            assert!(!net.is_self_loop(&name).unwrap(), "{name} is a self-loop");
            assert!(!net.is_short_loop(&name).unwrap(), "{name} is a short loop");
            assert!(!net.is_two_loop(&name).unwrap(), "{name} is a two-loop");
        }
    }

    fn gates(net: &Network) -> Vec<String> {
        net.nodes()
            .filter(|n| n.node_type.is_gate())
            .map(|n| n.name().to_string())
            .collect()
    }

    #[test]
    fn loop_predicates() {
        let self_loop = network(&[("X", "A", 1), ("A", "A", 1), ("A", "Y", 1)]);
        assert!(self_loop.is_self_loop("A").unwrap());
        assert!(!self_loop.is_short_loop("A").unwrap());
        assert!(!self_loop.is_two_loop("A").unwrap());

        let short_loop = network(&[("X", "A", 1), ("X", "Y", 1), ("A", "A", 1), ("A", "Y", 1)]);
        assert!(short_loop.is_short_loop("A").unwrap());
        assert!(!short_loop.is_short_loop("X").unwrap());

        let two_loop = network(&[("X", "A", 1), ("A", "B", 1), ("A", "Y", 1), ("B", "A", 1)]);
        assert!(two_loop.is_two_loop("B").unwrap());
        assert!(!two_loop.is_two_loop("A").unwrap());
        assert!(!two_loop.is_self_loop("B").unwrap());
    }

    #[test]
    fn self_loop() {
        let mut net = network(&[("X", "A", 2), ("A", "A", 3), ("A", "Y", 2)]);
        let gate = net.rewrite_self_loop("A").unwrap();

        assert!(!net.is_self_loop("A").unwrap());
        assert_eq!(net.node(&gate).unwrap().node_type, LOOP_GATE);
        assert_eq!(net.edge_weight("A", &gate).unwrap(), 5);
        assert_eq!(net.edge_weight(&gate, "A").unwrap(), 3);
        assert_eq!(net.edge_weight(&gate, "Y").unwrap(), 2);
        assert!(!net.contains_edge("A", "Y"));
        assert_loop_free(&net);
    }

    #[test]
    fn self_loop_without_other_successors() {
        let mut net = network(&[("X", "A", 1), ("A", "A", 4)]);
        let gate = net.rewrite_self_loop("A").unwrap();
        assert_eq!(net.edge_weight("A", &gate).unwrap(), 4);
        assert_eq!(net.edge_weight(&gate, "A").unwrap(), 4);
        assert_eq!(net.node(&gate).unwrap().successors().len(), 1);
    }

    #[test]
    fn short_loop() {
        let mut net = network(&[("X", "A", 2), ("X", "Y", 1), ("A", "A", 3), ("A", "Y", 2)]);
        let (entry, exit) = net.rewrite_short_loop("A").unwrap();

        assert_eq!(net.edge_weight("X", &entry).unwrap(), 3);
        assert_eq!(net.edge_weight("A", &entry).unwrap(), 5);
        assert_eq!(net.edge_weight(&entry, &exit).unwrap(), 8);
        assert_eq!(net.edge_weight(&exit, "A").unwrap(), 5);
        assert_eq!(net.edge_weight(&exit, "Y").unwrap(), 3);
        for (from, to) in [("X", "A"), ("X", "Y"), ("A", "A"), ("A", "Y")] {
            assert!(!net.contains_edge(from, to), "{from} -> {to} still exists");
        }
        assert_loop_free(&net);
    }

    #[test]
    fn two_loop() {
        let mut net = network(&[("X", "A", 1), ("A", "B", 1), ("A", "Y", 1), ("B", "A", 1)]);
        assert_eq!(net.process_short_loops().unwrap(), 1);

        let gates = gates(&net);
        assert_eq!(gates.len(), 2);
        for gate in &gates {
            assert_eq!(net.node(gate).unwrap().node_type, LOOP_GATE);
        }
        assert!(!net.contains_edge("A", "B"));
        assert!(!net.contains_edge("B", "A"));

        let a = net.node("A").unwrap();
        assert_eq!(a.predecessors().len(), 1);
        assert_eq!(a.successors().len(), 1);
        let merge = a.predecessors().first().unwrap();
        let split = a.successors().first().unwrap();
        assert_eq!(
            net.node(merge).unwrap().predecessors(),
            &BTreeSet::from(["B".to_string(), "X".to_string()])
        );
        assert_eq!(
            net.node(split).unwrap().successors(),
            &BTreeSet::from(["Y".to_string(), "dummy_before_B".to_string()])
        );
        assert_loop_free(&net);
    }

    #[test]
    fn process_short_loops_resolves_everything() {
        let mut net = network(&[
            ("s", "a", 4),
            ("a", "a", 2),
            ("a", "b", 4),
            ("b", "c", 3),
            ("b", "e", 1),
            ("c", "d", 3),
            ("d", "c", 1),
            ("c", "e", 2),
            ("e", "f", 2),
            ("e", "g", 1),
            ("f", "f", 1),
            ("f", "g", 2),
        ]);
        assert!(net.is_self_loop("a").unwrap());
        assert!(net.is_two_loop("d").unwrap());
        assert!(net.is_short_loop("f").unwrap());

        assert_eq!(net.process_short_loops().unwrap(), 3);
        assert_loop_free(&net);
        assert_eq!(net.get_start_events(), BTreeSet::from(["s".to_string()]));
        assert_eq!(net.get_end_events(), BTreeSet::from(["g".to_string()]));
    }

    #[test]
    fn optional_activity_is_no_short_loop() {
        let mut net = network(&[("X", "A", 1), ("X", "Y", 1), ("A", "Y", 1)]);
        assert!(!net.is_short_loop("A").unwrap());
        assert_eq!(net.process_short_loops().unwrap(), 0);
        assert!(gates(&net).is_empty());
        assert!(!petgraph::algo::is_cyclic_directed(&net.to_graph()));
    }

    #[test]
    fn motifs_created_by_later_rewrites_are_resolved() {
        // `e e a e`: rewriting the self-loop of `e` reroutes `e -> a` through a gate
        let relation = SuccessionRelation::from_traces(&[vec!["e", "e", "a", "e"]]);
        let mut net =
            Network::from_succession_relation(&relation, BoundaryDetection::FromRelation)
                .unwrap();
        assert!(net.is_self_loop("e").unwrap());
        assert!(!net.is_two_loop("a").unwrap());

        assert!(net.process_short_loops().unwrap() >= 1);
        assert_loop_free(&net);
        net.validate_structure().unwrap();
    }

    #[test]
    fn saturating_loop_weights() {
        let mut net = network(&[("X", "A", 1), ("A", "A", u64::MAX), ("A", "Y", 1)]);
        let gate = net.rewrite_self_loop("A").unwrap();
        assert_eq!(net.edge_weight("A", &gate).unwrap(), u64::MAX);
        assert_eq!(net.edge_weight(&gate, "Y").unwrap(), 1);
    }

    #[test]
    fn rewrite_requires_motif() {
        let mut net = network(&[("X", "A", 1), ("A", "Y", 1)]);
        let before = net.clone();
        assert!(matches!(
            net.rewrite_self_loop("A"),
            Err(NetworkError::PreconditionViolation(_))
        ));
        assert!(matches!(
            net.rewrite_short_loop("A"),
            Err(NetworkError::PreconditionViolation(_))
        ));
        assert!(matches!(
            net.rewrite_two_loop("A"),
            Err(NetworkError::PreconditionViolation(_))
        ));
        assert_eq!(net, before);
        assert_eq!(net.process_short_loops().unwrap(), 0);
    }
}
