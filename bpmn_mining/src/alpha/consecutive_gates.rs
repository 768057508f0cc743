use crate::network::error::NetworkError;
use crate::network::network_struct::{GateFunction, Network, Node};

/// First pair of gates that can be folded, as `(absorbed, absorbing)`
fn find_foldable_pair(net: &Network) -> Option<(String, String)> {
    let same_kind = |a: &Node, b: &Node| {
        a.node_type.gate_kind().is_some() && a.node_type.gate_kind() == b.node_type.gate_kind()
    };
    for gate in net.nodes() {
        match gate.node_type.gate_function() {
            Some(GateFunction::Split) if gate.predecessors().len() == 1 => {
                let Some(before) = gate.predecessors().first().and_then(|p| net.node(p)) else {
                    continue;
                };
                if before.name() != gate.name()
                    && before.node_type.gate_function() == Some(GateFunction::Split)
                    && same_kind(before, gate)
                {
                    return Some((gate.name().to_string(), before.name().to_string()));
                }
            }
            Some(GateFunction::Merge) if gate.successors().len() == 1 => {
                let Some(after) = gate.successors().first().and_then(|s| net.node(s)) else {
                    continue;
                };
                if after.name() != gate.name()
                    && after.node_type.gate_function() == Some(GateFunction::Merge)
                    && same_kind(gate, after)
                {
                    return Some((gate.name().to_string(), after.name().to_string()));
                }
            }
            _ => {}
        }
    }
    None
}

///
/// Fold directly connected gates of the same kind
///
/// A split gate whose only predecessor is a split gate of the same kind is absorbed by that
/// predecessor, which takes over its outgoing edges (with their weights).
/// Symmetrically, a merge gate whose only successor is a merge gate of the same kind is absorbed
/// by that successor. Loop gates are left alone.
///
/// Returns the number of folded gates.
///
pub fn merge_consecutive_gates(net: &mut Network) -> Result<usize, NetworkError> {
    let mut merged = 0;
    while let Some((absorbed, absorbing)) = find_foldable_pair(net) {
        let node = net.get_node(&absorbed)?;
        let is_split = node.node_type.gate_function() == Some(GateFunction::Split);
        if is_split {
            for successor in node.successors().clone() {
                let weight = net.delete_edge(&absorbed, &successor)?.weight;
                net.add_edge_weight(&absorbing, &successor, weight)?;
            }
        } else {
            for predecessor in node.predecessors().clone() {
                let weight = net.delete_edge(&predecessor, &absorbed)?.weight;
                net.add_edge_weight(&predecessor, &absorbing, weight)?;
            }
        }
        net.delete_node(&absorbed)?;
        tracing::debug!(%absorbed, %absorbing, "folded consecutive gates");
        net.validate_structure()?;
        merged += 1;
    }
    Ok(merged)
}
