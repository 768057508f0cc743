use super::error::NetworkError;
use super::network_struct::Network;

impl Network {
    /// Deletes all nodes and edges marked as `is_filtered_out`
    ///
    /// Nodes are purged first (with their incident edges), then the remaining marked edges.
    pub fn delete_filtered_out_items(&mut self) -> Result<(), NetworkError> {
        let nodes_to_purge: Vec<String> = self
            .nodes()
            .filter(|n| n.is_filtered_out)
            .map(|n| n.name().to_string())
            .collect();
        for node in &nodes_to_purge {
            self.delete_node(node)?;
        }

        let edges_to_purge: Vec<(String, String)> = self
            .edges()
            .filter(|e| e.is_filtered_out)
            .map(|e| (e.from().to_string(), e.to().to_string()))
            .collect();
        for (from, to) in &edges_to_purge {
            self.delete_edge(from, to)?;
        }
        tracing::debug!(
            nodes = nodes_to_purge.len(),
            edges = edges_to_purge.len(),
            "purged filtered out items"
        );

        self.validate_structure()
    }
}

///
/// Marks edges with a weight below `threshold` as filtered out
///
/// Returns a new [`Network`]; the passed one is not modified.
/// Use [`Network::delete_filtered_out_items`] to actually remove the marked edges.
///
pub fn filter_edges(network: &Network, threshold: u64) -> Network {
    let mut filtered = network.clone();
    let marked: Vec<(String, String)> = filtered
        .edges()
        .filter(|e| e.weight < threshold)
        .map(|e| (e.from().to_string(), e.to().to_string()))
        .collect();
    for (from, to) in marked {
        if let Some(edge) = filtered.edge_mut(&from, &to) {
            edge.is_filtered_out = true;
        }
    }
    filtered
}

///
/// Marks events (nodes) with a count below `threshold` as filtered out
///
/// Gates have an infinite weight and are never marked.
/// Returns a new [`Network`]; the passed one is not modified.
///
pub fn filter_events(network: &Network, threshold: u64) -> Network {
    let mut filtered = network.clone();
    for name in network.node_names() {
        if let Some(node) = filtered.node_mut(&name) {
            if node.weight.is_below(threshold) {
                node.is_filtered_out = true;
            }
        }
    }
    filtered
}
