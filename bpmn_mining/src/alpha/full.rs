use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::consecutive_gates::merge_consecutive_gates;
use crate::network::error::{MiningWarning, NetworkError};
use crate::network::network_struct::{GateFunction, GateKind, Network, NodeType, NodeWeight};

/// Name of the synthetic gate unifying multiple start events
pub const START_SPLIT_GATE: &str = "start_split_gate";
/// Name of the synthetic gate unifying multiple end events
pub const END_MERGE_GATE: &str = "end_merge_gate";

///
/// Groups of nodes detected as mutually parallel while mining
///
/// Split gate insertion registers every AND group here; merge gate insertion (and start/end
/// unification) looks up whether a predecessor set is such a group.
/// Groups are keyed by their (sorted) set of node names.
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParallelGroups {
    groups: BTreeSet<BTreeSet<String>>,
}

impl ParallelGroups {
    /// Create empty [`ParallelGroups`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a group of parallel nodes
    pub fn register(&mut self, group: BTreeSet<String>) {
        self.groups.insert(group);
    }

    /// Was exactly this group registered?
    pub fn contains(&self, group: &BTreeSet<String>) -> bool {
        self.groups.contains(group)
    }

    /// Number of registered groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// No group registered?
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate over all registered groups
    pub fn iter(&self) -> impl Iterator<Item = &BTreeSet<String>> {
        self.groups.iter()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
/// Algorithm parameters for alpha mining of a [`Network`]
pub struct AlphaMinerConfig {
    /// Rewrite self-loops, short loops and two-loops before discovering gates
    pub normalize_loops: bool,
    /// Unify multiple start (end) events under one synthetic split (merge) gate
    pub unify_start_end: bool,
    /// Fold directly connected gates of the same kind after mining
    pub merge_consecutive_gates: bool,
}

impl Default for AlphaMinerConfig {
    fn default() -> Self {
        Self {
            normalize_loops: true,
            unify_start_end: true,
            merge_consecutive_gates: false,
        }
    }
}

impl AlphaMinerConfig {
    /// Serialize parameters to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
    /// Deserialize parameters from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
/// Summary of a mining run
pub struct MiningReport {
    /// Number of rewritten loop motifs
    pub loop_rewrites: usize,
    /// Number of inserted split gates
    pub split_gates: usize,
    /// Number of inserted merge gates
    pub merge_gates: usize,
    /// Number of removed helper (dummy) nodes
    pub collapsed_dummies: usize,
    /// Number of gates folded into a directly connected gate
    pub merged_gates: usize,
    /// Groups of nodes detected as parallel
    pub parallel_groups: ParallelGroups,
    /// Recoverable problems encountered while mining
    pub warnings: Vec<MiningWarning>,
}

impl MiningReport {
    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

///
/// Discover gates in a [`Network`] using the alpha miner with default parameters
///
/// See [`alpha_mine_with_config`].
///
pub fn alpha_mine(network: &Network) -> Result<(Network, MiningReport), NetworkError> {
    alpha_mine_with_config(network, AlphaMinerConfig::default())
}

///
/// Discover gates in a [`Network`] using the alpha miner
///
/// The passed network is not modified; the mined network is returned together with a
/// [`MiningReport`]. Steps:
///
/// 1. Resolve loop motifs (see [`Network::process_short_loops`])
/// 2. Insert a split gate after every event with more than one causal successor
///    (AND if the successors are parallel, XOR otherwise)
/// 3. Insert a merge gate before every merge point (AND if its predecessors were found
///    parallel in step 2, XOR otherwise)
/// 4. Remove helper nodes
/// 5. Unify multiple start/end events
///
#[tracing::instrument(skip_all, fields(nodes = network.node_count(), edges = network.edge_count()))]
pub fn alpha_mine_with_config(
    network: &Network,
    config: AlphaMinerConfig,
) -> Result<(Network, MiningReport), NetworkError> {
    let mut net = network.clone();
    let mut report = MiningReport::default();

    if config.normalize_loops {
        report.loop_rewrites = net.process_short_loops()?;
    }

    let causality = net.get_causality();
    for (event, successors) in &causality {
        if successors.len() <= 1 {
            continue;
        }
        let mut source = event.clone();
        if net.is_merge(event)? {
            let still_connected: BTreeSet<String> = successors
                .iter()
                .filter(|s| net.contains_edge(event, s))
                .cloned()
                .collect();
            if !still_connected.is_empty() {
                let dummy = net.unique_name(&format!("dummy_after_{event}"));
                source = net.splice_dummy_after(event, &still_connected, &dummy)?;
            }
        }
        let kind = if net.are_all_nodes_parallel(successors)? {
            report
                .warnings
                .extend(net.delete_parallelism_from_all(successors)?);
            report.parallel_groups.register(successors.clone());
            GateKind::And
        } else {
            GateKind::Xor
        };
        let inserted = net.insert_split_gate(&source, successors, kind)?;
        report.warnings.extend(inserted.warnings);
        if inserted.gate.is_some() {
            report.split_gates += 1;
        }
    }

    for name in net.node_names() {
        let node = net.get_node(&name)?;
        if node.node_type.is_loop_gate() || !net.is_merge(&name)? {
            continue;
        }
        let sources = node.predecessors().clone();
        let kind = if report.parallel_groups.contains(&sources) {
            GateKind::And
        } else {
            GateKind::Xor
        };
        let inserted = net.insert_merge_gate(&sources, &name, kind)?;
        report.warnings.extend(inserted.warnings);
        if inserted.gate.is_some() {
            report.merge_gates += 1;
        }
    }

    let dummies: Vec<String> = net
        .nodes()
        .filter(|n| n.node_type.is_dummy())
        .map(|n| n.name().to_string())
        .collect();
    for dummy in dummies {
        net.collapse_through_node(&dummy)?;
        report.collapsed_dummies += 1;
    }

    if config.unify_start_end {
        unify_start_events(&mut net, &report.parallel_groups)?;
        unify_end_events(&mut net, &report.parallel_groups)?;
    }
    if config.merge_consecutive_gates {
        report.merged_gates = merge_consecutive_gates(&mut net)?;
    }

    tracing::info!(
        loop_rewrites = report.loop_rewrites,
        split_gates = report.split_gates,
        merge_gates = report.merge_gates,
        warnings = report.warnings.len(),
        "mined network with {} nodes and {} edges",
        net.node_count(),
        net.edge_count()
    );
    Ok((net, report))
}

///
/// Put a single synthetic start gate in front of multiple start events
///
/// The gate is AND if the start events form a registered parallel group, XOR otherwise.
/// Edges to the former start events are weighted with their counts.
/// Returns the name of the new gate, or `None` if there was at most one start event.
///
pub fn unify_start_events(
    net: &mut Network,
    parallel_groups: &ParallelGroups,
) -> Result<Option<String>, NetworkError> {
    let start_events = net.get_start_events();
    if start_events.len() <= 1 {
        return Ok(None);
    }
    let kind = if parallel_groups.contains(&start_events) {
        GateKind::And
    } else {
        GateKind::Xor
    };
    let gate = net.unique_name(START_SPLIT_GATE);
    net.insert_node(
        gate.as_str(),
        NodeWeight::Infinite,
        NodeType::Gate {
            kind,
            function: GateFunction::Split,
        },
    )?
    .is_start = true;

    for event in &start_events {
        let node = net.get_node_mut(event)?;
        node.is_start = false;
        let weight = node.weight.count().unwrap_or_default();
        net.add_edge(&gate, event, weight)?;
    }
    tracing::debug!(%gate, events = start_events.len(), "unified start events");
    net.validate_structure()?;
    Ok(Some(gate))
}

///
/// Put a single synthetic end gate behind multiple end events
///
/// Mirror of [`unify_start_events`].
///
pub fn unify_end_events(
    net: &mut Network,
    parallel_groups: &ParallelGroups,
) -> Result<Option<String>, NetworkError> {
    let end_events = net.get_end_events();
    if end_events.len() <= 1 {
        return Ok(None);
    }
    let kind = if parallel_groups.contains(&end_events) {
        GateKind::And
    } else {
        GateKind::Xor
    };
    let gate = net.unique_name(END_MERGE_GATE);
    net.insert_node(
        gate.as_str(),
        NodeWeight::Infinite,
        NodeType::Gate {
            kind,
            function: GateFunction::Merge,
        },
    )?
    .is_end = true;

    for event in &end_events {
        let node = net.get_node_mut(event)?;
        node.is_end = false;
        let weight = node.weight.count().unwrap_or_default();
        net.add_edge(event, &gate, weight)?;
    }
    tracing::debug!(%gate, events = end_events.len(), "unified end events");
    net.validate_structure()?;
    Ok(Some(gate))
}
