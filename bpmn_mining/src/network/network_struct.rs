use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use petgraph::graph::NodeIndex;
use petgraph::Graph;
use serde::{Deserialize, Serialize};

use super::error::NetworkError;

/// Type of a gate node: which of its branches are taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GateKind {
    /// All branches are taken (parallel)
    And,
    /// Exactly one branch is taken (exclusive choice)
    Xor,
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateKind::And => write!(f, "AND"),
            GateKind::Xor => write!(f, "XOR"),
        }
    }
}

/// Role of a gate node in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GateFunction {
    /// One inbound flow is routed into multiple branches
    Split,
    /// Multiple branches are combined into one outbound flow
    Merge,
    /// Gate created while rewriting a loop motif
    LoopGate,
    /// Unspecified
    Any,
}

/// Type of a [`Node`]
///
/// Gate attributes only exist on gate nodes, so an event can never carry a gate kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Activity observed in the event log
    Event,
    /// Synthetic gate
    Gate {
        /// AND or XOR
        kind: GateKind,
        /// Split, merge, ...
        function: GateFunction,
    },
    /// Non-semantic placeholder, removed again before mining finishes
    Dummy,
}

impl NodeType {
    /// Is this an [`NodeType::Event`]?
    pub fn is_event(&self) -> bool {
        matches!(self, NodeType::Event)
    }

    /// Is this a [`NodeType::Gate`]?
    pub fn is_gate(&self) -> bool {
        matches!(self, NodeType::Gate { .. })
    }

    /// Is this a [`NodeType::Dummy`]?
    pub fn is_dummy(&self) -> bool {
        matches!(self, NodeType::Dummy)
    }

    /// Is this a gate with [`GateFunction::LoopGate`]?
    pub fn is_loop_gate(&self) -> bool {
        matches!(
            self,
            NodeType::Gate {
                function: GateFunction::LoopGate,
                ..
            }
        )
    }

    /// Gate kind, if this is a gate
    pub fn gate_kind(&self) -> Option<GateKind> {
        match self {
            NodeType::Gate { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Gate function, if this is a gate
    pub fn gate_function(&self) -> Option<GateFunction> {
        match self {
            NodeType::Gate { function, .. } => Some(*function),
            _ => None,
        }
    }
}

/// Weight (occurrence count) of a [`Node`]
///
/// Gates are [`NodeWeight::Infinite`] so no threshold ever filters them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeWeight {
    /// Finite count
    Count(u64),
    /// Larger than every count
    Infinite,
}

impl NodeWeight {
    /// The finite count, if any
    pub fn count(&self) -> Option<u64> {
        match self {
            NodeWeight::Count(c) => Some(*c),
            NodeWeight::Infinite => None,
        }
    }

    /// Is the weight strictly below `threshold`?
    pub fn is_below(&self, threshold: u64) -> bool {
        match self {
            NodeWeight::Count(c) => *c < threshold,
            NodeWeight::Infinite => false,
        }
    }
}

impl Default for NodeWeight {
    fn default() -> Self {
        NodeWeight::Count(0)
    }
}

impl fmt::Display for NodeWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeWeight::Count(c) => write!(f, "{c}"),
            NodeWeight::Infinite => write!(f, "inf"),
        }
    }
}

/// Node of a [`Network`]
///
/// Neighbours are only referenced by name and resolved through the owning [`Network`].
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    /// Occurrence count
    pub weight: NodeWeight,
    /// Event, gate or dummy
    pub node_type: NodeType,
    /// Marked as start event (must not have predecessors)
    pub is_start: bool,
    /// Marked as end event (must not have successors)
    pub is_end: bool,
    /// Marked for deletion by [`Network::delete_filtered_out_items`]
    pub is_filtered_out: bool,
    predecessors: BTreeSet<String>,
    successors: BTreeSet<String>,
}

impl Node {
    fn new(name: String, weight: NodeWeight, node_type: NodeType) -> Self {
        Self {
            name,
            weight,
            node_type,
            is_start: false,
            is_end: false,
            is_filtered_out: false,
            predecessors: BTreeSet::new(),
            successors: BTreeSet::new(),
        }
    }

    /// Unique name of the node
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of all direct predecessors
    pub fn predecessors(&self) -> &BTreeSet<String> {
        &self.predecessors
    }

    /// Names of all direct successors
    pub fn successors(&self) -> &BTreeSet<String> {
        &self.successors
    }

    /// Is this node its own successor?
    pub fn has_self_edge(&self) -> bool {
        self.successors.contains(&self.name)
    }

    /// Predecessors without the node itself
    pub fn foreign_predecessors(&self) -> BTreeSet<String> {
        self.predecessors
            .iter()
            .filter(|p| **p != self.name)
            .cloned()
            .collect()
    }

    /// Successors without the node itself
    pub fn foreign_successors(&self) -> BTreeSet<String> {
        self.successors
            .iter()
            .filter(|s| **s != self.name)
            .cloned()
            .collect()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.weight)
    }
}

/// Directed, weighted edge of a [`Network`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    from: String,
    to: String,
    /// Number of observed direct successions
    pub weight: u64,
    /// Marked for deletion by [`Network::delete_filtered_out_items`]
    pub is_filtered_out: bool,
}

impl Edge {
    /// Source node name
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Target node name
    pub fn to(&self) -> &str {
        &self.to
    }
}

///
/// Process network of [`Node`]s and [`Edge`]s
///
/// Nodes live in an arena keyed by name, edges in a table keyed by `(from, to)`.
/// The edge table is the source of truth; each node additionally stores the names of its
/// neighbours. Both are kept in sync by every mutation and checked by
/// [`Network::validate_structure`].
///
/// Iteration over nodes and edges is ordered by name, so all algorithms on a network are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    nodes: BTreeMap<String, Node>,
    edges: BTreeMap<(String, String), Edge>,
}

impl Network {
    /// Create new [`Network`] with no nodes and edges
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterate over all nodes (ordered by name)
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Names of all nodes (ordered)
    pub fn node_names(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    /// Iterate over all edges (ordered by source, then target)
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Checks if a node is contained in the network
    pub fn contains_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Checks if the edge `from -> to` is contained in the network
    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        self.edges.contains_key(&(from.to_string(), to.to_string()))
    }

    /// Get a node by name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Get a node by name, mutably
    ///
    /// Adjacency cannot be changed through the returned reference.
    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.get_mut(name)
    }

    /// Get a node by name or fail with [`NetworkError::MissingNode`]
    pub fn get_node(&self, name: &str) -> Result<&Node, NetworkError> {
        self.nodes
            .get(name)
            .ok_or_else(|| NetworkError::MissingNode(name.to_string()))
    }

    /// Get a node by name, mutably, or fail with [`NetworkError::MissingNode`]
    pub fn get_node_mut(&mut self, name: &str) -> Result<&mut Node, NetworkError> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| NetworkError::MissingNode(name.to_string()))
    }

    /// Get the edge `from -> to`
    pub fn edge(&self, from: &str, to: &str) -> Option<&Edge> {
        self.edges.get(&(from.to_string(), to.to_string()))
    }

    /// Get the edge `from -> to`, mutably
    pub fn edge_mut(&mut self, from: &str, to: &str) -> Option<&mut Edge> {
        self.edges.get_mut(&(from.to_string(), to.to_string()))
    }

    /// Weight of the edge `from -> to` or [`NetworkError::MissingEdge`]
    pub fn edge_weight(&self, from: &str, to: &str) -> Result<u64, NetworkError> {
        self.edge(from, to)
            .map(|e| e.weight)
            .ok_or_else(|| NetworkError::MissingEdge {
                from: from.to_string(),
                to: to.to_string(),
            })
    }

    /// Add an event node with the given count
    ///
    /// If a node with that name already exists, it is left untouched and returned.
    pub fn add_node<S: Into<String>>(&mut self, name: S, weight: u64) -> &mut Node {
        let name = name.into();
        self.nodes
            .entry(name.clone())
            .or_insert_with(|| Node::new(name, NodeWeight::Count(weight), NodeType::Event))
    }

    /// Add a node of any [`NodeType`]
    ///
    /// Fails with [`NetworkError::DuplicateNode`] if the name is already taken.
    pub fn insert_node<S: Into<String>>(
        &mut self,
        name: S,
        weight: NodeWeight,
        node_type: NodeType,
    ) -> Result<&mut Node, NetworkError> {
        let name = name.into();
        if self.nodes.contains_key(&name) {
            return Err(NetworkError::DuplicateNode(name));
        }
        Ok(self
            .nodes
            .entry(name.clone())
            .or_insert_with(|| Node::new(name, weight, node_type)))
    }

    /// Add a directed edge `from -> to` with a weight
    ///
    /// Both endpoints have to exist. An existing edge is replaced.
    pub fn add_edge(&mut self, from: &str, to: &str, weight: u64) -> Result<(), NetworkError> {
        if !self.nodes.contains_key(from) {
            return Err(NetworkError::MissingNode(from.to_string()));
        }
        if !self.nodes.contains_key(to) {
            return Err(NetworkError::MissingNode(to.to_string()));
        }
        self.link(from, to);
        self.edges.insert(
            (from.to_string(), to.to_string()),
            Edge {
                from: from.to_string(),
                to: to.to_string(),
                weight,
                is_filtered_out: false,
            },
        );
        Ok(())
    }

    /// Add `weight` onto the edge `from -> to` (saturating at `u64::MAX`), creating the edge if needed
    pub(crate) fn add_edge_weight(
        &mut self,
        from: &str,
        to: &str,
        weight: u64,
    ) -> Result<(), NetworkError> {
        match self.edge_mut(from, to) {
            Some(edge) => {
                edge.weight = edge.weight.saturating_add(weight);
                Ok(())
            }
            None => self.add_edge(from, to, weight),
        }
    }

    /// Remove the edge `from -> to`
    pub fn delete_edge(&mut self, from: &str, to: &str) -> Result<Edge, NetworkError> {
        let edge = self
            .edges
            .remove(&(from.to_string(), to.to_string()))
            .ok_or_else(|| NetworkError::MissingEdge {
                from: from.to_string(),
                to: to.to_string(),
            })?;
        self.unlink(from, to);
        Ok(edge)
    }

    /// Remove a node together with all its incident edges
    pub fn delete_node(&mut self, name: &str) -> Result<Node, NetworkError> {
        let node = self.get_node(name)?;
        let successors: Vec<String> = node.successors.iter().cloned().collect();
        let predecessors: Vec<String> = node.predecessors.iter().cloned().collect();
        for s in successors {
            self.delete_edge(name, &s)?;
        }
        for p in predecessors {
            // a self-edge was already removed above
            if self.contains_edge(&p, name) {
                self.delete_edge(&p, name)?;
            }
        }
        self.nodes
            .remove(name)
            .ok_or_else(|| NetworkError::MissingNode(name.to_string()))
    }

    fn link(&mut self, from: &str, to: &str) {
        if let Some(n) = self.nodes.get_mut(from) {
            n.successors.insert(to.to_string());
        }
        if let Some(n) = self.nodes.get_mut(to) {
            n.predecessors.insert(from.to_string());
        }
    }

    fn unlink(&mut self, from: &str, to: &str) {
        if let Some(n) = self.nodes.get_mut(from) {
            n.successors.remove(to);
        }
        if let Some(n) = self.nodes.get_mut(to) {
            n.predecessors.remove(from);
        }
    }

    /// A fresh node name based on `base`
    ///
    /// Returns `base` itself if it is not taken, otherwise `base#2`, `base#3`, ...
    pub(crate) fn unique_name(&self, base: &str) -> String {
        if !self.nodes.contains_key(base) {
            return base.to_string();
        }
        (2..)
            .map(|i| format!("{base}#{i}"))
            .find(|candidate| !self.nodes.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn count_events<'a>(&self, names: impl Iterator<Item = &'a String>) -> usize {
        names
            .filter(|n| {
                self.nodes
                    .get(n.as_str())
                    .is_some_and(|n| n.node_type.is_event())
            })
            .count()
    }

    /// True if node has more than one [`NodeType::Event`] successor
    ///
    /// Gate and dummy neighbours do not count as real branching.
    pub fn is_split(&self, name: &str) -> Result<bool, NetworkError> {
        let node = self.get_node(name)?;
        Ok(self.count_events(node.successors.iter()) > 1)
    }

    /// True if node has more than one [`NodeType::Event`] predecessor
    pub fn is_merge(&self, name: &str) -> Result<bool, NetworkError> {
        let node = self.get_node(name)?;
        Ok(self.count_events(node.predecessors.iter()) > 1)
    }

    /// The successor of a node that is not a split
    pub fn next(&self, name: &str) -> Result<&Node, NetworkError> {
        if self.is_split(name)? {
            return Err(NetworkError::PreconditionViolation(format!(
                "node `{name}` must have only one successor in order to use next()"
            )));
        }
        let successor = self.get_node(name)?.successors.first().ok_or_else(|| {
            NetworkError::PreconditionViolation(format!("node `{name}` has no successor"))
        })?;
        self.get_node(successor)
    }

    /// The predecessor of a node that is not a merge
    pub fn prev(&self, name: &str) -> Result<&Node, NetworkError> {
        if self.is_merge(name)? {
            return Err(NetworkError::PreconditionViolation(format!(
                "node `{name}` must have only one predecessor in order to use prev()"
            )));
        }
        let predecessor = self.get_node(name)?.predecessors.first().ok_or_else(|| {
            NetworkError::PreconditionViolation(format!("node `{name}` has no predecessor"))
        })?;
        self.get_node(predecessor)
    }

    /// Names of all nodes marked as start
    pub fn get_start_events(&self) -> BTreeSet<String> {
        self.nodes
            .values()
            .filter(|n| n.is_start)
            .map(|n| n.name.clone())
            .collect()
    }

    /// Names of all nodes marked as end
    pub fn get_end_events(&self) -> BTreeSet<String> {
        self.nodes
            .values()
            .filter(|n| n.is_end)
            .map(|n| n.name.clone())
            .collect()
    }

    /// Detects start nodes based on connections (nodes without predecessors)
    ///
    /// If `update_nodes` is true, the found nodes are marked as start.
    pub fn autodetect_start_nodes(&mut self, update_nodes: bool) -> BTreeSet<String> {
        let mut detected = BTreeSet::new();
        for node in self.nodes.values_mut() {
            if node.predecessors.is_empty() {
                detected.insert(node.name.clone());
                if update_nodes {
                    node.is_start = true;
                }
            }
        }
        detected
    }

    /// Detects end nodes based on connections (nodes without successors)
    ///
    /// If `update_nodes` is true, the found nodes are marked as end.
    pub fn autodetect_end_nodes(&mut self, update_nodes: bool) -> BTreeSet<String> {
        let mut detected = BTreeSet::new();
        for node in self.nodes.values_mut() {
            if node.successors.is_empty() {
                detected.insert(node.name.clone());
                if update_nodes {
                    node.is_end = true;
                }
            }
        }
        detected
    }

    /// Validates that the network is not corrupt
    ///
    /// Adjacency is re-derived from the edge table and compared with what every node
    /// stores. Also checks that start nodes have no predecessors and end nodes no successors.
    pub fn validate_structure(&self) -> Result<(), NetworkError> {
        let mut expected_successors: HashMap<&str, BTreeSet<&str>> = HashMap::new();
        let mut expected_predecessors: HashMap<&str, BTreeSet<&str>> = HashMap::new();
        for ((from, to), edge) in &self.edges {
            if edge.from != *from || edge.to != *to {
                return Err(violation(format!(
                    "edge {}->{} is indexed as {from}->{to}",
                    edge.from, edge.to
                )));
            }
            for endpoint in [from, to] {
                if !self.nodes.contains_key(endpoint) {
                    return Err(violation(format!(
                        "edge {from}->{to} references missing node `{endpoint}`"
                    )));
                }
            }
            expected_successors
                .entry(from.as_str())
                .or_default()
                .insert(to.as_str());
            expected_predecessors
                .entry(to.as_str())
                .or_default()
                .insert(from.as_str());
        }

        for (key, node) in &self.nodes {
            if *key != node.name {
                return Err(violation(format!(
                    "node `{}` is stored under name `{key}`",
                    node.name
                )));
            }
            let successors: BTreeSet<&str> = node.successors.iter().map(String::as_str).collect();
            let expected = expected_successors.remove(key.as_str()).unwrap_or_default();
            if successors != expected {
                return Err(violation(format!(
                    "successors of `{key}` are {successors:?}, but the edge table implies {expected:?}"
                )));
            }
            let predecessors: BTreeSet<&str> =
                node.predecessors.iter().map(String::as_str).collect();
            let expected = expected_predecessors
                .remove(key.as_str())
                .unwrap_or_default();
            if predecessors != expected {
                return Err(violation(format!(
                    "predecessors of `{key}` are {predecessors:?}, but the edge table implies {expected:?}"
                )));
            }
            if node.is_start && !node.predecessors.is_empty() {
                return Err(violation(format!(
                    "node `{key}` is marked as start, but has predecessors {:?}",
                    node.predecessors
                )));
            }
            if node.is_end && !node.successors.is_empty() {
                return Err(violation(format!(
                    "node `{key}` is marked as end, but has successors {:?}",
                    node.successors
                )));
            }
        }
        Ok(())
    }

    /// Creates a [`Graph`] (node weights: names, edge weights: counts) from the [`Network`]
    pub fn to_graph(&self) -> Graph<String, u64> {
        let mut graph: Graph<String, u64> = Graph::new();
        let mut name_to_index: HashMap<&str, NodeIndex> = HashMap::new();

        self.nodes.values().for_each(|node| {
            let index = graph.add_node(node.name.clone());
            name_to_index.insert(&node.name, index);
        });
        self.edges.values().for_each(|edge| {
            if let (Some(from), Some(to)) = (
                name_to_index.get(edge.from.as_str()),
                name_to_index.get(edge.to.as_str()),
            ) {
                graph.add_edge(*from, *to, edge.weight);
            }
        });

        graph
    }
}

fn violation(message: String) -> NetworkError {
    NetworkError::InvariantViolation(message)
}
