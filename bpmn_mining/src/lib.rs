#![warn(
    clippy::doc_markdown,
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs
)]

#![doc = include_str!("../README.md")]

///
/// Process network of events, gates and helper nodes
///
pub mod network {
    /// Fatal errors and recoverable warnings
    pub mod error;
    /// [`Network`](crate::Network) struct with [`Node`](crate::Node)s and [`Edge`](crate::Edge)s
    pub mod network_struct;
    /// Structural rewrites: collapsing nodes and splicing in dummies
    pub mod rewrites;
    /// Threshold filters and purging of filtered out items
    pub mod filters;
    #[cfg(feature = "graphviz-export")]
    /// Export [`Network`](crate::Network) to images (SVG, PNG, ...)
    ///
    /// __Requires the `graphviz-export` feature to be enabled__
    ///
    /// Also requires an active graphviz installation in the PATH.
    /// See also <https://github.com/besok/graphviz-rust?tab=readme-ov-file#caveats> and <https://graphviz.org/download/>
    pub mod image_export;
}

///
/// Direct succession relations (input of mining)
///
pub mod succession {
    /// [`SuccessionRelation`](crate::SuccessionRelation) struct
    pub mod succession_struct;
    /// Building a [`Network`](crate::Network) from a [`SuccessionRelation`](crate::SuccessionRelation)
    pub mod network_factory;
}

///
/// Alpha miner: discovering AND/XOR gates in a [`Network`](crate::Network)
///
pub mod alpha {
    /// Causality and parallelism between nodes
    pub mod causality;
    /// Folding directly connected gates
    pub mod consecutive_gates;
    /// Full alpha miner
    pub mod full;
    /// Inserting split and merge gates
    pub mod gates;
    /// Detecting and rewriting self-loops, short loops and two-loops
    pub mod loops;
}

#[doc(inline)]
pub use network::network_struct::{
    Edge, GateFunction, GateKind, Network, Node, NodeType, NodeWeight,
};

#[doc(inline)]
pub use network::error::{MiningWarning, NetworkError};

#[doc(inline)]
pub use network::filters::{filter_edges, filter_events};

#[cfg(feature = "graphviz-export")]
#[doc(inline)]
pub use network::image_export::export_network_image_png;

#[cfg(feature = "graphviz-export")]
#[doc(inline)]
pub use network::image_export::export_network_image_svg;

#[doc(inline)]
pub use succession::succession_struct::SuccessionRelation;

#[doc(inline)]
pub use succession::network_factory::{build_network, BoundaryDetection};

#[doc(inline)]
pub use alpha::causality::CausalityMap;

#[doc(inline)]
pub use alpha::gates::GateInsertion;

#[doc(inline)]
pub use alpha::consecutive_gates::merge_consecutive_gates;

#[doc(inline)]
pub use alpha::full::{
    alpha_mine, alpha_mine_with_config, AlphaMinerConfig, MiningReport, ParallelGroups,
};
