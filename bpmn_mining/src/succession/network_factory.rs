use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::succession_struct::SuccessionRelation;
use crate::network::error::{MiningWarning, NetworkError};
use crate::network::network_struct::Network;

/// How start and end events of a newly built [`Network`] are determined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryDetection {
    /// Use the start/end activities recorded in the [`SuccessionRelation`]
    #[default]
    FromRelation,
    /// Nodes without predecessors are start events, nodes without successors end events
    Autodetect,
    /// Do not mark any start/end events
    Unmarked,
}

///
/// Build a [`Network`] from a [`SuccessionRelation`]
///
/// One event node per distinct activity (weighted with its count, 0 if not counted) and one
/// weighted edge per succession with a non-zero count.
///
/// With [`BoundaryDetection::FromRelation`], a listed start activity that has predecessors
/// (or end activity that has successors) is not marked and reported as [`MiningWarning`].
/// Listed activities that do not occur at all fail with [`NetworkError::MissingNode`].
///
pub fn build_network(
    relation: &SuccessionRelation,
    detection: BoundaryDetection,
) -> Result<(Network, Vec<MiningWarning>), NetworkError> {
    let mut network = Network::new();
    let mut warnings = Vec::new();

    for activity in relation.all_activities() {
        let count = relation.activities.get(activity).copied().unwrap_or(0);
        network.add_node(activity, count);
    }
    for ((from, to), count) in &relation.successions {
        if *count > 0 {
            network.add_edge(from, to, *count)?;
        }
    }

    match detection {
        BoundaryDetection::FromRelation => {
            let starts: BTreeSet<&String> = relation.start_activities.iter().collect();
            for start in starts {
                let node = network.get_node_mut(start)?;
                if node.predecessors().is_empty() {
                    node.is_start = true;
                } else {
                    warnings.push(MiningWarning::StartEventHasPredecessors {
                        event: start.clone(),
                    });
                }
            }
            let ends: BTreeSet<&String> = relation.end_activities.iter().collect();
            for end in ends {
                let node = network.get_node_mut(end)?;
                if node.successors().is_empty() {
                    node.is_end = true;
                } else {
                    warnings.push(MiningWarning::EndEventHasSuccessors { event: end.clone() });
                }
            }
        }
        BoundaryDetection::Autodetect => {
            network.autodetect_start_nodes(true);
            network.autodetect_end_nodes(true);
        }
        BoundaryDetection::Unmarked => {}
    }

    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    network.validate_structure()?;
    Ok((network, warnings))
}

impl Network {
    /// Build a [`Network`] from a [`SuccessionRelation`]
    ///
    /// See [`build_network`], which additionally returns the collected warnings.
    pub fn from_succession_relation(
        relation: &SuccessionRelation,
        detection: BoundaryDetection,
    ) -> Result<Network, NetworkError> {
        build_network(relation, detection).map(|(network, _)| network)
    }
}
