use serde::Serialize;

///
/// Fatal errors of network operations
///
/// Any of these leaves the operation aborted: the network must not be trusted afterwards.
///
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// A referenced node does not exist
    #[error("node `{0}` does not exist")]
    MissingNode(String),
    /// A referenced edge does not exist
    #[error("edge `{from}` -> `{to}` does not exist")]
    MissingEdge {
        /// Source node name
        from: String,
        /// Target node name
        to: String,
    },
    /// A node with this name already exists
    #[error("node `{0}` already exists")]
    DuplicateNode(String),
    /// Adjacency sets and the edge table disagree, or a structural constraint is broken
    #[error("network invariant violated: {0}")]
    InvariantViolation(String),
    /// An operation was called on a node that does not satisfy its precondition
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),
}

///
/// Recoverable data-shape mismatches
///
/// These are reported to the caller (and logged) while processing continues.
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "type")]
pub enum MiningWarning {
    /// A requested split gate target is not a direct successor of the gate's source
    #[error("`{to}` is not a successor of `{from}` when creating `{gate}`, skipping")]
    SplitTargetNotAdjacent {
        /// Name of the gate being created
        gate: String,
        /// Source of the split
        from: String,
        /// Skipped target
        to: String,
    },
    /// A requested merge gate source is not a direct predecessor of the gate's target
    #[error("`{from}` is not a predecessor of `{to}` when creating `{gate}`, skipping")]
    MergeSourceNotAdjacent {
        /// Name of the gate being created
        gate: String,
        /// Skipped source
        from: String,
        /// Target of the merge
        to: String,
    },
    /// Two nodes were expected to be parallel but are not
    #[error("`{first}` and `{second}` are not parallel, nothing to do")]
    NotParallel {
        /// First node
        first: String,
        /// Second node
        second: String,
    },
    /// A start event named by the succession relation has predecessors in the network
    #[error("`{event}` is listed as start event but has predecessors, not marking it")]
    StartEventHasPredecessors {
        /// Skipped start event
        event: String,
    },
    /// An end event named by the succession relation has successors in the network
    #[error("`{event}` is listed as end event but has successors, not marking it")]
    EndEventHasSuccessors {
        /// Skipped end event
        event: String,
    },
}
