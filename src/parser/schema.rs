//! Data model shared by the parser, tree builder and output writers.
//!
//! `Edge` is the parsed form of one log line. `CallNode` and
//! `TraceResult` define the JSON objects we emit, one per line.

use crate::utils::config::ROOT_CALLER;
use serde::{Deserialize, Serialize};

/// One observed caller->callee call, parsed from a single log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Identifier shared by every edge of one end-to-end request
    pub trace_id: String,

    /// Start timestamp, reformatted as `YYYY-MM-DD hh:mm:ss.sss`
    pub start: String,

    /// End timestamp, same format as `start`
    pub end: String,

    /// Service that issued the call
    pub service: String,

    /// Span of the calling side (`"null"` for the trace entry point)
    pub caller: String,

    /// Span of the called side
    pub callee: String,
}

impl Edge {
    /// True when this edge is the entry point of its trace
    pub fn is_root(&self) -> bool {
        self.caller == ROOT_CALLER
    }
}

/// A node of a reconstructed call tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallNode {
    pub start: String,
    pub end: String,
    pub service: String,

    /// Callee span of the edge this node was built from; children are
    /// the edges whose caller equals this value
    pub span: String,

    #[serde(rename = "calls")]
    pub children: Vec<CallNode>,
}

impl CallNode {
    /// Leaf node for an edge; children are linked by the tree builder
    pub fn from_edge(edge: &Edge) -> Self {
        Self {
            start: edge.start.clone(),
            end: edge.end.clone(),
            service: edge.service.clone(),
            span: edge.callee.clone(),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including this one
    pub fn call_count(&self) -> usize {
        1 + self.children.iter().map(CallNode::call_count).sum::<usize>()
    }

    /// Length of the longest root-to-leaf path, a lone node has depth 1
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(CallNode::depth).max().unwrap_or(0)
    }
}

/// The unit written to the completed and orphan outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceResult {
    pub id: String,
    pub root: CallNode,
}
