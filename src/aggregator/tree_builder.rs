//! Link the edges of one trace into a nested call tree.
//!
//! An edge's callee is the caller of its children, so a node's children
//! are all edges whose `caller` equals that node's `span`.
//!
//! Example, edges in arrival order:
//! ```text
//! a->b, b->c, b->d, null->a
//! ```
//! gives `a` at the root, `b` below it, and `d`, `c` below `b`.
//!
//! A span called from two places appears once under each caller. Only a
//! span that calls back into one of its own ancestors is rejected.

use crate::output::json::result_to_line;
use crate::parser::schema::{CallNode, Edge, TraceResult};
use crate::utils::config::ROOT_CALLER;
use crate::utils::error::{TraceError, TreeError};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Build the call tree for a group of edges sharing one trace id
///
/// **Public** - main entry point for tree building
///
/// # Algorithm
/// 1. Index edges by caller, walking the group from last to first, so
///    siblings end up newest-first
/// 2. Pick the root: the first edge called by `"null"`, otherwise the
///    first indexed edge under the group's first caller
/// 3. Resolve children depth-first, refusing to expand a span that is
///    already on the path from the root
///
/// # Errors
/// * `TreeError::EmptyGroup` - no edges
/// * `TreeError::Cycle` - a span is its own ancestor
pub fn build_tree(edges: &[Edge]) -> Result<CallNode, TreeError> {
    let first = edges.first().ok_or(TreeError::EmptyGroup)?;

    let by_caller = index_by_caller(edges);

    let root_edge = match by_caller.get(ROOT_CALLER) {
        Some(roots) => roots[0],
        None => {
            debug!(
                "No root edge in trace {}, falling back to caller {}",
                first.trace_id, first.caller
            );
            by_caller[first.caller.as_str()][0]
        }
    };

    let mut path = HashSet::new();
    build_node(root_edge, &by_caller, &mut path)
}

/// Build the tree for one trace and serialize it to a single JSON line
///
/// **Public** - called once per dispatched trace
///
/// # Arguments
/// * `id` - Identifier written in the `id` field
/// * `edges` - All edges of the trace, in arrival order
///
/// # Errors
/// * `TraceError::Tree` - the edges cannot be linked into a tree
/// * `TraceError::Serialization` - JSON encoding failed
pub fn render_trace(id: String, edges: &[Edge]) -> Result<String, TraceError> {
    let root = build_tree(edges)?;
    let result = TraceResult { id, root };
    Ok(result_to_line(&result)?)
}

/// Map each caller span to the edges it called, newest first
///
/// **Private** - internal helper for build_tree
fn index_by_caller(edges: &[Edge]) -> HashMap<&str, Vec<&Edge>> {
    let mut by_caller: HashMap<&str, Vec<&Edge>> = HashMap::new();

    for edge in edges.iter().rev() {
        by_caller.entry(edge.caller.as_str()).or_default().push(edge);
    }

    by_caller
}

/// Turn an edge into a node and recursively attach its children
///
/// **Private** - internal helper for build_tree
///
/// `path` holds the spans between the root and `edge`; each span leaves it
/// again once its subtree is done.
fn build_node<'a>(
    edge: &'a Edge,
    by_caller: &HashMap<&'a str, Vec<&'a Edge>>,
    path: &mut HashSet<&'a str>,
) -> Result<CallNode, TreeError> {
    let span = edge.callee.as_str();
    if !path.insert(span) {
        return Err(TreeError::Cycle {
            span: span.to_string(),
        });
    }

    let mut node = CallNode::from_edge(edge);

    if let Some(children) = by_caller.get(span) {
        node.children = children
            .iter()
            .map(|&child| build_node(child, by_caller, path))
            .collect::<Result<Vec<_>, _>>()?;
    }

    path.remove(span);
    Ok(node)
}
