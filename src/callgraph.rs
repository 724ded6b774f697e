//! Caller-to-callee relation maintained alongside the IR.
//!
//! The graph is optional for every pass that takes one; hosts that do not
//! track call edges simply pass `None` and all maintenance degrades to a
//! no-op. Edges carry multiplicity: one entry per call site.

use std::collections::HashMap;

use crate::ir::{LocalDefs, Module, StatementKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct CallGraphNode {
    pub function: String,
    pub callees: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    nodes: Vec<CallGraphNode>,
    index: HashMap<String, NodeId>,
}

impl CallGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a module: one node per function, one edge per
    /// call whose callee resolves to a named function.
    #[must_use]
    pub fn from_module(module: &Module) -> Self {
        let mut graph = Self::new();
        for function in &module.functions {
            graph.get_or_insert(&function.name);
        }
        for function in &module.functions {
            let Some(body) = &function.body else {
                continue;
            };
            let caller = graph.get_or_insert(&function.name);
            let defs = LocalDefs::collect(body);
            for block in &body.blocks {
                for statement in &block.statements {
                    let StatementKind::Call(call) = &statement.kind else {
                        continue;
                    };
                    if let Some(callee) = defs.resolved_callee(&call.callee) {
                        let callee_node = graph.get_or_insert(callee);
                        graph.add_edge(caller, callee_node);
                    }
                }
            }
        }
        graph
    }

    #[must_use]
    pub fn node(&self, function: &str) -> Option<NodeId> {
        self.index.get(function).copied()
    }

    #[must_use]
    pub fn function(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|n| n.function.as_str())
    }

    pub fn get_or_insert(&mut self, function: &str) -> NodeId {
        if let Some(node) = self.node(function) {
            return node;
        }
        let node = NodeId(self.nodes.len());
        self.nodes.push(CallGraphNode {
            function: function.to_string(),
            callees: Vec::new(),
        });
        self.index.insert(function.to_string(), node);
        node
    }

    pub fn add_edge(&mut self, caller: NodeId, callee: NodeId) {
        if let Some(node) = self.nodes.get_mut(caller.0) {
            node.callees.push(callee);
        }
    }

    /// Remove one instance of the `caller -> callee` edge, if present.
    pub fn remove_edge(&mut self, caller: NodeId, callee: NodeId) {
        if let Some(node) = self.nodes.get_mut(caller.0) {
            if let Some(position) = node.callees.iter().position(|c| *c == callee) {
                node.callees.remove(position);
            }
        }
    }

    #[must_use]
    pub fn callees(&self, caller: NodeId) -> &[NodeId] {
        self.nodes
            .get(caller.0)
            .map_or(&[], |node| node.callees.as_slice())
    }

    /// Number of `caller -> callee` edges, counting multiplicity.
    #[must_use]
    pub fn edge_count(&self, caller: NodeId, callee: NodeId) -> usize {
        self.callees(caller).iter().filter(|c| **c == callee).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
