//! Control-flow graph over a selected instruction list.
//!
//! Every instruction except labels becomes a node. A node's successors are the instructions its
//! jump targets resolve to or, if it doesn't jump, the next instruction.


use crate::Instr;
use generational_arena::{Arena, Index as ArenaIndex};
use std::collections::HashMap;
use thiserror::Error;
use tree_ir::{Label, Temp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(ArenaIndex);

/// What to do with a jump to a label that isn't defined in the instruction list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnresolvedJumps {
    #[default]
    Reject,
    /// Leave out the edge.
    Ignore,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("`{instr}` jumps to label `{label}`, which isn't defined")]
    UnresolvedLabel { label: Label, instr: String },
}

#[derive(Debug)]
struct Node<'i> {
    instr: &'i Instr,
    succs: Vec<NodeId>,
    preds: Vec<NodeId>,
}

#[derive(Debug)]
pub struct FlowGraph<'i> {
    nodes: Arena<Node<'i>>,
    /// Node ids in creation order.
    order: Vec<NodeId>,
    /// Maps an instruction's index in the list to its node.
    by_instr: HashMap<usize, NodeId>,
}

impl<'i> FlowGraph<'i> {
    pub fn build(instrs: &'i [Instr], unresolved: UnresolvedJumps) -> Result<Self, FlowError> {
        FlowGraphBuilder::new(instrs).build(unresolved)
    }

    /// Nodes in the order they were created.
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The node of the instruction at `index` in the list, `None` for labels.
    pub fn node_of(&self, index: usize) -> Option<NodeId> {
        self.by_instr.get(&index).copied()
    }

    pub fn instr(&self, node: NodeId) -> &'i Instr {
        self.nodes[node.0].instr
    }

    pub fn succs(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].succs
    }

    pub fn preds(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].preds
    }

    pub fn def(&self, node: NodeId) -> &'i [Temp] {
        self.instr(node).defs()
    }

    pub fn uses(&self, node: NodeId) -> &'i [Temp] {
        self.instr(node).uses()
    }

    pub fn is_move(&self, node: NodeId) -> bool {
        self.instr(node).is_move()
    }
}

struct FlowGraphBuilder<'i> {
    instrs: &'i [Instr],
    graph: FlowGraph<'i>,
}

impl<'i> FlowGraphBuilder<'i> {
    fn new(instrs: &'i [Instr]) -> Self {
        Self {
            instrs,
            graph: FlowGraph {
                nodes: Arena::with_capacity(instrs.len()),
                order: Vec::with_capacity(instrs.len()),
                by_instr: HashMap::with_capacity(instrs.len()),
            },
        }
    }

    fn build(mut self, unresolved: UnresolvedJumps) -> Result<FlowGraph<'i>, FlowError> {
        let instrs = self.instrs;
        let (real, targets) = self.resolve_labels();

        for (pos, &index) in real.iter().enumerate() {
            let node = self.node(index);
            match instrs[index].jumps() {
                Some(jumps) => {
                    for label in jumps.iter() {
                        match targets.get(label) {
                            Some(Some(target)) => {
                                let target = self.node(*target);
                                self.add_edge(node, target);
                            }
                            // The label ends the list: a jump out of the procedure.
                            Some(None) => {}
                            None => match unresolved {
                                UnresolvedJumps::Reject => {
                                    return Err(FlowError::UnresolvedLabel {
                                        label: label.clone(),
                                        instr: instrs[index].assem().to_owned(),
                                    })
                                }
                                UnresolvedJumps::Ignore => {
                                    log::warn!("ignoring jump to undefined label `{label}`")
                                }
                            },
                        }
                    }
                }
                None => {
                    if let Some(&next) = real.get(pos + 1) {
                        let next = self.node(next);
                        self.add_edge(node, next);
                    }
                }
            }
        }

        log::debug!(
            "built flow graph with {} nodes from {} instructions",
            self.graph.len(),
            instrs.len()
        );
        Ok(self.graph)
    }

    /// Returns the indices of the non-label instructions, and for every label the index of the
    /// first non-label instruction at or after it (`None` if there is none).
    fn resolve_labels(&self) -> (Vec<usize>, HashMap<&'i Label, Option<usize>>) {
        let instrs = self.instrs;
        let mut real = Vec::with_capacity(instrs.len());
        let mut targets = HashMap::new();
        let mut pending = Vec::new();
        for (index, instr) in instrs.iter().enumerate() {
            match instr {
                Instr::Label { label, .. } => pending.push(label),
                _ => {
                    for label in pending.drain(..) {
                        targets.insert(label, Some(index));
                    }
                    real.push(index);
                }
            }
        }
        for label in pending {
            targets.insert(label, None);
        }
        (real, targets)
    }

    fn node(&mut self, index: usize) -> NodeId {
        if let Some(&node) = self.graph.by_instr.get(&index) {
            return node;
        }
        let instrs = self.instrs;
        let node = NodeId(self.graph.nodes.insert(Node {
            instr: &instrs[index],
            succs: Vec::new(),
            preds: Vec::new(),
        }));
        self.graph.order.push(node);
        self.graph.by_instr.insert(index, node);
        node
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId) {
        if self.graph.nodes[from.0].succs.contains(&to) {
            return;
        }
        self.graph.nodes[from.0].succs.push(to);
        self.graph.nodes[to.0].preds.push(from);
    }
}
