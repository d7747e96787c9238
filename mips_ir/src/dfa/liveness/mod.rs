//! Liveness Analysis
//!
//! Classic backward data-flow over the instruction-level flow graph:
//!
//! ```text
//! in[n]  = use[n] ∪ (out[n] − def[n])
//! out[n] = ⋃ in[s] for every successor s of n
//! ```
//!
//! The equations are iterated over all nodes, in the graph's node order, until a whole pass
//! changes nothing. Precoloured registers are treated like any other temporary.


mod set;

pub use set::{Iter, LiveSet};

use crate::flow::{FlowGraph, NodeId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeLiveness {
    pub live_in: LiveSet,
    pub live_out: LiveSet,
}

#[derive(Debug, Clone, Default)]
pub struct LiveSets {
    sets: BTreeMap<NodeId, NodeLiveness>,
    passes: usize,
}

impl std::ops::Index<NodeId> for LiveSets {
    type Output = NodeLiveness;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.sets[&index]
    }
}

impl LiveSets {
    pub fn build_from(graph: &FlowGraph) -> Self {
        LiveSetsBuilder::new(graph).build()
    }

    pub fn live_in(&self, node: NodeId) -> &LiveSet {
        &self[node].live_in
    }

    pub fn live_out(&self, node: NodeId) -> &LiveSet {
        &self[node].live_out
    }

    /// Number of passes over the graph it took to reach the fixed point, including the final
    /// pass that changed nothing.
    pub fn passes(&self) -> usize {
        self.passes
    }
}

struct LiveSetsBuilder<'g, 'i> {
    graph: &'g FlowGraph<'i>,
    uses: BTreeMap<NodeId, LiveSet>,
    defs: BTreeMap<NodeId, LiveSet>,
    live_sets: LiveSets,
}

impl<'g, 'i> LiveSetsBuilder<'g, 'i> {
    fn new(graph: &'g FlowGraph<'i>) -> Self {
        Self {
            graph,
            uses: graph
                .nodes()
                .map(|node| (node, graph.uses(node).iter().copied().collect()))
                .collect(),
            defs: graph
                .nodes()
                .map(|node| (node, graph.def(node).iter().copied().collect()))
                .collect(),
            live_sets: LiveSets {
                sets: graph
                    .nodes()
                    .map(|node| (node, NodeLiveness::default()))
                    .collect(),
                passes: 0,
            },
        }
    }

    fn build(mut self) -> LiveSets {
        loop {
            self.live_sets.passes += 1;
            let mut changed = false;
            for node in self.graph.nodes() {
                let live_in = self.uses[&node]
                    .union(&self.live_sets[node].live_out.difference(&self.defs[&node]));
                let live_out = self.graph.succs(node).iter().fold(
                    LiveSet::new(),
                    |mut out, succ| {
                        out.union_in_place(&self.live_sets[*succ].live_in);
                        out
                    },
                );

                let sets = self
                    .live_sets
                    .sets
                    .get_mut(&node)
                    .unwrap_or_else(|| panic!("ICE: no live sets for node {node:?}"));
                if sets.live_in != live_in || sets.live_out != live_out {
                    changed = true;
                    *sets = NodeLiveness { live_in, live_out };
                }
            }
            if !changed {
                break;
            }
        }
        log::debug!(
            "liveness of {} nodes converged after {} passes",
            self.graph.len(),
            self.live_sets.passes
        );
        self.live_sets
    }
}
