//! Data-flow analyses over a [`FlowGraph`](crate::flow::FlowGraph).

pub mod liveness;
