//! Intermediate representation trees.
//!
//! The tree language is the interface between translation and instruction selection: an
//! expression computes a value, a statement performs side effects and control flow. Trees own
//! their children; temporaries and labels are cheap shared identifiers.

mod print;
mod temp;
mod tree;

#[cfg(test)]
mod test;

pub use temp::{Label, Temp, TempFactory};
pub use tree::{BinOp, Exp, RelOp, Stm};
