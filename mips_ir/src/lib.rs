//! The MIPS target: registers, activation records, selected instructions and the analyses run
//! over them.

mod instruction;
mod outputter;
mod reg;

pub mod dfa;
pub mod flow;
pub mod frame;

pub use frame::{Access, Fragment, Frame};
pub use instruction::{instr, Instr};
pub use outputter::*;
pub use reg::{temp_factory, temp_name, Reg};
