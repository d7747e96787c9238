pub mod mips;
pub mod select;

pub use mips::{codegen, PATTERNS};
pub use select::{ExpTile, Pattern, Selector, StmTile};
