pub use mips_ir::flow::UnresolvedJumps;

#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Print registers as `$sp` instead of `$29`.
    pub use_register_names: bool,
    /// What the flow-graph builder does with a jump to a label that isn't in the procedure.
    pub unresolved_jumps: UnresolvedJumps,
}
