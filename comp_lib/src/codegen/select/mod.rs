//! Target-independent instruction selection.
//!
//! A target describes its instructions as a table of [`Pattern`]s (tiles). Selecting a tree is
//! done in two phases:
//!
//!  1. Bottom-up, every node is given the cheapest tile that matches it. A tile's total cost is
//!     its own cost plus the best costs of the operands its matcher returns. On equal cost, the
//!     tile registered first wins. Results are memoized per node in a side table.
//!  2. Top-down, the generator of the root's tile is run. It materializes its operands with
//!     [`Selector::munch_exp`], which runs the operand's chosen tile, and emits its own
//!     instructions.
//!
//! The input must be canonical: no `Seq` or `ESeq` nodes, and only `Temp` or `Mem` as `Move`
//! destinations.

#[cfg(test)]
mod test;

use mips_ir as mir;
use std::collections::HashMap;
use tree_ir::{Exp, Stm, Temp, TempFactory};

/// Returns the operands a tile reads if it matches the node, `None` otherwise.
pub type StmMatcher = for<'t> fn(&'t Stm) -> Option<Vec<&'t Exp>>;
pub type ExpMatcher = for<'t> fn(&'t Exp) -> Option<Vec<&'t Exp>>;
/// Emits the instructions of a matched tile. Gets the node and the operands its matcher
/// returned.
pub type StmGen = fn(&mut Selector, &Stm, &[&Exp]);
/// Like [`StmGen`], but returns the temporary holding the expression's value.
pub type ExpGen = fn(&mut Selector, &Exp, &[&Exp]) -> Temp;

#[derive(Clone, Copy)]
pub struct StmTile {
    pub name: &'static str,
    pub matcher: StmMatcher,
    pub gen: StmGen,
    pub cost: u32,
}

#[derive(Clone, Copy)]
pub struct ExpTile {
    pub name: &'static str,
    pub matcher: ExpMatcher,
    pub gen: ExpGen,
    pub cost: u32,
}

#[derive(Clone, Copy)]
pub enum Pattern {
    Stm(StmTile),
    Exp(ExpTile),
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pattern::Stm(tile) => write!(f, "Stm({}, cost {})", tile.name, tile.cost),
            Pattern::Exp(tile) => write!(f, "Exp({}, cost {})", tile.name, tile.cost),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Choice {
    pattern: usize,
    cost: u32,
}

/// Selects instructions for a sequence of statements using one pattern table.
pub struct Selector<'p, 'f> {
    patterns: &'p [Pattern],
    temps: &'f mut TempFactory,
    /// Best tile per expression node, keyed by node address.
    choices: HashMap<*const Exp, Choice>,
    instrs: Vec<mir::Instr>,
}

impl<'p, 'f> Selector<'p, 'f> {
    pub fn new(patterns: &'p [Pattern], temps: &'f mut TempFactory) -> Self {
        Self {
            patterns,
            temps,
            choices: HashMap::new(),
            instrs: Vec::new(),
        }
    }

    /// Selects and emits the instructions for `stm`.
    pub fn select(&mut self, stm: &Stm) {
        let choice = self.best_stm(stm);
        log::trace!(
            "selected {:?} for `{stm}` with total cost {}",
            self.patterns[choice.pattern],
            choice.cost
        );
        let Pattern::Stm(tile) = self.patterns[choice.pattern] else {
            unreachable!()
        };
        let operands = (tile.matcher)(stm)
            .unwrap_or_else(|| panic!("ICE: tile `{}` no longer matches `{stm}`", tile.name));
        (tile.gen)(self, stm, &operands);
        // Nodes are identified by address, which a later tree may reuse.
        self.choices.clear();
    }

    /// Total cost of the cheapest tiling of `stm`.
    pub fn cost_of(&mut self, stm: &Stm) -> u32 {
        let cost = self.best_stm(stm).cost;
        self.choices.clear();
        cost
    }

    /// Emits the instructions of the chosen tiling of `exp` and returns the temporary holding
    /// its value. Meant to be called by generators on their operands.
    pub fn munch_exp(&mut self, exp: &Exp) -> Temp {
        let choice = self.best_exp(exp);
        let Pattern::Exp(tile) = self.patterns[choice.pattern] else {
            unreachable!()
        };
        let operands = (tile.matcher)(exp)
            .unwrap_or_else(|| panic!("ICE: tile `{}` no longer matches `{exp}`", tile.name));
        (tile.gen)(self, exp, &operands)
    }

    pub fn emit(&mut self, instr: mir::Instr) {
        self.instrs.push(instr);
    }

    pub fn new_temp(&mut self) -> Temp {
        self.temps.new_temp()
    }

    /// Returns the instructions emitted so far.
    pub fn finish(self) -> Vec<mir::Instr> {
        self.instrs
    }

    fn best_stm(&mut self, stm: &Stm) -> Choice {
        match stm {
            Stm::Move(dst, src) => {
                // The destination is only matched structurally, never selected as a value.
                if !matches!(dst, Exp::Temp(_) | Exp::Mem(_)) {
                    panic!("ICE: cannot move into `{dst}`");
                }
                self.best_exp(src);
            }
            Stm::Exp(exp) => {
                self.best_exp(exp);
            }
            Stm::Jump(target, _) => {
                self.best_exp(target);
            }
            Stm::CJump(_, l, r, _, _) => {
                self.best_exp(l);
                self.best_exp(r);
            }
            Stm::Seq(..) => panic!("ICE: SEQ reached instruction selection: `{stm}`"),
            Stm::Label(_) => {}
        }

        let patterns = self.patterns;
        let mut best: Option<Choice> = None;
        for (index, pattern) in patterns.iter().enumerate() {
            let Pattern::Stm(tile) = pattern else {
                continue;
            };
            if let Some(operands) = (tile.matcher)(stm) {
                let cost = tile.cost + self.operand_costs(&operands);
                if best.map_or(true, |best| cost < best.cost) {
                    best = Some(Choice {
                        pattern: index,
                        cost,
                    });
                }
            }
        }
        best.unwrap_or_else(|| panic!("ICE: no pattern matches statement `{stm}`"))
    }

    fn best_exp(&mut self, exp: &Exp) -> Choice {
        if let Some(&choice) = self.choices.get(&(exp as *const Exp)) {
            return choice;
        }

        match exp {
            Exp::Const(_) | Exp::Name(_) | Exp::Temp(_) => {}
            Exp::BinOp(_, l, r) => {
                self.best_exp(l);
                self.best_exp(r);
            }
            Exp::Mem(addr) => {
                self.best_exp(addr);
            }
            Exp::Call(fun, args) => {
                self.best_exp(fun);
                for arg in args {
                    self.best_exp(arg);
                }
            }
            Exp::ESeq(..) => panic!("ICE: ESEQ reached instruction selection: `{exp}`"),
        }

        let patterns = self.patterns;
        let mut best: Option<Choice> = None;
        for (index, pattern) in patterns.iter().enumerate() {
            let Pattern::Exp(tile) = pattern else {
                continue;
            };
            if let Some(operands) = (tile.matcher)(exp) {
                let cost = tile.cost + self.operand_costs(&operands);
                if best.map_or(true, |best| cost < best.cost) {
                    best = Some(Choice {
                        pattern: index,
                        cost,
                    });
                }
            }
        }
        let best = best.unwrap_or_else(|| panic!("ICE: no pattern matches expression `{exp}`"));
        self.choices.insert(exp, best);
        best
    }

    /// Operands are usually memoized already; those reached only through a `Move` destination
    /// are costed here first.
    fn operand_costs(&mut self, operands: &[&Exp]) -> u32 {
        operands.iter().map(|op| self.best_exp(op).cost).sum()
    }
}

/// Selects instructions for every statement of `stms`, in order, into one list.
pub fn select_all(patterns: &[Pattern], stms: &[Stm], temps: &mut TempFactory) -> Vec<mir::Instr> {
    let mut selector = Selector::new(patterns, temps);
    for stm in stms {
        selector.select(stm);
    }
    selector.finish()
}
