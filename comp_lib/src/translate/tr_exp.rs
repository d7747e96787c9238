use tree_ir::{Exp, Label, RelOp, Stm, TempFactory};

/// A translated expression, in whichever shape was cheapest to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrExp {
    /// Has a value.
    Ex(Exp),
    /// Has no value, only effects.
    Nx(Stm),
    /// A condition: jumps to one of two destinations that aren't known yet.
    Cx(Cond),
}

/// The not yet patched label slots of a condition.
///
/// Every slot holds a hole (see [`Label::is_hole`]) unique to it; patching replaces the holes in
/// the condition's statement with the real destination. Real labels are never touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchList(Vec<Label>);

impl PatchList {
    pub fn join(mut self, other: PatchList) -> PatchList {
        self.0.extend(other.0);
        self
    }

    /// Points every slot of this list inside `stm` at `target`.
    fn patch(&self, stm: &mut Stm, target: &Label) {
        stm.for_each_label_mut(&mut |label| {
            if self.0.contains(label) {
                *label = target.clone();
            }
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cond {
    pub stm: Stm,
    pub trues: PatchList,
    pub falses: PatchList,
}

impl Cond {
    /// `if l op r` with both destinations open.
    pub fn relation(op: RelOp, l: Exp, r: Exp, temps: &mut TempFactory) -> Self {
        let t = temps.new_hole();
        let f = temps.new_hole();
        Self {
            stm: Stm::CJump(op, l, r, t.clone(), f.clone()),
            trues: PatchList(vec![t]),
            falses: PatchList(vec![f]),
        }
    }

    /// Fills in both destinations, leaving a statement that always jumps to one of them.
    pub fn patch(mut self, t: &Label, f: &Label) -> Stm {
        self.trues.patch(&mut self.stm, t);
        self.falses.patch(&mut self.stm, f);
        self.stm
    }
}

impl TrExp {
    pub fn into_ex(self, temps: &mut TempFactory) -> Exp {
        match self {
            TrExp::Ex(exp) => exp,
            TrExp::Nx(stm) => Exp::eseq(stm, Exp::Const(0)),
            TrExp::Cx(cond) => {
                let r = temps.new_temp();
                let t = temps.new_label();
                let f = temps.new_label();
                let stm = cond.patch(&t, &f);
                Exp::eseq(
                    Stm::seq_all([
                        Stm::Move(Exp::Temp(r), Exp::Const(1)),
                        stm,
                        Stm::Label(f),
                        Stm::Move(Exp::Temp(r), Exp::Const(0)),
                        Stm::Label(t),
                    ]),
                    Exp::Temp(r),
                )
            }
        }
    }

    pub fn into_nx(self, temps: &mut TempFactory) -> Stm {
        match self {
            TrExp::Ex(exp) => Stm::Exp(exp),
            TrExp::Nx(stm) => stm,
            TrExp::Cx(cond) => {
                let join = temps.new_label();
                Stm::seq(cond.patch(&join, &join), Stm::Label(join))
            }
        }
    }

    pub fn into_cx(self, temps: &mut TempFactory) -> Cond {
        match self {
            TrExp::Ex(Exp::Const(n)) => {
                let hole = temps.new_hole();
                let stm = Stm::jump_to(hole.clone());
                match n {
                    0 => Cond {
                        stm,
                        trues: PatchList::default(),
                        falses: PatchList(vec![hole]),
                    },
                    _ => Cond {
                        stm,
                        trues: PatchList(vec![hole]),
                        falses: PatchList::default(),
                    },
                }
            }
            TrExp::Ex(exp) => Cond::relation(RelOp::Ne, exp, Exp::Const(0), temps),
            TrExp::Nx(stm) => panic!("ICE: statement `{stm}` used as a condition"),
            TrExp::Cx(cond) => cond,
        }
    }

    /// `true` for the constants 0 and 1, which can stand in for a condition without
    /// materializing a comparison.
    pub(super) fn is_boolean_const(&self) -> bool {
        matches!(self, TrExp::Ex(Exp::Const(0 | 1)))
    }
}
