use crate::{Label, Temp};
use vec1::{vec1, Vec1};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Plus,
    Minus,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    /// The relation that holds exactly when `self` does not.
    pub fn negate(self) -> Self {
        match self {
            RelOp::Eq => RelOp::Ne,
            RelOp::Ne => RelOp::Eq,
            RelOp::Lt => RelOp::Ge,
            RelOp::Le => RelOp::Gt,
            RelOp::Gt => RelOp::Le,
            RelOp::Ge => RelOp::Lt,
        }
    }

    /// The relation with its operands swapped: `a op b` iff `b op.commute() a`.
    pub fn commute(self) -> Self {
        match self {
            RelOp::Eq => RelOp::Eq,
            RelOp::Ne => RelOp::Ne,
            RelOp::Lt => RelOp::Gt,
            RelOp::Le => RelOp::Ge,
            RelOp::Gt => RelOp::Lt,
            RelOp::Ge => RelOp::Le,
        }
    }

    pub fn eval(self, l: i32, r: i32) -> bool {
        match self {
            RelOp::Eq => l == r,
            RelOp::Ne => l != r,
            RelOp::Lt => l < r,
            RelOp::Le => l <= r,
            RelOp::Gt => l > r,
            RelOp::Ge => l >= r,
        }
    }
}

/// An expression tree, computing a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exp {
    Const(i32),
    Name(Label),
    Temp(Temp),
    BinOp(BinOp, Box<Exp>, Box<Exp>),
    /// The word at the given address.
    Mem(Box<Exp>),
    /// A call of the function at the first expression with the given arguments.
    Call(Box<Exp>, Vec<Exp>),
    /// Evaluate the statement for its side effects, then the expression.
    ESeq(Box<Stm>, Box<Exp>),
}

/// A statement tree, performing side effects and control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stm {
    /// `Move(dst, src)`; `dst` is either a `Temp` or a `Mem`.
    Move(Exp, Exp),
    /// Evaluate and discard.
    Exp(Exp),
    /// Jump to the computed address, which is one of the given labels.
    Jump(Exp, Vec1<Label>),
    /// `CJump(op, l, r, t, f)` jumps to `t` if `l op r`, to `f` otherwise.
    CJump(RelOp, Exp, Exp, Label, Label),
    Seq(Box<Stm>, Box<Stm>),
    Label(Label),
}

impl Exp {
    pub fn binop(op: BinOp, l: Exp, r: Exp) -> Self {
        Self::BinOp(op, Box::new(l), Box::new(r))
    }

    pub fn plus(l: Exp, r: Exp) -> Self {
        Self::binop(BinOp::Plus, l, r)
    }

    pub fn mem(addr: Exp) -> Self {
        Self::Mem(Box::new(addr))
    }

    pub fn call(fun: Exp, args: Vec<Exp>) -> Self {
        Self::Call(Box::new(fun), args)
    }

    pub fn eseq(stm: Stm, exp: Exp) -> Self {
        Self::ESeq(Box::new(stm), Box::new(exp))
    }

    /// Calls `f` on every label this expression mentions, including those inside nested
    /// statements.
    pub fn for_each_label_mut(&mut self, f: &mut impl FnMut(&mut Label)) {
        match self {
            Exp::Const(_) | Exp::Temp(_) => {}
            Exp::Name(label) => f(label),
            Exp::BinOp(_, l, r) => {
                l.for_each_label_mut(f);
                r.for_each_label_mut(f);
            }
            Exp::Mem(addr) => addr.for_each_label_mut(f),
            Exp::Call(fun, args) => {
                fun.for_each_label_mut(f);
                for arg in args {
                    arg.for_each_label_mut(f);
                }
            }
            Exp::ESeq(stm, exp) => {
                stm.for_each_label_mut(f);
                exp.for_each_label_mut(f);
            }
        }
    }
}

impl Stm {
    pub fn seq(first: Stm, second: Stm) -> Self {
        Self::Seq(Box::new(first), Box::new(second))
    }

    /// Chains the statements with right-nested `Seq`s. An empty sequence is a no-op.
    pub fn seq_all<I>(stms: I) -> Self
    where
        I: IntoIterator<Item = Stm>,
        I::IntoIter: DoubleEndedIterator,
    {
        let mut stms = stms.into_iter().rev();
        let Some(last) = stms.next() else {
            return Stm::Exp(Exp::Const(0));
        };
        stms.fold(last, |rest, stm| Stm::seq(stm, rest))
    }

    /// An unconditional jump to a known label.
    pub fn jump_to(label: Label) -> Self {
        Self::Jump(Exp::Name(label.clone()), vec1![label])
    }

    /// Calls `f` on every label slot of this statement: label definitions, jump targets and
    /// names inside expressions.
    pub fn for_each_label_mut(&mut self, f: &mut impl FnMut(&mut Label)) {
        match self {
            Stm::Move(dst, src) => {
                dst.for_each_label_mut(f);
                src.for_each_label_mut(f);
            }
            Stm::Exp(exp) => exp.for_each_label_mut(f),
            Stm::Jump(target, labels) => {
                target.for_each_label_mut(f);
                for label in labels.iter_mut() {
                    f(label);
                }
            }
            Stm::CJump(_, l, r, t, fl) => {
                l.for_each_label_mut(f);
                r.for_each_label_mut(f);
                f(t);
                f(fl);
            }
            Stm::Seq(first, second) => {
                first.for_each_label_mut(f);
                second.for_each_label_mut(f);
            }
            Stm::Label(label) => f(label),
        }
    }
}
