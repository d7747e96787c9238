//! Single-line textual form of trees, e.g. `MOVE(TEMP t32, BINOP(PLUS, TEMP t30, CONST 4))`.

use crate::{BinOp, Exp, RelOp, Stm};
use std::fmt::{Display, Formatter, Result};

impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(match self {
            BinOp::Plus => "PLUS",
            BinOp::Minus => "MINUS",
            BinOp::Mul => "MUL",
            BinOp::Div => "DIV",
        })
    }
}

impl Display for RelOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(match self {
            RelOp::Eq => "EQ",
            RelOp::Ne => "NE",
            RelOp::Lt => "LT",
            RelOp::Le => "LE",
            RelOp::Gt => "GT",
            RelOp::Ge => "GE",
        })
    }
}

impl Display for Exp {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Exp::Const(n) => write!(f, "CONST {n}"),
            Exp::Name(label) => write!(f, "NAME {label}"),
            Exp::Temp(temp) => write!(f, "TEMP {temp}"),
            Exp::BinOp(op, l, r) => write!(f, "BINOP({op}, {l}, {r})"),
            Exp::Mem(addr) => write!(f, "MEM({addr})"),
            Exp::Call(fun, args) => {
                write!(f, "CALL({fun}")?;
                for arg in args {
                    write!(f, ", {arg}")?;
                }
                f.write_str(")")
            }
            Exp::ESeq(stm, exp) => write!(f, "ESEQ({stm}, {exp})"),
        }
    }
}

impl Display for Stm {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Stm::Move(dst, src) => write!(f, "MOVE({dst}, {src})"),
            Stm::Exp(exp) => write!(f, "EXP({exp})"),
            Stm::Jump(target, _) => write!(f, "JUMP({target})"),
            Stm::CJump(op, l, r, t, fl) => write!(f, "CJUMP({op}, {l}, {r}, {t}, {fl})"),
            Stm::Seq(first, second) => write!(f, "SEQ({first}, {second})"),
            Stm::Label(label) => write!(f, "LABEL {label}"),
        }
    }
}
