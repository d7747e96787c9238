//! Activation records.
//!
//! A frame is addressed through `$fp`, which holds the stack pointer as it was on entry. Slots
//! for escaping formals and locals grow downwards from `$fp`, the first one being the static
//! link. Arguments beyond the first [`MAX_REG_ARGS`] are passed on the stack, the first of them
//! at `0($fp)`.


use crate::{instr, Instr, Reg};
use tree_ir::{Exp, Label, Stm, Temp, TempFactory};

pub const WORD_SIZE: i32 = 4;
/// Number of arguments passed in registers.
pub const MAX_REG_ARGS: usize = 4;
/// Offset from `$fp` of the slot holding the static link.
pub const STATIC_LINK_OFFSET: i32 = -WORD_SIZE;

/// Where a formal or local lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// In the frame, at the given offset from the frame pointer.
    InFrame(i32),
    InReg(Temp),
}

#[derive(Debug, Clone)]
pub struct Frame {
    name: Label,
    formals: Vec<Access>,
    /// Number of word slots allocated below `$fp`.
    slots: u32,
}

impl Frame {
    /// Creates the frame of the function `name`, with one formal per entry of `escapes`.
    ///
    /// An escaping formal is given a frame slot, a non-escaping one a fresh temporary.
    pub fn new(name: Label, escapes: &[bool], temps: &mut TempFactory) -> Self {
        let mut frame = Self {
            name,
            formals: Vec::with_capacity(escapes.len()),
            slots: 0,
        };
        for &escape in escapes {
            let access = frame.alloc_local(escape, temps);
            frame.formals.push(access);
        }
        frame
    }

    pub fn name(&self) -> &Label {
        &self.name
    }

    pub fn formals(&self) -> &[Access] {
        &self.formals
    }

    /// Size in bytes of the slots allocated so far.
    pub fn frame_size(&self) -> i32 {
        self.slots as i32 * WORD_SIZE
    }

    pub fn alloc_local(&mut self, escape: bool, temps: &mut TempFactory) -> Access {
        match escape {
            true => {
                self.slots += 1;
                Access::InFrame(-(self.slots as i32) * WORD_SIZE)
            }
            false => Access::InReg(temps.new_temp()),
        }
    }

    /// Wraps `body` in the moves that copy every incoming argument to its formal's access.
    pub fn proc_entry_exit1(&self, body: Stm) -> Stm {
        let fp = || Exp::Temp(Reg::FP.into());
        let moves = self.formals.iter().enumerate().map(|(i, &formal)| {
            let incoming = match Reg::ARGS.get(i) {
                Some(&reg) => Exp::Temp(reg.into()),
                None => Exp::mem(Exp::plus(
                    fp(),
                    Exp::Const((i - MAX_REG_ARGS) as i32 * WORD_SIZE),
                )),
            };
            Stm::Move(access_exp(formal, fp()), incoming)
        });
        Stm::seq_all(moves.chain([body]).collect::<Vec<_>>())
    }

    /// Appends the sink instruction, which keeps the special and callee-saved registers live
    /// until the end of the procedure.
    pub fn proc_entry_exit2(&self, instrs: &mut Vec<Instr>) {
        let live_at_exit = Reg::SPECIAL
            .into_iter()
            .chain(Reg::CALLEE_SAVED)
            .map(Temp::from)
            .collect();
        instrs.push(instr::oper("", Vec::new(), live_at_exit));
    }
}

/// The expression reading (or, as a `Move` destination, writing) `access`, given the frame
/// pointer of the frame it lives in.
pub fn access_exp(access: Access, fp: Exp) -> Exp {
    match access {
        Access::InFrame(offset) => Exp::mem(Exp::plus(fp, Exp::Const(offset))),
        Access::InReg(temp) => Exp::Temp(temp),
    }
}

/// A call to a runtime function, which takes no static link.
pub fn external_call(name: &str, args: Vec<Exp>) -> Exp {
    Exp::call(Exp::Name(Label::from(name)), args)
}

/// A unit of output produced by translation.
#[derive(Debug, Clone)]
pub enum Fragment {
    Str { label: Label, text: String },
    Proc { body: Stm, frame: Frame },
}
