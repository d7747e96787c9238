//! Translation to IR trees.
//!
//! A [`Translator`] is the state of one compilation: the temp and label counters, the tree of
//! activation-record levels and the fragments produced so far. Its operations build [`TrExp`]s
//! for the constructs of the source language, choosing between the value (`Ex`), effect (`Nx`)
//! and condition (`Cx`) shape so that boolean logic stays as jumps where it can.


mod tr_exp;

pub use tr_exp::{Cond, PatchList, TrExp};

use mips_ir::{
    self as mir,
    frame::{self, Fragment, Frame, STATIC_LINK_OFFSET, WORD_SIZE},
    Reg,
};
use tree_ir::{BinOp, Exp, Label, RelOp, Stm, TempFactory};

/// Identifies a level: the activation record of one function, nested in its parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelId(usize);

/// A variable's location, together with the level that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub level: LevelId,
    pub access: mir::Access,
}

#[derive(Debug)]
struct Level {
    parent: Option<LevelId>,
    /// `None` for the outermost level, which holds the runtime library.
    frame: Option<Frame>,
    formals: Vec<Access>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oper {
    Plus,
    Minus,
    Times,
    Divide,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Oper {
    fn binop(self) -> Option<BinOp> {
        match self {
            Oper::Plus => Some(BinOp::Plus),
            Oper::Minus => Some(BinOp::Minus),
            Oper::Times => Some(BinOp::Mul),
            Oper::Divide => Some(BinOp::Div),
            _ => None,
        }
    }

    fn relop(self) -> Option<RelOp> {
        match self {
            Oper::Eq => Some(RelOp::Eq),
            Oper::Neq => Some(RelOp::Ne),
            Oper::Lt => Some(RelOp::Lt),
            Oper::Le => Some(RelOp::Le),
            Oper::Gt => Some(RelOp::Gt),
            Oper::Ge => Some(RelOp::Ge),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Translator {
    temps: TempFactory,
    levels: Vec<Level>,
    fragments: Vec<Fragment>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator {
    pub fn new() -> Self {
        Self {
            temps: mir::temp_factory(),
            levels: vec![Level {
                parent: None,
                frame: None,
                formals: Vec::new(),
            }],
            fragments: Vec::new(),
        }
    }

    pub fn outermost(&self) -> LevelId {
        LevelId(0)
    }

    /// Creates the level of a function declared in `parent`. Besides the given formals, it gets
    /// an escaping static link as its first formal.
    pub fn new_level(&mut self, parent: LevelId, name: Label, formal_escapes: &[bool]) -> LevelId {
        let escapes: Vec<bool> = std::iter::once(true)
            .chain(formal_escapes.iter().copied())
            .collect();
        let frame = Frame::new(name, &escapes, &mut self.temps);
        let id = LevelId(self.levels.len());
        let formals = frame.formals()[1..]
            .iter()
            .map(|&access| Access { level: id, access })
            .collect();
        self.levels.push(Level {
            parent: Some(parent),
            frame: Some(frame),
            formals,
        });
        id
    }

    /// The formals of `level`, without the static link.
    pub fn formals(&self, level: LevelId) -> &[Access] {
        &self.levels[level.0].formals
    }

    pub fn alloc_local(&mut self, level: LevelId, escape: bool) -> Access {
        let frame = self.levels[level.0]
            .frame
            .as_mut()
            .unwrap_or_else(|| panic!("ICE: the outermost level has no frame"));
        let access = frame.alloc_local(escape, &mut self.temps);
        Access { level, access }
    }

    /// Number of levels enclosing `level`; 0 for the outermost one.
    pub fn depth(&self, level: LevelId) -> usize {
        std::iter::successors(self.levels[level.0].parent, |p| self.levels[p.0].parent).count()
    }

    pub fn new_label(&mut self) -> Label {
        self.temps.new_label()
    }

    pub fn temps(&mut self) -> &mut TempFactory {
        &mut self.temps
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Ends the session, handing out the fragments and the temp factory later phases keep
    /// drawing from.
    pub fn finish(self) -> (Vec<Fragment>, TempFactory) {
        (self.fragments, self.temps)
    }

    pub fn un_ex(&mut self, exp: TrExp) -> Exp {
        exp.into_ex(&mut self.temps)
    }

    pub fn un_nx(&mut self, exp: TrExp) -> Stm {
        exp.into_nx(&mut self.temps)
    }

    pub fn un_cx(&mut self, exp: TrExp) -> Cond {
        exp.into_cx(&mut self.temps)
    }

    fn frame(&self, level: LevelId) -> &Frame {
        self.levels[level.0]
            .frame
            .as_ref()
            .unwrap_or_else(|| panic!("ICE: the outermost level has no frame"))
    }

    /// Follows static links from the frame of `from` up to the frame of `to`, returning an
    /// expression for the frame pointer of `to`.
    fn static_link(&self, from: LevelId, to: LevelId) -> Exp {
        let mut fp = Exp::Temp(Reg::FP.into());
        let mut level = from;
        while level != to {
            fp = Exp::mem(Exp::plus(fp, Exp::Const(STATIC_LINK_OFFSET)));
            level = self.levels[level.0].parent.unwrap_or_else(|| {
                panic!("ICE: level {to:?} doesn't enclose level {from:?}")
            });
        }
        fp
    }

    pub fn simple_var(&self, access: Access, level: LevelId) -> TrExp {
        let fp = self.static_link(level, access.level);
        TrExp::Ex(frame::access_exp(access.access, fp))
    }

    /// The `index`th field of a record.
    pub fn field_var(&mut self, record: TrExp, index: usize) -> TrExp {
        let record = self.un_ex(record);
        TrExp::Ex(Exp::mem(Exp::plus(
            record,
            Exp::Const(index as i32 * WORD_SIZE),
        )))
    }

    pub fn subscript_var(&mut self, array: TrExp, index: TrExp) -> TrExp {
        let array = self.un_ex(array);
        let index = self.un_ex(index);
        TrExp::Ex(Exp::mem(Exp::plus(
            array,
            Exp::binop(BinOp::Mul, index, Exp::Const(WORD_SIZE)),
        )))
    }

    pub fn constant(&self, n: i32) -> TrExp {
        TrExp::Ex(Exp::Const(n))
    }

    pub fn nop(&self) -> TrExp {
        TrExp::Nx(Stm::Exp(Exp::Const(0)))
    }

    /// A string literal, stored in its own fragment.
    pub fn string(&mut self, text: &str) -> TrExp {
        let label = self.temps.new_label();
        log::trace!("string fragment `{label}`: {text:?}");
        self.fragments.push(Fragment::Str {
            label: label.clone(),
            text: text.to_owned(),
        });
        TrExp::Ex(Exp::Name(label))
    }

    /// Arithmetic gives a value; comparisons give a condition.
    pub fn op(&mut self, op: Oper, l: TrExp, r: TrExp) -> TrExp {
        let l = self.un_ex(l);
        let r = self.un_ex(r);
        match (op.binop(), op.relop()) {
            (Some(binop), _) => TrExp::Ex(Exp::binop(binop, l, r)),
            (_, Some(relop)) => TrExp::Cx(Cond::relation(relop, l, r, &mut self.temps)),
            (None, None) => unreachable!(),
        }
    }

    /// Compares two strings with the runtime's `strCmp`, which returns a negative, zero or
    /// positive number.
    pub fn str_cmp(&mut self, op: Oper, l: TrExp, r: TrExp) -> TrExp {
        let Some(relop) = op.relop() else {
            panic!("ICE: `{op:?}` applied to strings")
        };
        let l = self.un_ex(l);
        let r = self.un_ex(r);
        let cmp = frame::external_call("strCmp", vec![l, r]);
        TrExp::Cx(Cond::relation(relop, cmp, Exp::Const(0), &mut self.temps))
    }

    pub fn assign(&mut self, lhs: TrExp, rhs: TrExp) -> TrExp {
        let lhs = self.un_ex(lhs);
        let rhs = self.un_ex(rhs);
        TrExp::Nx(Stm::Move(lhs, rhs))
    }

    /// `if test then then_ else else_`.
    ///
    /// Both arms must be statements, or both must have a value. When both arms are conditions
    /// (or one is a condition and the other the constant 0 or 1), the result is again a
    /// condition.
    pub fn if_then_else(&mut self, test: TrExp, then_: TrExp, else_: TrExp) -> TrExp {
        let test = self.un_cx(test);
        let t = self.temps.new_label();
        let f = self.temps.new_label();
        let join = self.temps.new_label();
        let test = test.patch(&t, &f);

        let is_nx = |e: &TrExp| matches!(e, TrExp::Nx(_));
        let is_cond = |e: &TrExp| matches!(e, TrExp::Cx(_)) || e.is_boolean_const();

        if is_nx(&then_) != is_nx(&else_) {
            panic!("ICE: if arms of different shapes: `{then_:?}` and `{else_:?}`")
        }
        let both_cond = is_cond(&then_)
            && is_cond(&else_)
            && (matches!(then_, TrExp::Cx(_)) || matches!(else_, TrExp::Cx(_)));

        match then_ {
            TrExp::Nx(then_) => {
                let else_ = self.un_nx(else_);
                TrExp::Nx(Stm::seq_all([
                    test,
                    Stm::Label(t),
                    then_,
                    Stm::jump_to(join.clone()),
                    Stm::Label(f),
                    else_,
                    Stm::Label(join),
                ]))
            }
            then_ if both_cond => {
                let then_ = self.un_cx(then_);
                let else_ = self.un_cx(else_);
                TrExp::Cx(Cond {
                    stm: Stm::seq_all([
                        test,
                        Stm::Label(t),
                        then_.stm,
                        Stm::jump_to(join.clone()),
                        Stm::Label(f),
                        else_.stm,
                        Stm::Label(join),
                    ]),
                    trues: then_.trues.join(else_.trues),
                    falses: then_.falses.join(else_.falses),
                })
            }
            then_ => {
                let r = self.temps.new_temp();
                let then_ = self.un_ex(then_);
                let else_ = self.un_ex(else_);
                TrExp::Ex(Exp::eseq(
                    Stm::seq_all([
                        test,
                        Stm::Label(t),
                        Stm::Move(Exp::Temp(r), then_),
                        Stm::jump_to(join.clone()),
                        Stm::Label(f),
                        Stm::Move(Exp::Temp(r), else_),
                        Stm::Label(join),
                    ]),
                    Exp::Temp(r),
                ))
            }
        }
    }

    pub fn if_then(&mut self, test: TrExp, then_: TrExp) -> TrExp {
        let test = self.un_cx(test);
        let t = self.temps.new_label();
        let f = self.temps.new_label();
        let test = test.patch(&t, &f);
        let then_ = self.un_nx(then_);
        TrExp::Nx(Stm::seq_all([test, Stm::Label(t), then_, Stm::Label(f)]))
    }

    /// `while test do body`. `done` is created by the caller so `break`s in `body` can refer to
    /// it.
    pub fn while_loop(&mut self, test: TrExp, body: TrExp, done: Label) -> TrExp {
        let test_label = self.temps.new_label();
        let body_label = self.temps.new_label();
        let test = self.un_cx(test).patch(&body_label, &done);
        let body = self.un_nx(body);
        TrExp::Nx(Stm::seq_all([
            Stm::Label(test_label.clone()),
            test,
            Stm::Label(body_label),
            body,
            Stm::jump_to(test_label),
            Stm::Label(done),
        ]))
    }

    /// `for var := lo to hi do body`.
    ///
    /// `hi` is evaluated once. The variable is only incremented while it's below the limit, so
    /// a limit at the largest integer doesn't overflow.
    pub fn for_loop(
        &mut self,
        var: Access,
        level: LevelId,
        lo: TrExp,
        hi: TrExp,
        body: TrExp,
        done: Label,
    ) -> TrExp {
        let var = self.simple_var(var, level);
        let var = self.un_ex(var);
        let lo = self.un_ex(lo);
        let hi = self.un_ex(hi);
        let body = self.un_nx(body);
        let limit = Exp::Temp(self.temps.new_temp());
        let body_label = self.temps.new_label();
        let inc_label = self.temps.new_label();
        TrExp::Nx(Stm::seq_all([
            Stm::Move(var.clone(), lo),
            Stm::Move(limit.clone(), hi),
            Stm::CJump(
                RelOp::Le,
                var.clone(),
                limit.clone(),
                body_label.clone(),
                done.clone(),
            ),
            Stm::Label(body_label.clone()),
            body,
            Stm::CJump(
                RelOp::Lt,
                var.clone(),
                limit,
                inc_label.clone(),
                done.clone(),
            ),
            Stm::Label(inc_label),
            Stm::Move(var.clone(), Exp::plus(var, Exp::Const(1))),
            Stm::jump_to(body_label),
            Stm::Label(done),
        ]))
    }

    pub fn break_(&self, done: Label) -> TrExp {
        TrExp::Nx(Stm::jump_to(done))
    }

    /// Calls the function of level `callee` from a function of level `caller`, passing the
    /// frame pointer of the callee's parent as static link.
    pub fn function_call(
        &mut self,
        callee: LevelId,
        caller: LevelId,
        args: Vec<TrExp>,
        is_procedure: bool,
    ) -> TrExp {
        let callee_depth = self.depth(callee);
        let caller_depth = self.depth(caller);
        if callee_depth > caller_depth + 1 {
            panic!("ICE: call from depth {caller_depth} to a function at depth {callee_depth}");
        }
        let Some(parent) = self.levels[callee.0].parent else {
            panic!("ICE: the outermost level can't be called")
        };
        let static_link = self.static_link(caller, parent);
        let name = self.frame(callee).name().clone();

        let args = std::iter::once(static_link)
            .chain(args.into_iter().map(|arg| self.un_ex(arg)))
            .collect();
        let call = Exp::call(Exp::Name(name), args);
        match is_procedure {
            true => TrExp::Nx(Stm::Exp(call)),
            false => TrExp::Ex(call),
        }
    }

    /// Calls a runtime library function, which takes no static link.
    pub fn external_call(&mut self, name: &str, args: Vec<TrExp>, is_procedure: bool) -> TrExp {
        let args = args.into_iter().map(|arg| self.un_ex(arg)).collect();
        let call = frame::external_call(name, args);
        match is_procedure {
            true => TrExp::Nx(Stm::Exp(call)),
            false => TrExp::Ex(call),
        }
    }

    /// Allocates a record and initializes its fields in order, through a pointer that moves
    /// one word per field.
    pub fn new_record(&mut self, fields: Vec<TrExp>) -> TrExp {
        let r = Exp::Temp(self.temps.new_temp());
        let p = Exp::Temp(self.temps.new_temp());
        let size = fields.len() as i32 * WORD_SIZE;

        let mut stms = vec![
            Stm::Move(
                r.clone(),
                frame::external_call("malloc", vec![Exp::Const(size)]),
            ),
            Stm::Move(p.clone(), r.clone()),
        ];
        for field in fields {
            let field = self.un_ex(field);
            stms.push(Stm::Move(Exp::mem(p.clone()), field));
            stms.push(Stm::Move(
                p.clone(),
                Exp::plus(p.clone(), Exp::Const(WORD_SIZE)),
            ));
        }
        TrExp::Ex(Exp::eseq(Stm::seq_all(stms), r))
    }

    /// Allocates an array of `size` words and fills it with `init` through the runtime's
    /// `initArray`.
    pub fn new_array(&mut self, size: TrExp, init: TrExp) -> TrExp {
        let size = self.un_ex(size);
        let init = self.un_ex(init);
        let n = Exp::Temp(self.temps.new_temp());
        let r = Exp::Temp(self.temps.new_temp());
        TrExp::Ex(Exp::eseq(
            Stm::seq_all([
                Stm::Move(n.clone(), size),
                Stm::Move(
                    r.clone(),
                    frame::external_call(
                        "malloc",
                        vec![Exp::binop(BinOp::Mul, n.clone(), Exp::Const(WORD_SIZE))],
                    ),
                ),
                Stm::Exp(frame::external_call("initArray", vec![r.clone(), n, init])),
            ]),
            r,
        ))
    }

    pub fn stmt_seq(&mut self, first: TrExp, second: TrExp) -> TrExp {
        let first = self.un_nx(first);
        let second = self.un_nx(second);
        TrExp::Nx(Stm::seq(first, second))
    }

    /// Evaluates `stm` for its effects, then `result` for its value.
    pub fn seq(&mut self, stm: TrExp, result: TrExp) -> TrExp {
        let stm = self.un_nx(stm);
        let result = self.un_ex(result);
        TrExp::Ex(Exp::eseq(stm, result))
    }

    /// Finishes the body of the function of `level`: its value goes to the return register and
    /// its incoming arguments are moved into place. Registers the procedure as a fragment.
    pub fn proc_entry_exit(&mut self, level: LevelId, body: TrExp) {
        let body = self.un_ex(body);
        let frame = self.frame(level).clone();
        let body = frame.proc_entry_exit1(Stm::Move(Exp::Temp(Reg::RV.into()), body));
        log::debug!("procedure fragment `{}`", frame.name());
        self.fragments.push(Fragment::Proc { body, frame });
    }
}
