//! The MIPS tile set.
//!
//! All tiles cost one per emitted machine instruction, except tiles that emit nothing (`Temp`,
//! `Exp`, discarded leaves, labels). Templates only name virtual operands through placeholders;
//! `$zero`, `$at` and `$sp` are written out where the idiom fixes them.


use super::select::{self, ExpTile, Pattern, Selector, StmTile};
use arrayvec::ArrayVec;
use mips_ir::{
    self as mir,
    frame::{MAX_REG_ARGS, WORD_SIZE},
    instr, Reg,
};
use tree_ir::{BinOp, Exp, Label, RelOp, Stm, Temp, TempFactory};
use vec1::vec1;

/// Selects instructions for the canonical statements of one procedure body, ending with the
/// frame's exit sink.
pub fn codegen(frame: &mir::Frame, stms: &[Stm], temps: &mut TempFactory) -> Vec<mir::Instr> {
    let mut instrs = select::select_all(PATTERNS, stms, temps);
    frame.proc_entry_exit2(&mut instrs);
    log::debug!(
        "selected {} instructions for `{}`",
        instrs.len(),
        frame.name()
    );
    instrs
}

const fn exp(
    name: &'static str,
    matcher: select::ExpMatcher,
    gen: select::ExpGen,
    cost: u32,
) -> Pattern {
    Pattern::Exp(ExpTile {
        name,
        matcher,
        gen,
        cost,
    })
}

const fn stm(
    name: &'static str,
    matcher: select::StmMatcher,
    gen: select::StmGen,
    cost: u32,
) -> Pattern {
    Pattern::Stm(StmTile {
        name,
        matcher,
        gen,
        cost,
    })
}

pub static PATTERNS: &[Pattern] = &[
    // Expressions
    exp("li", match_const, gen_const, 1),
    exp("la", match_name, gen_name, 1),
    exp("temp", match_temp, gen_temp, 0),
    exp("add", match_add, gen_add, 1),
    exp("addi", match_add_imm, gen_add_imm, 1),
    exp("addi (commuted)", match_imm_add, gen_imm_add, 1),
    exp("sub", match_sub, gen_sub, 1),
    exp("subi", match_sub_imm, gen_sub_imm, 1),
    exp("mult", match_mul, gen_mul, 2),
    exp("div", match_div, gen_div, 2),
    exp("lw offset", match_load_offset, gen_load_offset, 1),
    exp(
        "lw offset (commuted)",
        match_load_offset_commuted,
        gen_load_offset_commuted,
        1,
    ),
    exp("lw", match_load, gen_load, 1),
    exp("jal", match_call_named, gen_call_named, 1),
    exp("jalr", match_call, gen_call, 1),
    // Statements
    stm("nop", match_discarded_leaf, gen_nothing, 0),
    stm("exp", match_exp, gen_exp, 0),
    stm("move", match_move_temp, gen_move_temp, 1),
    stm("sw offset", match_store_offset, gen_store_offset, 1),
    stm(
        "sw offset (commuted)",
        match_store_offset_commuted,
        gen_store_offset_commuted,
        1,
    ),
    stm("sw", match_store, gen_store, 1),
    stm("label", match_label, gen_label, 0),
    stm("j", match_jump_named, gen_jump_named, 1),
    stm("jr", match_jump, gen_jump, 1),
    stm("beq", match_beq, gen_beq, 1),
    stm("bne", match_bne, gen_bne, 1),
    stm("bltz", match_bltz, gen_bltz, 1),
    stm("bgez", match_bgez, gen_bgez, 1),
    stm("bgtz", match_bgtz, gen_bgtz, 1),
    stm("blez", match_blez, gen_blez, 1),
    stm("slt + bne", match_blt, gen_blt, 2),
    stm("slt + beq", match_bge, gen_bge, 2),
    stm("slt + bne (swapped)", match_bgt, gen_bgt, 2),
    stm("slt + beq (swapped)", match_ble, gen_ble, 2),
];

fn mismatch(node: &dyn std::fmt::Display) -> ! {
    panic!("ICE: generator called on `{node}`, which its tile doesn't match")
}

/// `n` if it fits the signed 16 bit immediate field of `addi`, `lw` and `sw`.
fn imm16(n: i32) -> Option<i32> {
    i16::try_from(n).ok().map(i32::from)
}

/// `e + n`
fn plus_const(exp: &Exp) -> Option<(&Exp, i32)> {
    match exp {
        Exp::BinOp(BinOp::Plus, e, n) => match **n {
            Exp::Const(n) => Some((&**e, imm16(n)?)),
            _ => None,
        },
        _ => None,
    }
}

/// `n + e`
fn const_plus(exp: &Exp) -> Option<(&Exp, i32)> {
    match exp {
        Exp::BinOp(BinOp::Plus, n, e) => match **n {
            Exp::Const(n) => Some((&**e, imm16(n)?)),
            _ => None,
        },
        _ => None,
    }
}

fn binop_operands(exp: &Exp, op: BinOp) -> Option<Vec<&Exp>> {
    match exp {
        Exp::BinOp(o, l, r) if *o == op => Some(vec![&**l, &**r]),
        _ => None,
    }
}

fn gen_reg_op(s: &mut Selector, mnemonic: &str, operands: &[&Exp]) -> Temp {
    let l = s.munch_exp(operands[0]);
    let r = s.munch_exp(operands[1]);
    let d = s.new_temp();
    s.emit(instr::oper(
        format!("{mnemonic} `d0, `s0, `s1"),
        vec![d],
        vec![l, r],
    ));
    d
}

fn gen_imm_op(s: &mut Selector, operand: &Exp, imm: i32) -> Temp {
    let l = s.munch_exp(operand);
    let d = s.new_temp();
    s.emit(instr::oper(
        format!("addi `d0, `s0, {imm}"),
        vec![d],
        vec![l],
    ));
    d
}

/// Multiplication and division leave their result in `lo`.
fn gen_lo_op(s: &mut Selector, mnemonic: &str, operands: &[&Exp]) -> Temp {
    let l = s.munch_exp(operands[0]);
    let r = s.munch_exp(operands[1]);
    let d = s.new_temp();
    s.emit(instr::oper(
        format!("{mnemonic} `s0, `s1"),
        vec![],
        vec![l, r],
    ));
    s.emit(instr::oper("mflo `d0", vec![d], vec![]));
    d
}

fn match_const(exp: &Exp) -> Option<Vec<&Exp>> {
    matches!(exp, Exp::Const(_)).then(Vec::new)
}

fn gen_const(s: &mut Selector, exp: &Exp, _: &[&Exp]) -> Temp {
    let Exp::Const(n) = exp else { mismatch(exp) };
    let d = s.new_temp();
    s.emit(instr::oper(format!("li `d0, {n}"), vec![d], vec![]));
    d
}

fn match_name(exp: &Exp) -> Option<Vec<&Exp>> {
    matches!(exp, Exp::Name(_)).then(Vec::new)
}

fn gen_name(s: &mut Selector, exp: &Exp, _: &[&Exp]) -> Temp {
    let Exp::Name(label) = exp else { mismatch(exp) };
    let d = s.new_temp();
    s.emit(instr::oper(format!("la `d0, {label}"), vec![d], vec![]));
    d
}

fn match_temp(exp: &Exp) -> Option<Vec<&Exp>> {
    matches!(exp, Exp::Temp(_)).then(Vec::new)
}

fn gen_temp(_: &mut Selector, exp: &Exp, _: &[&Exp]) -> Temp {
    let Exp::Temp(temp) = exp else { mismatch(exp) };
    *temp
}

fn match_add(exp: &Exp) -> Option<Vec<&Exp>> {
    binop_operands(exp, BinOp::Plus)
}

fn gen_add(s: &mut Selector, _: &Exp, operands: &[&Exp]) -> Temp {
    gen_reg_op(s, "add", operands)
}

fn match_add_imm(exp: &Exp) -> Option<Vec<&Exp>> {
    plus_const(exp).map(|(e, _)| vec![e])
}

fn gen_add_imm(s: &mut Selector, exp: &Exp, operands: &[&Exp]) -> Temp {
    let Some((_, n)) = plus_const(exp) else { mismatch(exp) };
    gen_imm_op(s, operands[0], n)
}

fn match_imm_add(exp: &Exp) -> Option<Vec<&Exp>> {
    const_plus(exp).map(|(e, _)| vec![e])
}

fn gen_imm_add(s: &mut Selector, exp: &Exp, operands: &[&Exp]) -> Temp {
    let Some((_, n)) = const_plus(exp) else { mismatch(exp) };
    gen_imm_op(s, operands[0], n)
}

fn match_sub(exp: &Exp) -> Option<Vec<&Exp>> {
    binop_operands(exp, BinOp::Minus)
}

fn gen_sub(s: &mut Selector, _: &Exp, operands: &[&Exp]) -> Temp {
    gen_reg_op(s, "sub", operands)
}

/// `e - n`, as long as `-n` fits an immediate.
fn minus_const(exp: &Exp) -> Option<(&Exp, i32)> {
    match exp {
        Exp::BinOp(BinOp::Minus, e, n) => match **n {
            Exp::Const(n) => Some((&**e, imm16(n.checked_neg()?)?)),
            _ => None,
        },
        _ => None,
    }
}

fn match_sub_imm(exp: &Exp) -> Option<Vec<&Exp>> {
    minus_const(exp).map(|(e, _)| vec![e])
}

fn gen_sub_imm(s: &mut Selector, exp: &Exp, operands: &[&Exp]) -> Temp {
    let Some((_, neg)) = minus_const(exp) else { mismatch(exp) };
    gen_imm_op(s, operands[0], neg)
}

fn match_mul(exp: &Exp) -> Option<Vec<&Exp>> {
    binop_operands(exp, BinOp::Mul)
}

fn gen_mul(s: &mut Selector, _: &Exp, operands: &[&Exp]) -> Temp {
    gen_lo_op(s, "mult", operands)
}

fn match_div(exp: &Exp) -> Option<Vec<&Exp>> {
    binop_operands(exp, BinOp::Div)
}

fn gen_div(s: &mut Selector, _: &Exp, operands: &[&Exp]) -> Temp {
    gen_lo_op(s, "div", operands)
}

fn gen_load_from(s: &mut Selector, base: &Exp, offset: i32) -> Temp {
    let base = s.munch_exp(base);
    let d = s.new_temp();
    s.emit(instr::oper(
        format!("lw `d0, {offset}(`s0)"),
        vec![d],
        vec![base],
    ));
    d
}

fn match_load_offset(exp: &Exp) -> Option<Vec<&Exp>> {
    match exp {
        Exp::Mem(addr) => plus_const(addr).map(|(base, _)| vec![base]),
        _ => None,
    }
}

fn gen_load_offset(s: &mut Selector, exp: &Exp, operands: &[&Exp]) -> Temp {
    let Some((_, offset)) = mem_address(exp).and_then(plus_const) else { mismatch(exp) };
    gen_load_from(s, operands[0], offset)
}

fn match_load_offset_commuted(exp: &Exp) -> Option<Vec<&Exp>> {
    match exp {
        Exp::Mem(addr) => const_plus(addr).map(|(base, _)| vec![base]),
        _ => None,
    }
}

fn gen_load_offset_commuted(s: &mut Selector, exp: &Exp, operands: &[&Exp]) -> Temp {
    let Some((_, offset)) = mem_address(exp).and_then(const_plus) else { mismatch(exp) };
    gen_load_from(s, operands[0], offset)
}

fn match_load(exp: &Exp) -> Option<Vec<&Exp>> {
    mem_address(exp).map(|addr| vec![addr])
}

fn gen_load(s: &mut Selector, _: &Exp, operands: &[&Exp]) -> Temp {
    gen_load_from(s, operands[0], 0)
}

fn mem_address(exp: &Exp) -> Option<&Exp> {
    match exp {
        Exp::Mem(addr) => Some(&**addr),
        _ => None,
    }
}

fn match_call_named(exp: &Exp) -> Option<Vec<&Exp>> {
    match exp {
        Exp::Call(fun, args) if matches!(**fun, Exp::Name(_)) => Some(args.iter().collect()),
        _ => None,
    }
}

fn gen_call_named(s: &mut Selector, exp: &Exp, args: &[&Exp]) -> Temp {
    let Exp::Call(fun, _) = exp else { mismatch(exp) };
    let Exp::Name(label) = &**fun else { mismatch(exp) };
    gen_call_to(s, Callee::Named(label), args)
}

fn match_call(exp: &Exp) -> Option<Vec<&Exp>> {
    match exp {
        Exp::Call(fun, args) => Some(std::iter::once(&**fun).chain(args).collect()),
        _ => None,
    }
}

fn gen_call(s: &mut Selector, _: &Exp, operands: &[&Exp]) -> Temp {
    let fun = s.munch_exp(operands[0]);
    gen_call_to(s, Callee::Computed(fun), &operands[1..])
}

enum Callee<'l> {
    Named(&'l Label),
    Computed(Temp),
}

/// Passes the first [`MAX_REG_ARGS`] arguments in `$a0`-`$a3` and the rest in a stack area
/// reserved for the call, the first of them at `0($sp)`. All arguments are evaluated before any
/// argument register is written. The result is copied out of `$v0`.
fn gen_call_to(s: &mut Selector, callee: Callee, args: &[&Exp]) -> Temp {
    let values: Vec<Temp> = args.iter().map(|arg| s.munch_exp(arg)).collect();
    let (in_regs, on_stack) = values.split_at(values.len().min(MAX_REG_ARGS));

    let mut arg_regs: ArrayVec<Temp, MAX_REG_ARGS> = ArrayVec::new();
    for (&value, reg) in in_regs.iter().zip(Reg::ARGS) {
        s.emit(instr::mov(reg.into(), value));
        arg_regs.push(reg.into());
    }

    let sp: Temp = Reg::SP.into();
    let reserved = on_stack.len() as i32 * WORD_SIZE;
    if reserved > 0 {
        s.emit(instr::oper(
            format!("addi `d0, `s0, {}", -reserved),
            vec![sp],
            vec![sp],
        ));
        for (i, &value) in on_stack.iter().enumerate().rev() {
            s.emit(instr::oper(
                format!("sw `s0, {}(`s1)", i as i32 * WORD_SIZE),
                vec![],
                vec![value, sp],
            ));
        }
    }

    let (assem, mut uses) = match callee {
        Callee::Named(label) => (format!("jal {label}"), Vec::new()),
        Callee::Computed(fun) => ("jalr `s0".to_owned(), vec![fun]),
    };
    uses.extend(arg_regs);
    if reserved > 0 {
        uses.push(sp);
    }
    s.emit(instr::oper(assem, Reg::call_defs().collect(), uses));

    if reserved > 0 {
        s.emit(instr::oper(
            format!("addi `d0, `s0, {reserved}"),
            vec![sp],
            vec![sp],
        ));
    }

    let result = s.new_temp();
    s.emit(instr::mov(result, Reg::RV.into()));
    result
}

/// A discarded value without effects.
fn match_discarded_leaf(stm: &Stm) -> Option<Vec<&Exp>> {
    matches!(stm, Stm::Exp(Exp::Const(_) | Exp::Name(_) | Exp::Temp(_))).then(Vec::new)
}

fn gen_nothing(_: &mut Selector, _: &Stm, _: &[&Exp]) {}

fn match_exp(stm: &Stm) -> Option<Vec<&Exp>> {
    match stm {
        Stm::Exp(exp) => Some(vec![exp]),
        _ => None,
    }
}

fn gen_exp(s: &mut Selector, _: &Stm, operands: &[&Exp]) {
    s.munch_exp(operands[0]);
}

fn match_move_temp(stm: &Stm) -> Option<Vec<&Exp>> {
    match stm {
        Stm::Move(Exp::Temp(_), src) => Some(vec![src]),
        _ => None,
    }
}

fn gen_move_temp(s: &mut Selector, stm: &Stm, operands: &[&Exp]) {
    let Stm::Move(Exp::Temp(dst), _) = stm else { mismatch(stm) };
    let src = s.munch_exp(operands[0]);
    s.emit(instr::mov(*dst, src));
}

fn store_address(stm: &Stm) -> Option<(&Exp, &Exp)> {
    match stm {
        Stm::Move(Exp::Mem(addr), src) => Some((&**addr, src)),
        _ => None,
    }
}

fn gen_store_to(s: &mut Selector, base: &Exp, offset: i32, value: &Exp) {
    let base = s.munch_exp(base);
    let value = s.munch_exp(value);
    s.emit(instr::oper(
        format!("sw `s0, {offset}(`s1)"),
        vec![],
        vec![value, base],
    ));
}

fn match_store_offset(stm: &Stm) -> Option<Vec<&Exp>> {
    let (addr, src) = store_address(stm)?;
    plus_const(addr).map(|(base, _)| vec![base, src])
}

fn gen_store_offset(s: &mut Selector, stm: &Stm, operands: &[&Exp]) {
    let Some((_, offset)) = store_address(stm).and_then(|(addr, _)| plus_const(addr)) else {
        mismatch(stm)
    };
    gen_store_to(s, operands[0], offset, operands[1]);
}

fn match_store_offset_commuted(stm: &Stm) -> Option<Vec<&Exp>> {
    let (addr, src) = store_address(stm)?;
    const_plus(addr).map(|(base, _)| vec![base, src])
}

fn gen_store_offset_commuted(s: &mut Selector, stm: &Stm, operands: &[&Exp]) {
    let Some((_, offset)) = store_address(stm).and_then(|(addr, _)| const_plus(addr)) else {
        mismatch(stm)
    };
    gen_store_to(s, operands[0], offset, operands[1]);
}

fn match_store(stm: &Stm) -> Option<Vec<&Exp>> {
    store_address(stm).map(|(addr, src)| vec![addr, src])
}

fn gen_store(s: &mut Selector, _: &Stm, operands: &[&Exp]) {
    gen_store_to(s, operands[0], 0, operands[1]);
}

fn match_label(stm: &Stm) -> Option<Vec<&Exp>> {
    matches!(stm, Stm::Label(_)).then(Vec::new)
}

fn gen_label(s: &mut Selector, stm: &Stm, _: &[&Exp]) {
    let Stm::Label(label) = stm else { mismatch(stm) };
    s.emit(instr::label(label.clone()));
}

fn match_jump_named(stm: &Stm) -> Option<Vec<&Exp>> {
    matches!(stm, Stm::Jump(Exp::Name(_), _)).then(Vec::new)
}

fn gen_jump_named(s: &mut Selector, stm: &Stm, _: &[&Exp]) {
    let Stm::Jump(Exp::Name(label), targets) = stm else { mismatch(stm) };
    s.emit(instr::branch(format!("j {label}"), vec![], targets.clone()));
}

fn match_jump(stm: &Stm) -> Option<Vec<&Exp>> {
    match stm {
        Stm::Jump(target, _) => Some(vec![target]),
        _ => None,
    }
}

fn gen_jump(s: &mut Selector, stm: &Stm, operands: &[&Exp]) {
    let Stm::Jump(_, targets) = stm else { mismatch(stm) };
    let target = s.munch_exp(operands[0]);
    s.emit(instr::branch("jr `s0", vec![target], targets.clone()));
}

fn relation_operands(stm: &Stm, op: RelOp) -> Option<Vec<&Exp>> {
    match stm {
        Stm::CJump(o, l, r, _, _) if *o == op => Some(vec![l, r]),
        _ => None,
    }
}

fn zero_relation_operand(stm: &Stm, op: RelOp) -> Option<Vec<&Exp>> {
    match stm {
        Stm::CJump(o, l, Exp::Const(0), _, _) if *o == op => Some(vec![l]),
        _ => None,
    }
}

/// Emits a branch to the true label of the conditional jump `stm`. Both labels are recorded as
/// targets; the false label is expected to follow.
fn gen_branch(s: &mut Selector, stm: &Stm, mnemonic: &str, operands: &[&Exp]) {
    let Stm::CJump(_, _, _, t, f) = stm else { mismatch(stm) };
    let srcs: Vec<Temp> = operands.iter().map(|op| s.munch_exp(op)).collect();
    let assem = match srcs.len() {
        1 => format!("{mnemonic} `s0, `j0"),
        _ => format!("{mnemonic} `s0, `s1, `j0"),
    };
    s.emit(instr::branch(assem, srcs, vec1![t.clone(), f.clone()]));
}

/// `slt $at, a, b` followed by a branch on `$at`. With `swap`, compares `b < a` instead; with
/// `if_set` branches to the true label when `$at` is one, otherwise when it is zero.
fn gen_set_less_branch(s: &mut Selector, stm: &Stm, operands: &[&Exp], swap: bool, if_set: bool) {
    let Stm::CJump(_, _, _, t, f) = stm else { mismatch(stm) };
    let l = s.munch_exp(operands[0]);
    let r = s.munch_exp(operands[1]);
    let (a, b) = if swap { (r, l) } else { (l, r) };
    let at: Temp = Reg::AT.into();
    s.emit(instr::oper("slt `d0, `s0, `s1", vec![at], vec![a, b]));
    let mnemonic = if if_set { "bne" } else { "beq" };
    s.emit(instr::branch(
        format!("{mnemonic} `s0, `s1, `j0"),
        vec![at, Reg::ZERO.into()],
        vec1![t.clone(), f.clone()],
    ));
}

fn match_beq(stm: &Stm) -> Option<Vec<&Exp>> {
    relation_operands(stm, RelOp::Eq)
}

fn gen_beq(s: &mut Selector, stm: &Stm, operands: &[&Exp]) {
    gen_branch(s, stm, "beq", operands)
}

fn match_bne(stm: &Stm) -> Option<Vec<&Exp>> {
    relation_operands(stm, RelOp::Ne)
}

fn gen_bne(s: &mut Selector, stm: &Stm, operands: &[&Exp]) {
    gen_branch(s, stm, "bne", operands)
}

fn match_bltz(stm: &Stm) -> Option<Vec<&Exp>> {
    zero_relation_operand(stm, RelOp::Lt)
}

fn gen_bltz(s: &mut Selector, stm: &Stm, operands: &[&Exp]) {
    gen_branch(s, stm, "bltz", operands)
}

fn match_bgez(stm: &Stm) -> Option<Vec<&Exp>> {
    zero_relation_operand(stm, RelOp::Ge)
}

fn gen_bgez(s: &mut Selector, stm: &Stm, operands: &[&Exp]) {
    gen_branch(s, stm, "bgez", operands)
}

fn match_bgtz(stm: &Stm) -> Option<Vec<&Exp>> {
    zero_relation_operand(stm, RelOp::Gt)
}

fn gen_bgtz(s: &mut Selector, stm: &Stm, operands: &[&Exp]) {
    gen_branch(s, stm, "bgtz", operands)
}

fn match_blez(stm: &Stm) -> Option<Vec<&Exp>> {
    zero_relation_operand(stm, RelOp::Le)
}

fn gen_blez(s: &mut Selector, stm: &Stm, operands: &[&Exp]) {
    gen_branch(s, stm, "blez", operands)
}

fn match_blt(stm: &Stm) -> Option<Vec<&Exp>> {
    relation_operands(stm, RelOp::Lt)
}

fn gen_blt(s: &mut Selector, stm: &Stm, operands: &[&Exp]) {
    gen_set_less_branch(s, stm, operands, false, true)
}

fn match_bge(stm: &Stm) -> Option<Vec<&Exp>> {
    relation_operands(stm, RelOp::Ge)
}

fn gen_bge(s: &mut Selector, stm: &Stm, operands: &[&Exp]) {
    gen_set_less_branch(s, stm, operands, false, false)
}

fn match_bgt(stm: &Stm) -> Option<Vec<&Exp>> {
    relation_operands(stm, RelOp::Gt)
}

fn gen_bgt(s: &mut Selector, stm: &Stm, operands: &[&Exp]) {
    gen_set_less_branch(s, stm, operands, true, true)
}

fn match_ble(stm: &Stm) -> Option<Vec<&Exp>> {
    relation_operands(stm, RelOp::Le)
}

fn gen_ble(s: &mut Selector, stm: &Stm, operands: &[&Exp]) {
    gen_set_less_branch(s, stm, operands, true, false)
}
