//! Shared helpers for the pipeline tests.

#![allow(dead_code)]

use comp_lib::compile::Canonicalize;
use tree_ir::{Exp, Label, Stm, TempFactory};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A small canonicalizer, standing in for the real one in tests.
///
/// Flattens `SEQ`s, lifts `ESEQ`s and nested calls out of expressions (saving earlier operands in
/// fresh temporaries when a later one has effects), and makes every `CJUMP` fall through to its
/// false label. It doesn't build basic blocks or schedule traces.
pub struct Linearizer;

impl Canonicalize for Linearizer {
    fn canonicalize(&mut self, body: Stm, temps: &mut TempFactory) -> Vec<Stm> {
        let mut stms = Vec::new();
        linearize_stm(body, temps, &mut stms);
        fall_through_false(stms, temps)
    }
}

fn linearize_stm(stm: Stm, temps: &mut TempFactory, out: &mut Vec<Stm>) {
    match stm {
        Stm::Seq(first, second) => {
            linearize_stm(*first, temps, out);
            linearize_stm(*second, temps, out);
        }
        Stm::Label(_) => out.push(stm),
        Stm::Jump(target, labels) => {
            let [target] = reorder([target], temps, out);
            out.push(Stm::Jump(target, labels));
        }
        Stm::CJump(op, l, r, t, f) => {
            let [l, r] = reorder([l, r], temps, out);
            out.push(Stm::CJump(op, l, r, t, f));
        }
        Stm::Move(Exp::Temp(dst), Exp::Call(fun, args)) => {
            let (fun, args) = reorder_call(*fun, args, temps, out);
            out.push(Stm::Move(Exp::Temp(dst), Exp::call(fun, args)));
        }
        Stm::Move(Exp::Temp(dst), src) => {
            let [src] = reorder([src], temps, out);
            out.push(Stm::Move(Exp::Temp(dst), src));
        }
        Stm::Move(Exp::Mem(addr), src) => {
            let [addr, src] = reorder([*addr, src], temps, out);
            out.push(Stm::Move(Exp::mem(addr), src));
        }
        Stm::Move(Exp::ESeq(stm, dst), src) => {
            linearize_stm(*stm, temps, out);
            linearize_stm(Stm::Move(*dst, src), temps, out);
        }
        Stm::Move(dst, _) => panic!("can't move into `{dst}`"),
        Stm::Exp(Exp::Call(fun, args)) => {
            let (fun, args) = reorder_call(*fun, args, temps, out);
            out.push(Stm::Exp(Exp::call(fun, args)));
        }
        Stm::Exp(exp) => {
            let [exp] = reorder([exp], temps, out);
            if !matches!(exp, Exp::Const(_) | Exp::Name(_) | Exp::Temp(_)) {
                out.push(Stm::Exp(exp));
            }
        }
    }
}

fn reorder_call(
    fun: Exp,
    args: Vec<Exp>,
    temps: &mut TempFactory,
    out: &mut Vec<Stm>,
) -> (Exp, Vec<Exp>) {
    let mut exps = reorder_all(std::iter::once(fun).chain(args).collect(), temps, out);
    let fun = exps.remove(0);
    (fun, exps)
}

fn reorder<const N: usize>(
    exps: [Exp; N],
    temps: &mut TempFactory,
    out: &mut Vec<Stm>,
) -> [Exp; N] {
    reorder_all(Vec::from(exps), temps, out).try_into().unwrap()
}

/// Linearizes `exps` left to right, pushing their effects to `out`. Results that a later
/// expression's effects could change are first saved in temporaries.
fn reorder_all(exps: Vec<Exp>, temps: &mut TempFactory, out: &mut Vec<Stm>) -> Vec<Exp> {
    let mut results: Vec<Exp> = Vec::with_capacity(exps.len());
    for exp in exps {
        let mut effects = Vec::new();
        let exp = linearize_exp(exp, temps, &mut effects);
        if !effects.is_empty() {
            for prev in &mut results {
                if !matches!(prev, Exp::Const(_) | Exp::Name(_)) {
                    let t = Exp::Temp(temps.new_temp());
                    out.push(Stm::Move(t.clone(), std::mem::replace(prev, t)));
                }
            }
            out.extend(effects);
        }
        results.push(exp);
    }
    results
}

fn linearize_exp(exp: Exp, temps: &mut TempFactory, out: &mut Vec<Stm>) -> Exp {
    match exp {
        Exp::Const(_) | Exp::Name(_) | Exp::Temp(_) => exp,
        Exp::BinOp(op, l, r) => {
            let [l, r] = reorder([*l, *r], temps, out);
            Exp::binop(op, l, r)
        }
        Exp::Mem(addr) => {
            let [addr] = reorder([*addr], temps, out);
            Exp::mem(addr)
        }
        Exp::Call(fun, args) => {
            let (fun, args) = reorder_call(*fun, args, temps, out);
            let t = Exp::Temp(temps.new_temp());
            out.push(Stm::Move(t.clone(), Exp::call(fun, args)));
            t
        }
        Exp::ESeq(stm, exp) => {
            linearize_stm(*stm, temps, out);
            linearize_exp(*exp, temps, out)
        }
    }
}

/// Rewrites every `CJUMP` not directly followed by its false label.
fn fall_through_false(stms: Vec<Stm>, temps: &mut TempFactory) -> Vec<Stm> {
    let mut out = Vec::with_capacity(stms.len());
    let mut stms = stms.into_iter().peekable();
    while let Some(stm) = stms.next() {
        let Stm::CJump(op, l, r, t, f) = stm else {
            out.push(stm);
            continue;
        };
        let next = stms.peek();
        if is_label(next, &f) {
            out.push(Stm::CJump(op, l, r, t, f));
        } else if is_label(next, &t) {
            out.push(Stm::CJump(op.negate(), l, r, f, t));
        } else {
            let f2 = temps.new_label();
            out.push(Stm::CJump(op, l, r, t, f2.clone()));
            out.push(Stm::Label(f2));
            out.push(Stm::jump_to(f));
        }
    }
    out
}

fn is_label(stm: Option<&Stm>, label: &Label) -> bool {
    matches!(stm, Some(Stm::Label(l)) if l == label)
}
