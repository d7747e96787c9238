use super::*;
use mips_ir::instr;
use tree_ir::BinOp;

fn match_leaf(exp: &Exp) -> Option<Vec<&Exp>> {
    matches!(exp, Exp::Const(_) | Exp::Temp(_)).then(Vec::new)
}

fn gen_first(s: &mut Selector, _: &Exp, _: &[&Exp]) -> Temp {
    s.emit(instr::oper("first", vec![], vec![]));
    s.new_temp()
}

fn gen_second(s: &mut Selector, _: &Exp, _: &[&Exp]) -> Temp {
    s.emit(instr::oper("second", vec![], vec![]));
    s.new_temp()
}

fn match_add(exp: &Exp) -> Option<Vec<&Exp>> {
    match exp {
        Exp::BinOp(BinOp::Plus, l, r) => Some(vec![&**l, &**r]),
        _ => None,
    }
}

fn gen_add(s: &mut Selector, _: &Exp, operands: &[&Exp]) -> Temp {
    let l = s.munch_exp(operands[0]);
    let r = s.munch_exp(operands[1]);
    let d = s.new_temp();
    s.emit(instr::oper("add `d0, `s0, `s1", vec![d], vec![l, r]));
    d
}

fn match_exp(stm: &Stm) -> Option<Vec<&Exp>> {
    match stm {
        Stm::Exp(exp) => Some(vec![exp]),
        _ => None,
    }
}

fn gen_exp(s: &mut Selector, _: &Stm, operands: &[&Exp]) {
    s.munch_exp(operands[0]);
}

fn match_store(stm: &Stm) -> Option<Vec<&Exp>> {
    match stm {
        Stm::Move(Exp::Mem(addr), src) => Some(vec![&**addr, src]),
        _ => None,
    }
}

fn gen_store(s: &mut Selector, _: &Stm, operands: &[&Exp]) {
    let addr = s.munch_exp(operands[0]);
    let value = s.munch_exp(operands[1]);
    s.emit(instr::oper("store", vec![], vec![value, addr]));
}

fn exp_tile(name: &'static str, matcher: ExpMatcher, gen: ExpGen, cost: u32) -> Pattern {
    Pattern::Exp(ExpTile {
        name,
        matcher,
        gen,
        cost,
    })
}

fn stm_tile(name: &'static str, matcher: StmMatcher, gen: StmGen, cost: u32) -> Pattern {
    Pattern::Stm(StmTile {
        name,
        matcher,
        gen,
        cost,
    })
}

fn assems(instrs: &[mir::Instr]) -> Vec<&str> {
    instrs.iter().map(mir::Instr::assem).collect()
}

#[test]
fn equal_cost_keeps_the_first_registered_pattern() {
    let exp_stm = stm_tile("exp", match_exp, gen_exp, 0);
    let first = exp_tile("first", match_leaf, gen_first, 1);
    let second = exp_tile("second", match_leaf, gen_second, 1);
    let stms = [Stm::Exp(Exp::Const(7))];

    let instrs = select_all(&[exp_stm, first, second], &stms, &mut TempFactory::new(0));
    assert_eq!(vec!["first"], assems(&instrs));

    let instrs = select_all(&[exp_stm, second, first], &stms, &mut TempFactory::new(0));
    assert_eq!(vec!["second"], assems(&instrs));
}

#[test]
fn cheaper_later_pattern_wins() {
    let patterns = [
        stm_tile("exp", match_exp, gen_exp, 0),
        exp_tile("first", match_leaf, gen_first, 2),
        exp_tile("second", match_leaf, gen_second, 1),
    ];
    let instrs = select_all(
        &patterns,
        &[Stm::Exp(Exp::Const(7))],
        &mut TempFactory::new(0),
    );
    assert_eq!(vec!["second"], assems(&instrs));
}

#[test]
fn cost_adds_operand_costs() {
    let patterns = [
        stm_tile("exp", match_exp, gen_exp, 0),
        exp_tile("leaf", match_leaf, gen_first, 1),
        exp_tile("add", match_add, gen_add, 1),
    ];
    let tree = Stm::Exp(Exp::plus(
        Exp::Const(1),
        Exp::plus(Exp::Const(2), Exp::Const(3)),
    ));
    let mut temps = TempFactory::new(0);
    let mut selector = Selector::new(&patterns, &mut temps);
    assert_eq!(5, selector.cost_of(&tree));
    selector.select(&tree);
    assert_eq!(
        vec![
            "first",
            "first",
            "first",
            "add `d0, `s0, `s1",
            "add `d0, `s0, `s1"
        ],
        assems(&selector.finish())
    );
}

#[test]
fn move_destination_is_not_selected_as_a_value() {
    // There is no tile for a MEM read, only for the store.
    let patterns = [
        stm_tile("store", match_store, gen_store, 1),
        exp_tile("leaf", match_leaf, gen_first, 0),
    ];
    let stm = Stm::Move(Exp::mem(Exp::Temp(Temp::new(1))), Exp::Temp(Temp::new(2)));
    let instrs = select_all(&patterns, &[stm], &mut TempFactory::new(0));
    assert_eq!(vec!["first", "first", "store"], assems(&instrs));
}

#[test]
#[should_panic = "ICE: no pattern matches expression `NAME f`"]
fn unmatched_node_is_fatal() {
    let patterns = [stm_tile("exp", match_exp, gen_exp, 0)];
    select_all(
        &patterns,
        &[Stm::Exp(Exp::Name("f".into()))],
        &mut TempFactory::new(0),
    );
}

#[test]
#[should_panic = "ICE: ESEQ reached instruction selection"]
fn eseq_is_fatal() {
    let patterns = [stm_tile("exp", match_exp, gen_exp, 0)];
    let eseq = Exp::eseq(Stm::Label("l".into()), Exp::Const(0));
    select_all(&patterns, &[Stm::Exp(eseq)], &mut TempFactory::new(0));
}

#[test]
#[should_panic = "ICE: SEQ reached instruction selection"]
fn seq_is_fatal() {
    let patterns = [stm_tile("exp", match_exp, gen_exp, 0)];
    let seq = Stm::seq(Stm::Label("a".into()), Stm::Label("b".into()));
    select_all(&patterns, &[seq], &mut TempFactory::new(0));
}
