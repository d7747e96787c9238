use super::*;

#[test]
fn factory_hands_out_fresh_names() {
    let mut temps = TempFactory::new(32);
    assert_eq!(Temp::new(32), temps.new_temp());
    assert_eq!(Temp::new(33), temps.new_temp());
    assert_eq!(34, temps.peek_temp());
    assert_eq!(Label::from("L0"), temps.new_label());
    assert_eq!(Label::from("L1"), temps.new_label());
    assert_eq!(Label::from("malloc"), temps.named_label("malloc"));
}

#[test]
fn holes_never_equal_labels() {
    let mut temps = TempFactory::new(32);
    let hole = temps.new_hole();
    assert!(hole.is_hole());
    assert_ne!(Label::from("L0"), hole);
    assert_eq!("?L0", hole.to_string());
    assert_eq!("L0", hole.as_ref());
    assert_eq!(Label::from("L1"), temps.new_label());
}

#[test]
fn prints_trees_on_one_line() {
    let stm = Stm::seq(
        Stm::Move(
            Exp::Temp(Temp::new(40)),
            Exp::plus(Exp::mem(Exp::Temp(Temp::new(30))), Exp::Const(4)),
        ),
        Stm::CJump(
            RelOp::Lt,
            Exp::call(Exp::Name("f".into()), vec![Exp::Const(1)]),
            Exp::Const(0),
            "L1".into(),
            "L2".into(),
        ),
    );
    assert_eq!(
        "SEQ(MOVE(TEMP t40, BINOP(PLUS, MEM(TEMP t30), CONST 4)), \
         CJUMP(LT, CALL(NAME f, CONST 1), CONST 0, L1, L2))",
        stm.to_string()
    );
}

#[test]
fn seq_all_nests_to_the_right() {
    let a = Stm::Label("a".into());
    let b = Stm::Label("b".into());
    let c = Stm::Label("c".into());
    assert_eq!(
        Stm::seq(a.clone(), Stm::seq(b.clone(), c.clone())),
        Stm::seq_all([a.clone(), b, c])
    );
    assert_eq!(a.clone(), Stm::seq_all([a]));
    assert_eq!(Stm::Exp(Exp::Const(0)), Stm::seq_all(Vec::new()));
}

#[test]
fn visits_every_label_slot() {
    let mut stm = Stm::seq(
        Stm::jump_to("x".into()),
        Stm::CJump(
            RelOp::Eq,
            Exp::Name("x".into()),
            Exp::Const(0),
            "x".into(),
            "y".into(),
        ),
    );
    let mut count = 0;
    stm.for_each_label_mut(&mut |label| {
        if label.as_ref() == "x" {
            *label = Label::from("z");
            count += 1;
        }
    });
    assert_eq!(4, count);
    assert_eq!(
        "SEQ(JUMP(NAME z), CJUMP(EQ, NAME z, CONST 0, z, y))",
        stm.to_string()
    );
}

#[test]
fn relops_negate_and_commute() {
    for op in [
        RelOp::Eq,
        RelOp::Ne,
        RelOp::Lt,
        RelOp::Le,
        RelOp::Gt,
        RelOp::Ge,
    ] {
        for (l, r) in [(1, 2), (2, 2), (3, 2)] {
            assert_eq!(!op.eval(l, r), op.negate().eval(l, r));
            assert_eq!(op.eval(l, r), op.commute().eval(r, l));
        }
    }
}
