mod common;

use common::{init_logger, Linearizer};
use comp_lib::{
    compile::{
        compile_fragments, compile_procedure, Canonicalize, CompileOpts, CompileOptsBuilder,
        CompileOptsErr, OutputFormat,
    },
    settings::UnresolvedJumps,
    translate::{Oper, Translator},
};
use mips_ir::{flow::FlowError, Fragment, Frame, Reg};
use pretty_assertions::assert_eq;
use tree_ir::{Stm, Temp, TempFactory};

fn opts(format: OutputFormat) -> CompileOpts {
    CompileOptsBuilder::new()
        .output_format(format)
        .use_register_names(true)
        .build()
        .unwrap()
}

/// `function inc(x: int): int = x + 1`
fn inc_program() -> (Vec<Fragment>, TempFactory) {
    let mut tr = Translator::new();
    let inc = tr.new_level(tr.outermost(), "inc".into(), &[false]);
    let x = tr.formals(inc)[0];
    let x = tr.simple_var(x, inc);
    let one = tr.constant(1);
    let body = tr.op(Oper::Plus, x, one);
    tr.proc_entry_exit(inc, body);
    tr.finish()
}

/// ```text
/// function count(n: int): int =
///     let var i := 0 in (while i < n do i := i + 1; i) end
/// ```
fn count_program() -> (Vec<Fragment>, TempFactory) {
    let mut tr = Translator::new();
    let count = tr.new_level(tr.outermost(), "count".into(), &[false]);
    let n = tr.formals(count)[0];
    let i = tr.alloc_local(count, false);

    let var_i = tr.simple_var(i, count);
    let zero = tr.constant(0);
    let init = tr.assign(var_i, zero);

    let var_i = tr.simple_var(i, count);
    let var_n = tr.simple_var(n, count);
    let test = tr.op(Oper::Lt, var_i, var_n);

    let var_i = tr.simple_var(i, count);
    let one = tr.constant(1);
    let inc = tr.op(Oper::Plus, var_i, one);
    let var_i = tr.simple_var(i, count);
    let body = tr.assign(var_i, inc);

    let done = tr.new_label();
    let lp = tr.while_loop(test, body, done);
    let stms = tr.stmt_seq(init, lp);
    let var_i = tr.simple_var(i, count);
    let result = tr.seq(stms, var_i);
    tr.proc_entry_exit(count, result);
    tr.finish()
}

fn single_proc(fragments: &[Fragment]) -> (&Stm, &Frame) {
    match fragments {
        [Fragment::Proc { body, frame }] => (body, frame),
        _ => panic!("expected a single procedure"),
    }
}

#[test]
fn assembly_of_simple_function() {
    init_logger();
    let (fragments, mut temps) = inc_program();
    let output = compile_fragments(
        &fragments,
        &mut Linearizer,
        &mut temps,
        &opts(OutputFormat::Assembly),
    )
    .unwrap();
    assert_eq!(
        "inc:\n\
         \tsw $a0, -4($fp)\n\
         \tmove t32, $a1\n\
         \taddi t33, t32, 1\n\
         \tmove $v0, t33\n",
        output
    );
}

#[test]
fn numbered_registers() {
    init_logger();
    let (fragments, mut temps) = inc_program();
    let opts = CompileOptsBuilder::new()
        .output_format(OutputFormat::Assembly)
        .build()
        .unwrap();
    let output = compile_fragments(&fragments, &mut Linearizer, &mut temps, &opts).unwrap();
    assert_eq!(
        "inc:\n\
         \tsw $4, -4($30)\n\
         \tmove t32, $5\n\
         \taddi t33, t32, 1\n\
         \tmove $2, t33\n",
        output
    );
}

#[test]
fn call_passes_static_link_and_arguments() {
    init_logger();
    let mut tr = Translator::new();
    let main = tr.new_level(tr.outermost(), "main".into(), &[]);
    let f = tr.new_level(main, "f".into(), &[false]);
    let five = tr.constant(5);
    let call = tr.function_call(f, main, vec![five], false);
    tr.proc_entry_exit(main, call);
    let (fragments, mut temps) = tr.finish();

    let output = compile_fragments(
        &fragments,
        &mut Linearizer,
        &mut temps,
        &opts(OutputFormat::Assembly),
    )
    .unwrap();
    assert_eq!(
        "main:\n\
         \tsw $a0, -4($fp)\n\
         \tli t33, 5\n\
         \tmove $a0, $fp\n\
         \tmove $a1, t33\n\
         \tjal f\n\
         \tmove t34, $v0\n\
         \tmove $v0, t34\n",
        output
    );
}

#[test]
fn strings_are_emitted_as_data() {
    init_logger();
    let mut tr = Translator::new();
    tr.string("say \"hi\"\n");
    let (fragments, mut temps) = tr.finish();

    let output = compile_fragments(
        &fragments,
        &mut Linearizer,
        &mut temps,
        &opts(OutputFormat::Assembly),
    )
    .unwrap();
    assert_eq!("L0:\n\t.asciiz\t\"say \\\"hi\\\"\\n\"\n", output);
}

#[test]
fn liveness_of_simple_function() {
    init_logger();
    let (fragments, mut temps) = inc_program();
    let (body, frame) = single_proc(&fragments);
    let stms = Linearizer.canonicalize(body.clone(), &mut temps);
    let out = compile_procedure(frame, &stms, &mut temps, &opts(OutputFormat::Liveness)).unwrap();

    let assem: Vec<&str> = out.instrs.iter().map(|i| i.assem()).collect();
    assert_eq!(
        vec![
            "sw `s0, -4(`s1)",
            "move `d0, `s0",
            "addi `d0, `s0, 1",
            "move `d0, `s0",
            ""
        ],
        assem
    );
    assert!(out.instrs[1].is_move());

    let live = |index: usize| out.liveness[index].as_ref().unwrap();
    let x = Temp::new(32);
    let sum = Temp::new(33);
    let [a0, a1, fp, rv, s0] = [Reg::A0, Reg::A1, Reg::FP, Reg::RV, Reg::S0].map(Temp::from);

    assert!(live(0).live_in.contains(a0));
    assert!(live(0).live_in.contains(a1));
    assert!(live(0).live_in.contains(fp));
    assert!(!live(0).live_in.contains(x));

    assert!(live(2).live_in.contains(x));
    assert!(!live(2).live_in.contains(rv));
    assert!(live(2).live_out.contains(sum));
    assert!(!live(2).live_out.contains(x));

    assert!(live(3).live_out.contains(rv));
    assert!(live(3).live_out.contains(s0));
    assert!(live(4).live_out.is_empty());
    assert!(out.passes >= 2);
}

#[test]
fn loop_keeps_its_variables_live() {
    init_logger();
    let (fragments, mut temps) = count_program();
    let (body, frame) = single_proc(&fragments);
    let stms = Linearizer.canonicalize(body.clone(), &mut temps);
    let out = compile_procedure(frame, &stms, &mut temps, &opts(OutputFormat::Liveness)).unwrap();

    let n = Temp::new(32);
    let i = Temp::new(33);
    let back_jump = out
        .instrs
        .iter()
        .position(|instr| instr.assem().starts_with("j "))
        .unwrap();
    let live = out.liveness[back_jump].as_ref().unwrap();
    assert!(live.live_out.contains(i));
    assert!(live.live_out.contains(n));
    assert!(out.passes > 1);

    // Labels are no nodes.
    for (instr, live) in out.instrs.iter().zip(&out.liveness) {
        assert_eq!(instr.is_label(), live.is_none());
    }
}

#[test]
fn liveness_listing_annotates_every_node() {
    init_logger();
    let (fragments, mut temps) = count_program();
    let output = compile_fragments(
        &fragments,
        &mut Linearizer,
        &mut temps,
        &opts(OutputFormat::Liveness),
    )
    .unwrap();

    let (fragments, mut temps) = count_program();
    let (body, frame) = single_proc(&fragments);
    let stms = Linearizer.canonicalize(body.clone(), &mut temps);
    let out = compile_procedure(frame, &stms, &mut temps, &opts(OutputFormat::Liveness)).unwrap();
    let nodes = out.instrs.iter().filter(|i| !i.is_label()).count();

    assert!(output.starts_with("count:\n"));
    assert_eq!(nodes, output.matches("\t\tIN:").count());
    assert_eq!(nodes, output.matches("\t\tOUT:").count());
    assert!(output.contains("\t<sink>\n"));
}

#[test]
fn unresolved_jump_is_rejected() {
    init_logger();
    let mut temps = mips_ir::temp_factory();
    let frame = Frame::new("p".into(), &[], &mut temps);
    let stms = [Stm::jump_to("nowhere".into())];

    let err = compile_procedure(&frame, &stms, &mut temps, &opts(OutputFormat::Assembly))
        .unwrap_err();
    assert_eq!(
        FlowError::UnresolvedLabel {
            label: "nowhere".into(),
            instr: "j nowhere".to_owned(),
        },
        err
    );
}

#[test]
fn unresolved_jump_can_be_ignored() {
    init_logger();
    let mut temps = mips_ir::temp_factory();
    let frame = Frame::new("p".into(), &[], &mut temps);
    let stms = [Stm::jump_to("nowhere".into())];
    let opts = CompileOptsBuilder::new()
        .output_format(OutputFormat::Liveness)
        .unresolved_jumps(UnresolvedJumps::Ignore)
        .build()
        .unwrap();

    let out = compile_procedure(&frame, &stms, &mut temps, &opts).unwrap();
    let jump = out.liveness[0].as_ref().unwrap();
    assert!(jump.live_in.is_empty());
    assert!(jump.live_out.is_empty());
}

#[test]
fn unresolved_jump_fails_the_listing() {
    init_logger();
    let mut tr = Translator::new();
    let p = tr.new_level(tr.outermost(), "p".into(), &[]);
    let nowhere = tr.new_label();
    let jump = tr.break_(nowhere);
    let zero = tr.constant(0);
    let body = tr.seq(jump, zero);
    tr.proc_entry_exit(p, body);
    let (fragments, mut temps) = tr.finish();

    let err = compile_fragments(
        &fragments,
        &mut Linearizer,
        &mut temps,
        &opts(OutputFormat::Liveness),
    )
    .unwrap_err();
    assert_eq!(
        "in procedure `p`: `j L0` jumps to label `L0`, which isn't defined",
        err.to_string()
    );
}

#[test]
fn output_format_is_required() {
    assert_eq!(
        CompileOptsErr::MissingOutputFormat,
        CompileOptsBuilder::new().build().unwrap_err()
    );
    assert_eq!("liveness", OutputFormat::Liveness.to_string());
}
