use crate::{codegen, settings::Settings, util::Ice};
use mips_ir::{
    self as mir,
    dfa::liveness::{LiveSets, NodeLiveness},
    flow::{FlowError, FlowGraph, UnresolvedJumps},
    Fragment,
};
use thiserror::Error;
use tree_ir::{Stm, TempFactory};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// The selected instructions of every procedure, and the string fragments.
    Assembly,
    /// Like `Assembly`, with the temporaries live in and out of every instruction.
    Liveness,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OutputFormat::Assembly => "assembly",
            OutputFormat::Liveness => "liveness",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone)]
pub struct CompileOpts {
    output_format: OutputFormat,
    settings: Settings,
}

impl CompileOpts {
    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptsBuilder {
    output_format: Option<OutputFormat>,
    use_register_names: bool,
    unresolved_jumps: UnresolvedJumps,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileOptsErr {
    #[error("No output format was chosen.")]
    MissingOutputFormat,
}

impl CompileOptsBuilder {
    /// Numbered registers, rejecting unresolved jumps. An output format must still be chosen.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn use_register_names(mut self, use_register_names: bool) -> Self {
        self.use_register_names = use_register_names;
        self
    }

    pub fn unresolved_jumps(mut self, policy: UnresolvedJumps) -> Self {
        self.unresolved_jumps = policy;
        self
    }

    pub fn build(self) -> Result<CompileOpts, CompileOptsErr> {
        let output_format = self
            .output_format
            .ok_or(CompileOptsErr::MissingOutputFormat)?;
        let settings = Settings {
            use_register_names: self.use_register_names,
            unresolved_jumps: self.unresolved_jumps,
        };
        Ok(CompileOpts {
            output_format,
            settings,
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("in procedure `{procedure}`: {source}")]
    Flow {
        procedure: String,
        #[source]
        source: FlowError,
    },
}

/// Turns the body of a procedure into the statement list instruction selection expects: no
/// `SEQ` or `ESEQ` left, every `CJUMP` followed by its false label and every `JUMP` to a `NAME`.
pub trait Canonicalize {
    fn canonicalize(&mut self, body: Stm, temps: &mut TempFactory) -> Vec<Stm>;
}

/// The instructions selected for one procedure, with the liveness of each.
#[derive(Debug, Clone)]
pub struct ProcOutput {
    pub instrs: Vec<mir::Instr>,
    /// Indexed like `instrs`; `None` for labels, which are no flow-graph nodes.
    pub liveness: Vec<Option<NodeLiveness>>,
    /// Number of passes the liveness analysis took to reach its fixed point.
    pub passes: usize,
}

pub fn compile_procedure(
    frame: &mir::Frame,
    stms: &[Stm],
    temps: &mut TempFactory,
    opts: &CompileOpts,
) -> Result<ProcOutput, FlowError> {
    let instrs = codegen::codegen(frame, stms, temps);
    let (liveness, passes) = analyze(&instrs, &opts.settings, |graph, live| {
        let liveness = (0..instrs.len())
            .map(|index| graph.node_of(index).map(|node| live[node].clone()))
            .collect();
        (liveness, live.passes())
    })?;
    Ok(ProcOutput {
        instrs,
        liveness,
        passes,
    })
}

/// Builds the flow graph of `instrs` and solves liveness over it.
fn analyze<R>(
    instrs: &[mir::Instr],
    settings: &Settings,
    f: impl FnOnce(&FlowGraph, &LiveSets) -> R,
) -> Result<R, FlowError> {
    let graph = FlowGraph::build(instrs, settings.unresolved_jumps)?;
    let live = LiveSets::build_from(&graph);
    Ok(f(&graph, &live))
}

/// Compiles every fragment, in order, to one assembly listing.
pub fn compile_fragments(
    fragments: &[Fragment],
    canonicalizer: &mut impl Canonicalize,
    temps: &mut TempFactory,
    opts: &CompileOpts,
) -> Result<String, CompileError> {
    let config = mir::MipsOutputConfig {
        use_register_names: opts.settings.use_register_names,
    };
    let mut output = String::new();

    for fragment in fragments {
        match fragment {
            Fragment::Str { label, text } => {
                mir::MipsOutputter::new(&mut output)
                    .with_config(config.clone())
                    .write_string(label, text)
                    .ice();
            }
            Fragment::Proc { body, frame } => {
                let stms = canonicalizer.canonicalize(body.clone(), temps);
                let instrs = codegen::codegen(frame, &stms, temps);
                let res = match opts.output_format {
                    OutputFormat::Assembly => {
                        mir::MipsOutputter::new(&mut output)
                            .with_config(config.clone())
                            .write_procedure(frame.name(), &instrs)
                            .ice();
                        Ok(())
                    }
                    OutputFormat::Liveness => analyze(&instrs, &opts.settings, |graph, live| {
                        mir::MipsOutputter::new(&mut output)
                            .with_config(config.clone())
                            .write_liveness(frame.name(), &instrs, graph, live)
                            .ice();
                    }),
                };
                res.map_err(|source| CompileError::Flow {
                    procedure: frame.name().to_string(),
                    source,
                })?;
            }
        }
    }

    Ok(output)
}
