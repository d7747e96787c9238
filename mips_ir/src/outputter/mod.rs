
use crate::{
    dfa::liveness::{LiveSet, LiveSets},
    flow::FlowGraph,
    reg::temp_name,
    Instr,
};
use std::fmt::Result;
use tree_ir::{Label, Temp};

#[derive(Debug, Clone, Default)]
pub struct MipsOutputConfig {
    /// If `true`, registers will be named (`$sp`, `$a0`) instead of numbered (`$29`, `$4`).
    pub use_register_names: bool,
}

/// Formats selected instructions and fragments to a writer.
///
/// A mutable reference to the writer---an implementor of [`std::fmt::Write`]---must be passed to
/// [`new`](Self::new). Some configuration is possible by passing a [`MipsOutputConfig`] to
/// [`with_config`](Self::with_config).
///
/// Virtual temporaries are printed as `tN`; the output is only assemblable once a register
/// allocator has replaced them. Instructions with an empty template (the procedure-exit sink)
/// only exist for liveness and are not printed.
pub struct MipsOutputter<'w, W: std::fmt::Write> {
    writer: &'w mut W,
    config: MipsOutputConfig,
}

impl<'w, W: std::fmt::Write> MipsOutputter<'w, W> {
    pub fn new(writer: &'w mut W) -> Self {
        Self {
            writer,
            config: Default::default(),
        }
    }

    pub fn with_config(self, config: MipsOutputConfig) -> Self {
        Self { config, ..self }
    }

    pub fn write_procedure(&mut self, name: &Label, instrs: &[Instr]) -> Result {
        self.write_label(name)?;
        self.write_instrs(instrs)
    }

    pub fn write_instrs(&mut self, instrs: &[Instr]) -> Result {
        for instr in instrs {
            self.write_instr(instr)?;
        }
        Ok(())
    }

    pub fn write_instr(&mut self, instr: &Instr) -> Result {
        match instr {
            Instr::Label { label, .. } => self.write_label(label),
            _ if instr.assem().is_empty() => Ok(()),
            _ => {
                let text = self.format(instr);
                writeln!(self.writer, "\t{text}")
            }
        }
    }

    /// Writes the instructions of a procedure, each followed by the temporaries live on entry
    /// to and exit from it.
    pub fn write_liveness(
        &mut self,
        name: &Label,
        instrs: &[Instr],
        graph: &FlowGraph,
        live: &LiveSets,
    ) -> Result {
        self.write_label(name)?;
        for (index, instr) in instrs.iter().enumerate() {
            let Some(node) = graph.node_of(index) else {
                self.write_instr(instr)?;
                continue;
            };
            if instr.assem().is_empty() {
                self.writer.write_str("\t<sink>\n")?;
            } else {
                self.write_instr(instr)?;
            }
            self.write_str("\t\tIN:")?;
            self.write_temps(live.live_in(node))?;
            self.write_str("\t\tOUT:")?;
            self.write_temps(live.live_out(node))?;
        }
        Ok(())
    }

    pub fn write_string(&mut self, label: &Label, text: &str) -> Result {
        self.write_label(label)?;
        self.write_str("\t.asciiz\t\"")?;
        for c in text.chars() {
            match c {
                '"' => self.write_str("\\\"")?,
                '\\' => self.write_str("\\\\")?,
                '\n' => self.write_str("\\n")?,
                '\t' => self.write_str("\\t")?,
                c => self.writer.write_char(c)?,
            }
        }
        self.write_str("\"\n")
    }

    fn write_temps(&mut self, temps: &LiveSet) -> Result {
        for temp in temps {
            let name = self.name(temp);
            write!(self.writer, " {name}")?;
        }
        self.writeln()
    }

    fn format(&self, instr: &Instr) -> String {
        instr.format(|temp| self.name(temp))
    }

    fn name(&self, temp: Temp) -> String {
        temp_name(temp, self.config.use_register_names)
    }

    fn write_label(&mut self, label: &Label) -> Result {
        writeln!(self.writer, "{label}:")
    }

    fn write_str(&mut self, s: &str) -> Result {
        self.writer.write_str(s)
    }

    fn writeln(&mut self) -> Result {
        self.writer.write_char('\n')
    }
}
