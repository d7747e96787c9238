use tree_ir::{Label, Temp};
use vec1::Vec1;

/// A selected machine instruction, with its operands still abstract.
///
/// Templates refer to their operands positionally: `` `d0`` is the first defined temporary,
/// `` `s1`` the second used one and `` `j0`` the first jump target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// Any instruction. If `jumps` is `Some`, control continues at one of the listed labels and
    /// never falls through.
    Oper {
        assem: String,
        dst: Vec<Temp>,
        src: Vec<Temp>,
        jumps: Option<Vec1<Label>>,
    },
    /// A pseudo-instruction marking a position in the instruction stream.
    Label { assem: String, label: Label },
    /// A register to register copy, which a register allocator may coalesce away.
    Move { assem: String, dst: Temp, src: Temp },
}

impl Instr {
    pub fn assem(&self) -> &str {
        match self {
            Instr::Oper { assem, .. } | Instr::Label { assem, .. } | Instr::Move { assem, .. } => {
                assem
            }
        }
    }

    /// Temporaries written by this instruction. Panics on a label.
    pub fn defs(&self) -> &[Temp] {
        match self {
            Instr::Oper { dst, .. } => dst,
            Instr::Move { dst, .. } => std::slice::from_ref(dst),
            Instr::Label { label, .. } => {
                panic!("ICE: label `{label}` has no definitions")
            }
        }
    }

    /// Temporaries read by this instruction. Panics on a label.
    pub fn uses(&self) -> &[Temp] {
        match self {
            Instr::Oper { src, .. } => src,
            Instr::Move { src, .. } => std::slice::from_ref(src),
            Instr::Label { label, .. } => panic!("ICE: label `{label}` has no uses"),
        }
    }

    pub fn jumps(&self) -> Option<&Vec1<Label>> {
        match self {
            Instr::Oper { jumps, .. } => jumps.as_ref(),
            _ => None,
        }
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Instr::Label { .. })
    }

    pub fn is_move(&self) -> bool {
        matches!(self, Instr::Move { .. })
    }

    /// Substitutes the operand placeholders of the template, naming temporaries with `name`.
    pub fn format(&self, name: impl Fn(Temp) -> String) -> String {
        let (dst, src, jumps): (&[Temp], &[Temp], &[Label]) = match self {
            Instr::Oper {
                dst, src, jumps, ..
            } => {
                let jumps = jumps.as_ref().map_or(&[][..], |jumps| jumps.as_slice());
                (dst, src, jumps)
            }
            Instr::Label { .. } => (&[][..], &[][..], &[][..]),
            Instr::Move { dst, src, .. } => (
                std::slice::from_ref(dst),
                std::slice::from_ref(src),
                &[][..],
            ),
        };

        let assem = self.assem();
        let mut out = String::with_capacity(assem.len());
        let mut chars = assem.char_indices().peekable();
        while let Some((_, c)) = chars.next() {
            if c != '`' {
                out.push(c);
                continue;
            }
            let Some((kind_at, kind)) = chars.next() else {
                panic!("ICE: dangling placeholder in `{assem}`");
            };
            if kind == '`' {
                out.push('`');
                continue;
            }
            let digits_start = kind_at + kind.len_utf8();
            let mut digits_end = digits_start;
            while let Some(&(i, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits_end = i + d.len_utf8();
                chars.next();
            }
            let index: usize = assem[digits_start..digits_end]
                .parse()
                .unwrap_or_else(|_| panic!("ICE: placeholder without index in `{assem}`"));
            match kind {
                'd' => out.push_str(&name(dst[index])),
                's' => out.push_str(&name(src[index])),
                'j' => out.push_str(jumps[index].as_ref()),
                _ => panic!("ICE: unknown placeholder `{kind}` in `{assem}`"),
            }
        }
        out
    }
}

/// Constructors for the instruction shapes the selector emits.
pub mod instr {
    use super::Instr;
    use tree_ir::{Label, Temp};
    use vec1::Vec1;

    /// An instruction that doesn't jump.
    pub fn oper(assem: impl Into<String>, dst: Vec<Temp>, src: Vec<Temp>) -> Instr {
        Instr::Oper {
            assem: assem.into(),
            dst,
            src,
            jumps: None,
        }
    }

    /// An instruction that continues at one of `jumps`.
    pub fn branch(assem: impl Into<String>, src: Vec<Temp>, jumps: Vec1<Label>) -> Instr {
        Instr::Oper {
            assem: assem.into(),
            dst: Vec::new(),
            src,
            jumps: Some(jumps),
        }
    }

    pub fn label(label: Label) -> Instr {
        Instr::Label {
            assem: format!("{label}:"),
            label,
        }
    }

    /// `move dst, src`
    pub fn mov(dst: Temp, src: Temp) -> Instr {
        Instr::Move {
            assem: "move `d0, `s0".to_owned(),
            dst,
            src,
        }
    }
}
