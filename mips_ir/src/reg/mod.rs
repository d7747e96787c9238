
use tree_ir::{Temp, TempFactory};

/// A MIPS CPU register.
///
/// Machine registers take part in the tree language as precoloured temporaries: `$n` is the
/// temporary with id `n`. Fresh (virtual) temporaries are numbered from [`Reg::COUNT`] upwards.
///
/// The MIPS registers are conventionally used as follows:
///
/// | register    | name         | preserved? | usage |
/// | ----------- | ------------ | --- | ------------ |
/// |`$0`         |`$zero`       | yes | always zero |
/// |`$1`         |`$at`         | no  | assembler temporary, used by the comparison idioms |
/// |`$2` - `$3`  |`$v0` - `$v1` | no  | function results |
/// |`$4` - `$7`  |`$a0` - `$a3` | no  | function arguments |
/// |`$8` - `$15` |`$t0` - `$t7` | no  | temporaries |
/// |`$16` - `$23`|`$s0` - `$s7` | yes | saved temporaries |
/// |`$24` - `$25`|`$t8` - `$t9` | no  | temporaries |
/// |`$26` - `$27`|`$k0` - `$k1` | no  | reserved for os kernel |
/// |`$28`        |`$gp`         | yes | global pointer |
/// |`$29`        |`$sp`         | yes | stack pointer |
/// |`$30`        |`$fp`         | yes | frame pointer |
/// |`$31`        |`$ra`         | yes | return address (used by e.g. `jal`) |
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reg(u8);

impl Reg {
    /// Number of machine registers, and so the id of the first virtual temporary.
    pub const COUNT: u32 = 32;

    // $zero
    pub const ZERO: Self = Self(0);
    // $at
    pub const AT: Self = Self(1);
    // $v0 - $v1
    pub const V0: Self = Self(2);
    pub const V1: Self = Self(3);
    // $a0 - $a3
    pub const A0: Self = Self(4);
    pub const A1: Self = Self(5);
    pub const A2: Self = Self(6);
    pub const A3: Self = Self(7);
    // $t0 - $t7
    pub const T0: Self = Self(8);
    pub const T1: Self = Self(9);
    pub const T2: Self = Self(10);
    pub const T3: Self = Self(11);
    pub const T4: Self = Self(12);
    pub const T5: Self = Self(13);
    pub const T6: Self = Self(14);
    pub const T7: Self = Self(15);
    // $s0 - $s7
    pub const S0: Self = Self(16);
    pub const S1: Self = Self(17);
    pub const S2: Self = Self(18);
    pub const S3: Self = Self(19);
    pub const S4: Self = Self(20);
    pub const S5: Self = Self(21);
    pub const S6: Self = Self(22);
    pub const S7: Self = Self(23);
    // $t8 - $t9
    pub const T8: Self = Self(24);
    pub const T9: Self = Self(25);
    /// $k0 - $k1
    pub const K0: Self = Self(26);
    pub const K1: Self = Self(27);
    /// $gp, $sp, $fp, $ra
    pub const GP: Self = Self(28);
    pub const SP: Self = Self(29);
    pub const FP: Self = Self(30);
    pub const RA: Self = Self(31);

    /// Register holding a function's return value.
    pub const RV: Self = Self::V0;

    /// Registers with a fixed role: never handed out by an allocator.
    pub const SPECIAL: [Self; 6] = [Self::ZERO, Self::AT, Self::RV, Self::SP, Self::FP, Self::RA];
    /// Registers used to pass the first [`MAX_REG_ARGS`](crate::frame::MAX_REG_ARGS) arguments.
    pub const ARGS: [Self; 4] = [Self::A0, Self::A1, Self::A2, Self::A3];
    /// Registers a callee may clobber.
    pub const CALLER_SAVED: [Self; 10] = [
        Self::T0,
        Self::T1,
        Self::T2,
        Self::T3,
        Self::T4,
        Self::T5,
        Self::T6,
        Self::T7,
        Self::T8,
        Self::T9,
    ];
    /// Registers a callee must preserve.
    pub const CALLEE_SAVED: [Self; 8] = [
        Self::S0,
        Self::S1,
        Self::S2,
        Self::S3,
        Self::S4,
        Self::S5,
        Self::S6,
        Self::S7,
    ];

    /// Returns the register a precoloured temporary stands for, or `None` for a virtual one.
    pub fn from_temp(temp: Temp) -> Option<Self> {
        match temp.id() {
            n @ 0..=31 => Some(Self(n as u8)),
            _ => None,
        }
    }

    pub fn temp(&self) -> Temp {
        Temp::new(u32::from(self.0))
    }

    /// Temporaries clobbered by a call: the caller-saved and argument registers, the return
    /// value and the return address.
    pub fn call_defs() -> impl Iterator<Item = Temp> {
        Self::CALLER_SAVED
            .into_iter()
            .chain(Self::ARGS)
            .chain([Self::RV, Self::RA])
            .map(Temp::from)
    }
}

impl From<Reg> for Temp {
    fn from(value: Reg) -> Self {
        value.temp()
    }
}

/// A temp factory whose fresh temporaries never collide with machine registers.
pub fn temp_factory() -> TempFactory {
    TempFactory::new(Reg::COUNT)
}

/// Formats a temporary for assembly output: machine registers as `$n` (or by name if
/// `use_register_names` is set), virtual temporaries as `tN`.
pub fn temp_name(temp: Temp, use_register_names: bool) -> String {
    match Reg::from_temp(temp) {
        Some(reg) if use_register_names => format!("{reg:#}"),
        Some(reg) => format!("{reg}"),
        None => format!("{temp}"),
    }
}

impl std::fmt::Debug for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:#}")
    }
}

impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            f.write_str(match *self {
                Self::ZERO => "$zero",
                Self::AT => "$at",
                Self::V0 => "$v0",
                Self::V1 => "$v1",
                Self::A0 => "$a0",
                Self::A1 => "$a1",
                Self::A2 => "$a2",
                Self::A3 => "$a3",
                Self::T0 => "$t0",
                Self::T1 => "$t1",
                Self::T2 => "$t2",
                Self::T3 => "$t3",
                Self::T4 => "$t4",
                Self::T5 => "$t5",
                Self::T6 => "$t6",
                Self::T7 => "$t7",
                Self::T8 => "$t8",
                Self::T9 => "$t9",
                Self::S0 => "$s0",
                Self::S1 => "$s1",
                Self::S2 => "$s2",
                Self::S3 => "$s3",
                Self::S4 => "$s4",
                Self::S5 => "$s5",
                Self::S6 => "$s6",
                Self::S7 => "$s7",
                Self::K0 => "$k0",
                Self::K1 => "$k1",
                Self::GP => "$gp",
                Self::SP => "$sp",
                Self::FP => "$fp",
                Self::RA => "$ra",
                Self(n) => panic!("encountered nonexistent register ${n}"),
            })
        } else {
            write!(f, "${}", self.0)
        }
    }
}
