//! Instructions and the non-instruction elements of a method body.

use serde::{Deserialize, Serialize};

use super::Opcode;

/// A branch target inside a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub u32);

/// A constant pool value loaded by `LDC`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Constant {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Class(String),
}

/// A single bytecode instruction with its operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insn {
    /// Zero-operand instruction (arithmetic, stack, constants, returns).
    Simple { opcode: Opcode },
    /// `BIPUSH` / `SIPUSH`.
    Int { opcode: Opcode, operand: i32 },
    /// Local variable load or store.
    Var { opcode: Opcode, var: u16 },
    /// Local variable increment.
    Iinc { var: u16, increment: i16 },
    /// Conditional or unconditional jump.
    Jump { opcode: Opcode, label: Label },
    /// Constant pool load.
    Ldc { constant: Constant },
    /// Field access.
    Field {
        opcode: Opcode,
        owner: String,
        name: String,
        descriptor: String,
    },
    /// Method invocation.
    Method {
        opcode: Opcode,
        owner: String,
        name: String,
        descriptor: String,
    },
    /// Type instruction (`NEW`, `CHECKCAST`, ...).
    Type { opcode: Opcode, descriptor: String },
    /// Dense switch over `min..=max`.
    TableSwitch {
        min: i32,
        max: i32,
        default: Label,
        labels: Vec<Label>,
    },
    /// Sparse switch over `keys`.
    LookupSwitch {
        default: Label,
        keys: Vec<i32>,
        labels: Vec<Label>,
    },
}

impl Insn {
    pub fn simple(opcode: Opcode) -> Self {
        Self::Simple { opcode }
    }

    pub fn var(opcode: Opcode, var: u16) -> Self {
        Self::Var { opcode, var }
    }

    pub fn jump(opcode: Opcode, label: Label) -> Self {
        Self::Jump { opcode, label }
    }

    pub fn method(
        opcode: Opcode,
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self::Method {
            opcode,
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    /// The opcode of this instruction.
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Simple { opcode }
            | Self::Int { opcode, .. }
            | Self::Var { opcode, .. }
            | Self::Jump { opcode, .. }
            | Self::Field { opcode, .. }
            | Self::Method { opcode, .. }
            | Self::Type { opcode, .. } => *opcode,
            Self::Iinc { .. } => Opcode::Iinc,
            Self::Ldc { .. } => Opcode::Ldc,
            Self::TableSwitch { .. } => Opcode::Tableswitch,
            Self::LookupSwitch { .. } => Opcode::Lookupswitch,
        }
    }

    /// The same instruction with its opcode replaced and its operands kept.
    ///
    /// Instructions whose opcode is implied by their shape (`IINC`, `LDC`,
    /// switches) are returned unchanged.
    pub fn with_opcode(&self, replacement: Opcode) -> Self {
        let mut insn = self.clone();
        match &mut insn {
            Self::Simple { opcode }
            | Self::Int { opcode, .. }
            | Self::Var { opcode, .. }
            | Self::Jump { opcode, .. }
            | Self::Field { opcode, .. }
            | Self::Method { opcode, .. }
            | Self::Type { opcode, .. } => *opcode = replacement,
            Self::Iinc { .. }
            | Self::Ldc { .. }
            | Self::TableSwitch { .. }
            | Self::LookupSwitch { .. } => {}
        }
        insn
    }

    /// Branch target of a jump instruction.
    pub fn jump_target(&self) -> Option<Label> {
        match self {
            Self::Jump { label, .. } => Some(*label),
            _ => None,
        }
    }
}

/// Verification type snapshot carried by a stack map frame.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub locals: Vec<String>,
    #[serde(default)]
    pub stack: Vec<String>,
}

/// One element of a method body in program order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodElement {
    Insn(Insn),
    Label(Label),
    LineNumber {
        line: u32,
        start: Label,
    },
    Frame(Frame),
    TryCatch {
        start: Label,
        end: Label,
        handler: Label,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exception: Option<String>,
    },
}

impl MethodElement {
    pub fn as_insn(&self) -> Option<&Insn> {
        match self {
            Self::Insn(insn) => Some(insn),
            _ => None,
        }
    }

    /// Highest label referenced by this element, if any.
    pub(crate) fn max_label(&self) -> Option<Label> {
        match self {
            Self::Label(label) | Self::LineNumber { start: label, .. } => Some(*label),
            Self::TryCatch {
                start, end, handler, ..
            } => Some(*start.max(end).max(handler)),
            Self::Insn(Insn::Jump { label, .. }) => Some(*label),
            Self::Insn(Insn::TableSwitch {
                default, labels, ..
            })
            | Self::Insn(Insn::LookupSwitch {
                default, labels, ..
            }) => labels.iter().copied().chain(Some(*default)).max(),
            Self::Insn(_) | Self::Frame(_) => None,
        }
    }
}

impl From<Insn> for MethodElement {
    fn from(insn: Insn) -> Self {
        Self::Insn(insn)
    }
}
