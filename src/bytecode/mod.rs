//! Bytecode model consumed by the mutation engine.
//!
//! Class files arrive already decoded (the engine does not read raw `.class`
//! bytes) as a JSON-encodable stream of instructions and structural elements.

mod class;
pub mod descriptor;
mod insn;
mod opcode;

pub use class::{ClassFile, ClassName, MethodBody, RESERVED_LABELS};
pub use descriptor::{FieldType, MethodDescriptor};
pub use insn::{Constant, Frame, Insn, Label, MethodElement};
pub use opcode::Opcode;
