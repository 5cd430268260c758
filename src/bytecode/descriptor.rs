//! Method and field type descriptors.
//!
//! Operators that remove calls or assignments need to know how many stack
//! slots each argument occupies and what default value stands in for a result.

use crate::core::{Error, Result};

use super::{Insn, Opcode};

/// A field or argument type, reduced to what the operand stack cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// `B`, `C`, `I`, `S` and `Z` all live on the stack as an int.
    Int,
    Long,
    Float,
    Double,
    /// Object or array type, kept in descriptor form (`Ljava/lang/String;`, `[I`).
    Reference(String),
}

impl FieldType {
    /// Parse a single field descriptor such as `J` or `Ljava/lang/Object;`.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let (field, rest) = parse_field(descriptor, descriptor)?;
        if !rest.is_empty() {
            return Err(Error::descriptor(descriptor, "trailing characters"));
        }
        Ok(field)
    }

    /// Number of operand stack slots a value of this type occupies.
    pub fn slots(&self) -> usize {
        match self {
            Self::Long | Self::Double => 2,
            _ => 1,
        }
    }

    /// Instruction that discards a value of this type from the stack.
    pub fn pop(&self) -> Insn {
        if self.slots() == 2 {
            Insn::simple(Opcode::Pop2)
        } else {
            Insn::simple(Opcode::Pop)
        }
    }

    /// Instruction that pushes the type's default value (zero or null).
    pub fn default_value(&self) -> Insn {
        Insn::simple(match self {
            Self::Int => Opcode::Iconst0,
            Self::Long => Opcode::Lconst0,
            Self::Float => Opcode::Fconst0,
            Self::Double => Opcode::Dconst0,
            Self::Reference(_) => Opcode::AconstNull,
        })
    }
}

/// A parsed method descriptor such as `(IJLjava/lang/String;)V`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub arguments: Vec<FieldType>,
    /// `None` for `void` methods.
    pub return_type: Option<FieldType>,
}

impl MethodDescriptor {
    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut rest = descriptor
            .strip_prefix('(')
            .ok_or_else(|| Error::descriptor(descriptor, "expected '('"))?;

        let mut arguments = Vec::new();
        loop {
            if let Some(after) = rest.strip_prefix(')') {
                rest = after;
                break;
            }
            let (field, after) = parse_field(rest, descriptor)?;
            arguments.push(field);
            rest = after;
        }

        let return_type = if rest == "V" {
            None
        } else {
            Some(FieldType::parse(rest).map_err(|_| {
                Error::descriptor(descriptor, format!("invalid return type '{}'", rest))
            })?)
        };

        Ok(Self {
            arguments,
            return_type,
        })
    }

    pub fn is_void(&self) -> bool {
        self.return_type.is_none()
    }

    /// Instructions that pop every argument, last argument first.
    pub fn pop_arguments(&self) -> Vec<Insn> {
        self.arguments.iter().rev().map(FieldType::pop).collect()
    }
}

fn parse_field<'a>(input: &'a str, whole: &str) -> Result<(FieldType, &'a str)> {
    let first = input
        .chars()
        .next()
        .ok_or_else(|| Error::descriptor(whole, "unexpected end of descriptor"))?;
    let rest = &input[first.len_utf8()..];

    match first {
        'B' | 'C' | 'I' | 'S' | 'Z' => Ok((FieldType::Int, rest)),
        'J' => Ok((FieldType::Long, rest)),
        'F' => Ok((FieldType::Float, rest)),
        'D' => Ok((FieldType::Double, rest)),
        'L' => {
            let end = rest
                .find(';')
                .ok_or_else(|| Error::descriptor(whole, "unterminated class type"))?;
            let len = 1 + end + 1;
            Ok((FieldType::Reference(input[..len].to_string()), &input[len..]))
        }
        '[' => {
            let (_, after) = parse_field(rest, whole)?;
            let len = input.len() - after.len();
            Ok((FieldType::Reference(input[..len].to_string()), after))
        }
        other => Err(Error::descriptor(
            whole,
            format!("unexpected type character '{}'", other),
        )),
    }
}

/// Exact argument and return descriptors of a method descriptor.
///
/// Unlike [`MethodDescriptor::parse`], sub-int types stay distinct: `(ZI)I`
/// splits into `["Z", "I"]` and `"I"`.
pub fn split_method_descriptor(descriptor: &str) -> Result<(Vec<&str>, &str)> {
    let mut rest = descriptor
        .strip_prefix('(')
        .ok_or_else(|| Error::descriptor(descriptor, "expected '('"))?;

    let mut arguments = Vec::new();
    while !rest.starts_with(')') {
        let (_, after) = parse_field(rest, descriptor)?;
        arguments.push(&rest[..rest.len() - after.len()]);
        rest = after;
    }
    Ok((arguments, &rest[1..]))
}

/// The reference descriptor of an internal class name (`a/B` → `La/B;`).
pub fn object_descriptor(internal_name: &str) -> String {
    format!("L{};", internal_name)
}
