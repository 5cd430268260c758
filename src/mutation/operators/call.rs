//! Call and assignment removal: method calls, constructor calls, member
//! variable assignments, naked receivers and argument propagation.

use tracing::debug;

use crate::bytecode::descriptor::{object_descriptor, split_method_descriptor, FieldType};
use crate::bytecode::{Insn, MethodDescriptor, MethodElement, Opcode};
use crate::mutation::operator::{elements, MutationOperator};
use crate::mutation::rewriter::InsnSite;
use crate::mutation::OperatorId;

use super::versioned_id;

const CONSTRUCTOR: &str = "<init>";

fn parse_call(descriptor: &str) -> Option<MethodDescriptor> {
    match MethodDescriptor::parse(descriptor) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!("Skipping call with unreadable descriptor: {}", e);
            None
        }
    }
}

/// `VOID_METHOD_CALLS` and `NON_VOID_METHOD_CALLS`: remove a method call,
/// discarding its arguments and standing in a default value for its result.
#[derive(Debug, Clone)]
pub struct MethodCallOperator {
    id: OperatorId,
    name: &'static str,
    void_calls: bool,
}

impl MethodCallOperator {
    pub fn void_calls() -> Self {
        Self {
            id: versioned_id("void_method_calls"),
            name: "VOID_METHOD_CALLS",
            void_calls: true,
        }
    }

    pub fn non_void_calls() -> Self {
        Self {
            id: versioned_id("non_void_method_calls"),
            name: "NON_VOID_METHOD_CALLS",
            void_calls: false,
        }
    }
}

impl MutationOperator for MethodCallOperator {
    fn id(&self) -> &OperatorId {
        &self.id
    }

    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        if self.void_calls {
            "Removes calls to void methods"
        } else {
            "Replaces non-void method calls with the default value of their type"
        }
    }

    fn visit_insn(&self, insn: &Insn, site: &mut InsnSite<'_>) -> Option<Vec<MethodElement>> {
        let Insn::Method {
            opcode,
            owner,
            name,
            descriptor,
        } = insn
        else {
            return None;
        };
        if name == CONSTRUCTOR {
            return None;
        }
        let call = parse_call(descriptor)?;
        if call.is_void() != self.void_calls {
            return None;
        }

        if !site
            .register(0, format!("removed call to {owner}::{name}"))
            .is_activated()
        {
            return None;
        }

        let mut replacement = call.pop_arguments();
        if *opcode != Opcode::Invokestatic {
            replacement.push(Insn::simple(Opcode::Pop));
        }
        replacement.extend(call.return_type.as_ref().map(FieldType::default_value));
        Some(elements(replacement))
    }
}

/// `CONSTRUCTOR_CALLS`: replaces `new T(..)` with `null`.
#[derive(Debug, Clone)]
pub struct ConstructorCallOperator {
    id: OperatorId,
}

impl ConstructorCallOperator {
    pub fn new() -> Self {
        Self {
            id: versioned_id("constructor_calls"),
        }
    }
}

impl Default for ConstructorCallOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationOperator for ConstructorCallOperator {
    fn id(&self) -> &OperatorId {
        &self.id
    }

    fn name(&self) -> &str {
        "CONSTRUCTOR_CALLS"
    }

    fn description(&self) -> &str {
        "Replaces constructor calls with null"
    }

    fn visit_insn(&self, insn: &Insn, site: &mut InsnSite<'_>) -> Option<Vec<MethodElement>> {
        let Insn::Method {
            opcode: Opcode::Invokespecial,
            owner,
            name,
            descriptor,
        } = insn
        else {
            return None;
        };
        // Inside a constructor, <init> calls are this()/super() chaining.
        if name != CONSTRUCTOR || site.method().is_constructor() {
            return None;
        }
        let call = parse_call(descriptor)?;

        if !site
            .register(0, format!("removed call to {owner}::{name}"))
            .is_activated()
        {
            return None;
        }

        // Stack is [ref, ref, args..]: drop args and both references.
        let mut replacement = call.pop_arguments();
        replacement.push(Insn::simple(Opcode::Pop));
        replacement.push(Insn::simple(Opcode::Pop));
        replacement.push(Insn::simple(Opcode::AconstNull));
        Some(elements(replacement))
    }
}

/// `EXPERIMENTAL_MEMBER_VARIABLE`: assigns the field's default value instead
/// of the computed one.
#[derive(Debug, Clone)]
pub struct MemberVariableOperator {
    id: OperatorId,
}

impl MemberVariableOperator {
    pub fn new() -> Self {
        Self {
            id: versioned_id("experimental_member_variable"),
        }
    }
}

impl Default for MemberVariableOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationOperator for MemberVariableOperator {
    fn id(&self) -> &OperatorId {
        &self.id
    }

    fn name(&self) -> &str {
        "EXPERIMENTAL_MEMBER_VARIABLE"
    }

    fn description(&self) -> &str {
        "Removes assignments to member variables"
    }

    fn visit_insn(&self, insn: &Insn, site: &mut InsnSite<'_>) -> Option<Vec<MethodElement>> {
        let Insn::Field {
            opcode: Opcode::Putfield,
            name,
            descriptor,
            ..
        } = insn
        else {
            return None;
        };
        let field = match FieldType::parse(descriptor) {
            Ok(field) => field,
            Err(e) => {
                debug!("Skipping field with unreadable descriptor: {}", e);
                return None;
            }
        };

        if !site
            .register(0, format!("Removed assignment to member variable {name}"))
            .is_activated()
        {
            return None;
        }

        Some(elements([field.pop(), field.default_value(), insn.clone()]))
    }
}

/// `EXPERIMENTAL_NAKED_RECEIVER`: replaces a call that returns its own
/// receiver type with the receiver itself.
#[derive(Debug, Clone)]
pub struct NakedReceiverOperator {
    id: OperatorId,
}

impl NakedReceiverOperator {
    pub fn new() -> Self {
        Self {
            id: versioned_id("experimental_naked_receiver"),
        }
    }
}

impl Default for NakedReceiverOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationOperator for NakedReceiverOperator {
    fn id(&self) -> &OperatorId {
        &self.id
    }

    fn name(&self) -> &str {
        "EXPERIMENTAL_NAKED_RECEIVER"
    }

    fn description(&self) -> &str {
        "Replaces calls returning the receiver type with the receiver"
    }

    fn visit_insn(&self, insn: &Insn, site: &mut InsnSite<'_>) -> Option<Vec<MethodElement>> {
        let Insn::Method {
            opcode: Opcode::Invokevirtual | Opcode::Invokeinterface,
            owner,
            name,
            descriptor,
        } = insn
        else {
            return None;
        };
        let call = parse_call(descriptor)?;
        let receiver = FieldType::Reference(object_descriptor(owner));
        if call.return_type.as_ref() != Some(&receiver) {
            return None;
        }

        site.register(
            0,
            format!("replaced call to {owner}::{name} with receiver"),
        )
        .is_activated()
        .then(|| elements(call.pop_arguments()))
    }
}

/// `EXPERIMENTAL_ARGUMENT_PROPAGATION`: replaces a call with the first
/// argument whose type is exactly the call's return type.
#[derive(Debug, Clone)]
pub struct ArgumentPropagationOperator {
    id: OperatorId,
}

impl ArgumentPropagationOperator {
    pub fn new() -> Self {
        Self {
            id: versioned_id("experimental_argument_propagation"),
        }
    }
}

impl Default for ArgumentPropagationOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationOperator for ArgumentPropagationOperator {
    fn id(&self) -> &OperatorId {
        &self.id
    }

    fn name(&self) -> &str {
        "EXPERIMENTAL_ARGUMENT_PROPAGATION"
    }

    fn description(&self) -> &str {
        "Replaces method calls with an argument of the return type"
    }

    fn visit_insn(&self, insn: &Insn, site: &mut InsnSite<'_>) -> Option<Vec<MethodElement>> {
        let Insn::Method {
            opcode,
            owner,
            name,
            descriptor,
        } = insn
        else {
            return None;
        };
        if name == CONSTRUCTOR {
            return None;
        }
        let call = parse_call(descriptor)?;
        let (arguments, returned) = split_method_descriptor(descriptor).ok()?;
        let index = arguments.iter().position(|argument| *argument == returned)?;

        if !site
            .register(0, format!("replaced call to {owner}::{name} with argument"))
            .is_activated()
        {
            return None;
        }

        // Stack is [receiver?, args..]: pop what sits above the kept
        // argument, then sink it through everything below.
        let kept = &call.arguments[index];
        let mut replacement: Vec<Insn> = call.arguments[index + 1..]
            .iter()
            .rev()
            .map(FieldType::pop)
            .collect();
        for below in call.arguments[..index].iter().rev() {
            replacement.extend(drop_below(kept, below));
        }
        if *opcode != Opcode::Invokestatic {
            let receiver = FieldType::Reference(object_descriptor(owner));
            replacement.extend(drop_below(kept, &receiver));
        }
        Some(elements(replacement))
    }
}

/// Discard the value directly under `top`, leaving `top` in place.
fn drop_below(top: &FieldType, below: &FieldType) -> Vec<Insn> {
    let ops: &[Opcode] = match (top.slots(), below.slots()) {
        (1, 1) => &[Opcode::Swap, Opcode::Pop],
        (1, _) => &[Opcode::DupX2, Opcode::Pop, Opcode::Pop2],
        (_, 1) => &[Opcode::Dup2X1, Opcode::Pop2, Opcode::Pop],
        _ => &[Opcode::Dup2X2, Opcode::Pop2, Opcode::Pop2],
    };
    ops.iter().copied().map(Insn::simple).collect()
}
