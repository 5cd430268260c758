//! Switch mutations: default swapping and case removal.

use crate::bytecode::{Insn, Label, MethodElement};
use crate::mutation::operator::{elements, MutationOperator};
use crate::mutation::rewriter::InsnSite;
use crate::mutation::OperatorId;

use super::versioned_id;

/// Case keys, labels and default of either switch form.
fn switch_parts(insn: &Insn) -> Option<(Vec<i32>, &[Label], Label)> {
    match insn {
        Insn::TableSwitch {
            min,
            default,
            labels,
            ..
        } => {
            let keys = (0..labels.len())
                .map(|offset| min.wrapping_add(offset as i32))
                .collect();
            Some((keys, labels.as_slice(), *default))
        }
        Insn::LookupSwitch {
            default,
            keys,
            labels,
        } => Some((keys.clone(), labels.as_slice(), *default)),
        _ => None,
    }
}

/// Rebuild a switch with new labels and default.
fn with_targets(insn: &Insn, new_default: Label, new_labels: Vec<Label>) -> Insn {
    let mut insn = insn.clone();
    match &mut insn {
        Insn::TableSwitch {
            default, labels, ..
        }
        | Insn::LookupSwitch {
            default, labels, ..
        } => {
            *default = new_default;
            *labels = new_labels;
        }
        _ => {}
    }
    insn
}

/// `EXPERIMENTAL_SWITCH`: swaps the default target with the first case
/// target that differs from it.
#[derive(Debug, Clone)]
pub struct SwitchOperator {
    id: OperatorId,
}

impl SwitchOperator {
    pub fn new() -> Self {
        Self {
            id: versioned_id("experimental_switch"),
        }
    }
}

impl Default for SwitchOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationOperator for SwitchOperator {
    fn id(&self) -> &OperatorId {
        &self.id
    }

    fn name(&self) -> &str {
        "EXPERIMENTAL_SWITCH"
    }

    fn description(&self) -> &str {
        "Swaps the switch default with the first case"
    }

    fn visit_insn(&self, insn: &Insn, site: &mut InsnSite<'_>) -> Option<Vec<MethodElement>> {
        let (_, labels, default) = switch_parts(insn)?;
        let first = labels.iter().copied().find(|&label| label != default)?;

        if !site
            .register(0, "Changed switch default to be first case")
            .is_activated()
        {
            return None;
        }

        let swapped = labels
            .iter()
            .map(|&label| match label {
                l if l == default => first,
                l if l == first => default,
                l => l,
            })
            .collect();
        Some(elements([with_targets(insn, first, swapped)]))
    }
}

/// `REMOVE_SWITCH_MUTATOR_k`: sends the `k`th case to the default target.
#[derive(Debug, Clone)]
pub struct RemoveSwitchLabelOperator {
    id: OperatorId,
    name: String,
    index: usize,
}

impl RemoveSwitchLabelOperator {
    pub fn new(index: usize) -> Self {
        Self {
            id: versioned_id(&format!("remove_switch.{index}")),
            name: format!("REMOVE_SWITCH_MUTATOR_{index}"),
            index,
        }
    }
}

impl MutationOperator for RemoveSwitchLabelOperator {
    fn id(&self) -> &OperatorId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Sends one switch case to the default target"
    }

    fn visit_insn(&self, insn: &Insn, site: &mut InsnSite<'_>) -> Option<Vec<MethodElement>> {
        let (keys, labels, default) = switch_parts(insn)?;
        let target = *labels.get(self.index)?;
        if target == default {
            return None;
        }

        let key = *keys.get(self.index)?;
        if !site
            .register(0, format!("RemoveSwitch {} (case value {key})", self.index))
            .is_activated()
        {
            return None;
        }

        let mut removed = labels.to_vec();
        removed[self.index] = default;
        Some(elements([with_targets(insn, default, removed)]))
    }
}

/// The first `count` REMOVE_SWITCH operators.
pub fn remove_switch_mutators(count: usize) -> Vec<RemoveSwitchLabelOperator> {
    (0..count).map(RemoveSwitchLabelOperator::new).collect()
}
