//! Mutator catalog: operator names and groups.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::warn;

use crate::core::{Error, Result};

use super::operators::{
    abs, ArgumentPropagationOperator, aod_mutators, ar_mutators, conditionals_boundary, crcr_mutators, invert_negs, math,
    negate_conditionals, obbn, remove_conditionals, remove_increments, remove_switch_mutators,
    ror_mutators, ConditionalKind, ConstantOperator, ConstructorCallOperator, IncrementsOperator,
    MemberVariableOperator, MethodCallOperator, NakedReceiverOperator, ReturnValuesOperator,
    SwitchOperator, UoiOperator, REMOVE_SWITCH_COUNT,
};
use super::operator::MutationOperator;

/// Shared handle to a mutation operator.
pub type OperatorRef = Arc<dyn MutationOperator>;

/// Registry of operator names and groups.
///
/// A name maps to one operator or a group of them. The catalog is built once
/// and then only read.
#[derive(Debug, Default, Clone)]
pub struct MutatorCatalog {
    entries: HashMap<String, Vec<OperatorRef>>,
}

impl MutatorCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `operators`. A later binding of the same name wins.
    pub fn register(&mut self, name: impl Into<String>, operators: Vec<OperatorRef>) {
        let name = name.into();
        if self.entries.contains_key(&name) {
            warn!("Mutator name {} registered twice; keeping the later binding", name);
        }
        self.entries.insert(name, operators);
    }

    /// Register an operator under its own name.
    pub fn register_operator(&mut self, operator: impl MutationOperator + 'static) {
        let name = operator.name().to_string();
        let operator: OperatorRef = Arc::new(operator);
        self.register(name, vec![operator]);
    }

    /// Bind `name` to every operator currently bound to `members`.
    pub fn register_group(&mut self, name: impl Into<String>, members: &[&str]) -> Result<()> {
        let operators = self.resolve(members)?;
        self.register(name, operators);
        Ok(())
    }

    /// Resolve names to a deduplicated operator set ordered by global id.
    ///
    /// Fails on the first unknown name without returning a partial set.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<OperatorRef>> {
        let mut resolved: BTreeMap<_, OperatorRef> = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            let operators = self
                .entries
                .get(name)
                .ok_or_else(|| Error::unknown_operator(name))?;
            for operator in operators {
                resolved
                    .entry(operator.id().clone())
                    .or_insert_with(|| Arc::clone(operator));
            }
        }
        Ok(resolved.into_values().collect())
    }

    /// Operators bound to `name`, if any.
    pub fn operators(&self, name: &str) -> Option<&[OperatorRef]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Every registered name, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Register fixed groups whose members are built-in names.
    ///
    /// # Panics
    ///
    /// Panics if a member is not registered; the member lists are constants.
    fn register_builtin_groups(&mut self, groups: &[(&str, &[&str])]) {
        for (name, members) in groups {
            self.register_group(*name, members)
                .expect("built-in group members are registered");
        }
    }

    /// The catalog of every built-in operator and group.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();

        catalog.register_operator(invert_negs());
        catalog.register_operator(ReturnValuesOperator::new());
        catalog.register_operator(ConstantOperator::inline());
        catalog.register_operator(math());
        catalog.register_operator(MethodCallOperator::void_calls());
        catalog.register_operator(negate_conditionals());
        catalog.register_operator(conditionals_boundary());
        catalog.register_operator(IncrementsOperator::new());
        catalog.register_operator(remove_increments());
        catalog.register_operator(MethodCallOperator::non_void_calls());
        catalog.register_operator(ConstructorCallOperator::new());

        for operator in ar_mutators() {
            catalog.register_operator(operator);
        }
        catalog.register_operator(abs());
        for operator in aod_mutators() {
            catalog.register_operator(operator);
        }
        catalog.register_operator(obbn());
        catalog.register_operator(UoiOperator::pre_increment());
        catalog.register_operator(UoiOperator::post_increment());
        for operator in ror_mutators() {
            catalog.register_operator(operator);
        }
        for operator in crcr_mutators() {
            catalog.register_operator(operator);
        }

        let mut removals = Vec::new();
        for kind in [ConditionalKind::Equality, ConditionalKind::Order] {
            for keep_body in [true, false] {
                let operator: OperatorRef = Arc::new(remove_conditionals(kind, keep_body));
                catalog.register(operator.name().to_string(), vec![Arc::clone(&operator)]);
                removals.push(operator);
            }
        }
        catalog.register("REMOVE_CONDITIONALS", removals);

        catalog.register_operator(MemberVariableOperator::new());
        catalog.register_operator(SwitchOperator::new());
        catalog.register_operator(NakedReceiverOperator::new());
        catalog.register_operator(ArgumentPropagationOperator::new());

        let switch_removals = remove_switch_mutators(REMOVE_SWITCH_COUNT)
            .into_iter()
            .map(|operator| Arc::new(operator) as OperatorRef)
            .collect();
        catalog.register("REMOVE_SWITCH", switch_removals);

        catalog.register_builtin_groups(&[("DEFAULTS", DEFAULTS), ("STRONGER", STRONGER)]);
        let all: Vec<String> = catalog.names().into_iter().map(String::from).collect();
        let everything = catalog
            .resolve(&all)
            .expect("built-in group members are registered");
        catalog.register("ALL", everything);

        catalog
    }
}

/// Members of the `DEFAULTS` group.
pub const DEFAULTS: &[&str] = &[
    "AR_MUTATOR1",
    "AR_MUTATOR2",
    "AR_MUTATOR3",
    "ABS_MUTATOR",
    "AOD_MUTATOR",
    "AOD_MUTATOR2",
    "CRCR_MUTATOR",
    "CRCR2_MUTATOR",
    "CRCR3_MUTATOR",
    "CRCR4_MUTATOR",
    "CRCR5_MUTATOR",
    "ROR_MUTATOR",
    "ROR_MUTATOR2",
    "ROR_MUTATOR3",
    "ROR_MUTATOR4",
    "ROR_MUTATOR5",
    "ROR_MUTATOR6",
    "ROR_MUTATOR7",
    "ROR_MUTATOR8",
    "UOI_MUTATOR",
    "UOI_MUTATOR2",
    "OBBN_MUTATOR",
];

/// Members of the `STRONGER` group.
pub const STRONGER: &[&str] = &[
    "DEFAULTS",
    "REMOVE_CONDITIONALS_EQ_ELSE",
    "EXPERIMENTAL_SWITCH",
];
