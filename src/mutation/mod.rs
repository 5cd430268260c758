//! Bytecode mutation engine.
//!
//! Mutation testing works by introducing small, deliberate faults (mutants)
//! into compiled code and checking whether the test suite catches them. A
//! mutant that makes a test fail is "killed"; one that does not is "survived".
//!
//! # Overview
//!
//! - [`MutatorCatalog`] maps operator and group names to operators.
//! - [`rewrite`] walks one method with one operator, offering every
//!   instruction to it through an [`InsnSite`].
//! - [`MutationContext`] registers each candidate exactly once and decides, in
//!   the same call, whether it is the single mutation applied in this pass.
//! - [`MutantGenerator`] ties these together: a dry scan enumerates
//!   candidates, and a scan with an ordinal reproduces exactly one mutant.
//!
//! # Isolation
//!
//! A generated mutant differs from the original method at exactly one
//! instruction position. Operators never see each other's output: every pass
//! reads the original body.

pub mod catalog;
pub(crate) mod context;
mod generator;
mod identifier;
mod mutant;
pub(crate) mod operator;
pub mod operators;
pub(crate) mod rewriter;
pub(crate) mod table;

pub use catalog::{MutatorCatalog, OperatorRef};
pub use context::{MutationContext, Registration, ScanReport, Selection};
pub use generator::MutantGenerator;
pub use identifier::{MethodLocation, MutationIdentifier, OperatorId};
pub use mutant::{DetectionStatus, Mutant, MutationDetails, MutationResult, MutationStatusTestPair};
pub use operator::MutationOperator;
pub use rewriter::{rewrite, InsnSite};
pub use table::{Replacement, SubstitutionRule, SubstitutionTable, TableOperator};
