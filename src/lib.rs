//! bytemut - Bytecode mutation testing engine.
//!
//! bytemut generates mutants from compiled method bodies: small, plausible
//! faults such as a swapped arithmetic operator or a negated conditional. Each
//! mutant differs from the original at exactly one instruction. A history of
//! earlier runs lets unchanged classes reuse their previous results.
//!
//! # Example
//!
//! ```no_run
//! use bytemut::bytecode::ClassFile;
//! use bytemut::mutation::{MutantGenerator, MutatorCatalog};
//!
//! let catalog = MutatorCatalog::builtin();
//! let generator = MutantGenerator::from_catalog(&catalog, &["DEFAULTS"]).unwrap();
//! let class = ClassFile::from_path("Calculator.json").unwrap();
//!
//! let candidates = generator.scan_class(&class).unwrap();
//! for details in &candidates {
//!     let mutant = generator.mutant(&class, details.ordinal).unwrap();
//!     println!("{}: {}", details.ordinal, mutant.details.description());
//! }
//! ```

pub mod bytecode;
pub mod cli;
pub mod config;
pub mod core;
pub mod history;
pub mod mutation;

pub use core::{Error, Result};
