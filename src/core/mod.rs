//! Core types shared by the mutation engine and the history store.

mod error;

pub use error::{Error, Result};
