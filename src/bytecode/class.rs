//! Compiled classes and method bodies as handed to the engine.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

use super::{Insn, Label, MethodElement};

/// Labels kept free above a body's largest label for rewriting to allocate.
pub const RESERVED_LABELS: u32 = 16;

/// Internal (slash-separated) class name, e.g. `com/example/Calculator`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassName(String);

impl ClassName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A method's signature and its linear element stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodBody {
    pub name: String,
    pub descriptor: String,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub elements: Vec<MethodElement>,
}

impl MethodBody {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            is_static: false,
            elements: Vec::new(),
        }
    }

    /// Builder-style helper that appends an instruction.
    pub fn insn(mut self, insn: Insn) -> Self {
        self.elements.push(MethodElement::Insn(insn));
        self
    }

    /// Builder-style helper that appends any element.
    pub fn element(mut self, element: MethodElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    /// Instructions in program order, skipping labels, frames and line numbers.
    pub fn instructions(&self) -> impl Iterator<Item = &Insn> {
        self.elements.iter().filter_map(MethodElement::as_insn)
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions().count()
    }

    /// First label number not used anywhere in the body.
    ///
    /// Fails when fewer than [`RESERVED_LABELS`] label numbers remain above it.
    pub fn next_free_label(&self) -> Result<Label> {
        let Some(Label(max)) = self.elements.iter().filter_map(MethodElement::max_label).max()
        else {
            return Ok(Label(0));
        };
        max.checked_add(1)
            .filter(|next| next.checked_add(RESERVED_LABELS).is_some())
            .map(Label)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "method {}{} uses label {}, leaving no room for mutation labels",
                    self.name, self.descriptor, max
                ))
            })
    }

    /// Element index of the `n`th instruction (0-based).
    fn element_index_of(&self, instruction: usize) -> Option<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, element)| matches!(element, MethodElement::Insn(_)))
            .nth(instruction)
            .map(|(index, _)| index)
    }

    /// Returns true if `mutated` equals this body everywhere except that the
    /// instruction at `instruction` was replaced by some (possibly empty) run
    /// of elements.
    pub fn differs_only_at(&self, mutated: &MethodBody, instruction: usize) -> bool {
        let Some(index) = self.element_index_of(instruction) else {
            return false;
        };
        let before = &self.elements[..index];
        let after = &self.elements[index + 1..];

        mutated.elements.len() >= before.len() + after.len()
            && mutated.elements.starts_with(before)
            && mutated.elements.ends_with(after)
            && mutated.name == self.name
            && mutated.descriptor == self.descriptor
    }
}

/// A compiled class: its name and the methods available for mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassFile {
    pub name: ClassName,
    /// Direct superclass, when it is part of the same code base.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<ClassName>,
    #[serde(default)]
    pub methods: Vec<MethodBody>,
}

impl ClassFile {
    pub fn new(name: impl Into<ClassName>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            methods: Vec::new(),
        }
    }

    pub fn with_superclass(mut self, superclass: impl Into<ClassName>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn with_method(mut self, method: MethodBody) -> Self {
        self.methods.push(method);
        self
    }

    /// Find a method by name, and by descriptor when one is given.
    pub fn method(&self, name: &str, descriptor: Option<&str>) -> Result<&MethodBody> {
        self.methods
            .iter()
            .find(|m| m.name == name && descriptor.map_or(true, |d| d == m.descriptor))
            .ok_or_else(|| Error::MissingMethod {
                class: self.name.to_string(),
                method: name.to_string(),
            })
    }

    /// Check every method can be rewritten.
    pub fn validate(&self) -> Result<()> {
        for method in &self.methods {
            method.next_free_label()?;
        }
        Ok(())
    }

    /// Stable hash of the class's compiled content.
    pub fn content_hash(&self) -> Result<u64> {
        let bytes = serde_json::to_vec(&self.methods)?;
        Ok(xxhash_rust::xxh3::xxh3_64(&bytes))
    }

    /// Load a class from its JSON encoding.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let class: Self = serde_json::from_str(&content)?;
        class.validate()?;
        Ok(class)
    }
}

impl From<String> for ClassName {
    fn from(name: String) -> Self {
        Self(name)
    }
}
