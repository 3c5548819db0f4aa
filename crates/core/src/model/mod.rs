//! Core data model for method records and the corpus they live in.
//!
//! Records are produced by an external bytecode reader; this crate only sees
//! the attributes it needs to fingerprint a method.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{load_document, ConfigError};

mod access_flags;

pub use access_flags::AccessFlag;

/// Unique method key: `<definingClass><name>(<parameters>)<returnType>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodId(String);

impl MethodId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MethodId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MethodId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One compiled method's signature and body-derived attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecord {
    /// Type descriptor of the declaring class (e.g. `Lcom/example/Foo;`).
    pub defining_class: String,
    pub name: String,
    #[serde(default)]
    pub access_flags: u32,
    pub return_type: String,
    /// Parameter type descriptors; position matters.
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Instruction opcodes in body order. Empty for abstract/native methods.
    #[serde(default)]
    pub opcodes: Vec<String>,
    /// String constants referenced by the body, in order of appearance.
    #[serde(default)]
    pub strings: Vec<String>,
}

impl MethodRecord {
    pub fn new(
        defining_class: impl Into<String>,
        name: impl Into<String>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            defining_class: defining_class.into(),
            name: name.into(),
            access_flags: 0,
            return_type: return_type.into(),
            parameters: Vec::new(),
            opcodes: Vec::new(),
            strings: Vec::new(),
        }
    }

    pub fn with_access_flags(mut self, access_flags: u32) -> Self {
        self.access_flags = access_flags;
        self
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_strings<I, S>(mut self, strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strings = strings.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_opcodes<I, S>(mut self, opcodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opcodes = opcodes.into_iter().map(Into::into).collect();
        self
    }

    /// Derive the unique id from defining type, name and descriptors.
    pub fn id(&self) -> MethodId {
        MethodId(format!(
            "{}{}({}){}",
            self.defining_class,
            self.name,
            self.parameters.concat(),
            self.return_type
        ))
    }
}

/// A full collection of method records, as handed over by a corpus loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    pub methods: Vec<MethodRecord>,
}

impl Corpus {
    pub fn new(methods: Vec<MethodRecord>) -> Self {
        Self { methods }
    }

    /// Load a corpus from a JSON (`.json`) or YAML (`.yaml`/`.yml`) file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_document(path)
    }

    /// Method ids in corpus order.
    pub fn ids(&self) -> Vec<MethodId> {
        self.methods.iter().map(MethodRecord::id).collect()
    }
}
