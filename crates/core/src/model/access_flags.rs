use serde::{Deserialize, Serialize};

/// Access flags that may appear on a method, in canonical bit order.
///
/// Bits that are only meaningful on classes or fields (INTERFACE, ANNOTATION,
/// ENUM, ...) are not listed; they never decode from a method bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessFlag {
    Public,
    Private,
    Protected,
    Static,
    Final,
    Synchronized,
    Bridge,
    Varargs,
    Native,
    Abstract,
    Strictfp,
    Synthetic,
    Constructor,
    DeclaredSynchronized,
}

impl AccessFlag {
    /// All method flags in the order they are rendered.
    pub const ALL: [AccessFlag; 14] = [
        AccessFlag::Public,
        AccessFlag::Private,
        AccessFlag::Protected,
        AccessFlag::Static,
        AccessFlag::Final,
        AccessFlag::Synchronized,
        AccessFlag::Bridge,
        AccessFlag::Varargs,
        AccessFlag::Native,
        AccessFlag::Abstract,
        AccessFlag::Strictfp,
        AccessFlag::Synthetic,
        AccessFlag::Constructor,
        AccessFlag::DeclaredSynchronized,
    ];

    pub fn bit(self) -> u32 {
        match self {
            AccessFlag::Public => 0x1,
            AccessFlag::Private => 0x2,
            AccessFlag::Protected => 0x4,
            AccessFlag::Static => 0x8,
            AccessFlag::Final => 0x10,
            AccessFlag::Synchronized => 0x20,
            AccessFlag::Bridge => 0x40,
            AccessFlag::Varargs => 0x80,
            AccessFlag::Native => 0x100,
            AccessFlag::Abstract => 0x400,
            AccessFlag::Strictfp => 0x800,
            AccessFlag::Synthetic => 0x1000,
            AccessFlag::Constructor => 0x10000,
            AccessFlag::DeclaredSynchronized => 0x20000,
        }
    }

    /// Canonical upper-case name (e.g. `DECLARED_SYNCHRONIZED`).
    pub fn name(self) -> &'static str {
        match self {
            AccessFlag::Public => "PUBLIC",
            AccessFlag::Private => "PRIVATE",
            AccessFlag::Protected => "PROTECTED",
            AccessFlag::Static => "STATIC",
            AccessFlag::Final => "FINAL",
            AccessFlag::Synchronized => "SYNCHRONIZED",
            AccessFlag::Bridge => "BRIDGE",
            AccessFlag::Varargs => "VARARGS",
            AccessFlag::Native => "NATIVE",
            AccessFlag::Abstract => "ABSTRACT",
            AccessFlag::Strictfp => "STRICTFP",
            AccessFlag::Synthetic => "SYNTHETIC",
            AccessFlag::Constructor => "CONSTRUCTOR",
            AccessFlag::DeclaredSynchronized => "DECLARED_SYNCHRONIZED",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|flag| flag.name() == name)
    }

    /// Decode a raw bitmask into the method flags it carries, in canonical order.
    pub fn decode(bits: u32) -> Vec<AccessFlag> {
        Self::ALL.iter().copied().filter(|flag| bits & flag.bit() != 0).collect()
    }

    /// Bits of `bits` that no method flag accounts for.
    pub fn unknown_bits(bits: u32) -> u32 {
        bits & !Self::ALL.iter().fold(0, |acc, flag| acc | flag.bit())
    }

    pub fn encode(flags: &[AccessFlag]) -> u32 {
        flags.iter().fold(0, |acc, flag| acc | flag.bit())
    }
}

impl std::fmt::Display for AccessFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
