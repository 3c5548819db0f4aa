//! Rendering feature sets as structured fingerprint patterns.
//!
//! The output is the block syntax understood by the pattern resolver:
//!
//! ```text
//! fingerprint {
//! 	returns("V")
//! 	accessFlags(AccessFlags.PUBLIC, AccessFlags.FINAL)
//! 	parameters("I", "", "Ljava/lang/String;")
//! 	strings("loading", "done")
//! }
//! ```
//!
//! Sections always appear in that order and empty sections are omitted. A
//! parameter slot that the feature set does not constrain renders as `""`,
//! which the resolver treats as a prefix matching any type.

use std::collections::BTreeMap;
use std::fmt;

use log::warn;

use crate::features::{Feature, MalformedFeatureToken, ParsedFeature, MAX_PARAMETER_INDEX};
use crate::model::AccessFlag;

mod parse;

pub use parse::{parse_pattern, ParsedPattern, PatternError};

/// Output of a render: the pattern text plus any tokens that were skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPattern {
    pub text: String,
    pub skipped: Vec<MalformedFeatureToken>,
    /// Access flag bits that have no method flag name and were left out of
    /// the `accessFlags(...)` section. Zero when nothing was dropped.
    pub omitted_access_flags: u32,
}

impl fmt::Display for RenderedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Renders feature lists into fingerprint patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintRenderer {
    parameter_count: Option<usize>,
}

impl FingerprintRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pad the parameter section out to the method's real arity.
    ///
    /// The resolver compares parameter lists by length, so a fingerprint that
    /// only constrains slot 0 of a three-parameter method must still render
    /// three slots to keep matching its target.
    pub fn with_parameter_count(mut self, parameter_count: usize) -> Self {
        self.parameter_count = Some(parameter_count);
        self
    }

    /// Render a heterogeneous feature list.
    ///
    /// Malformed tokens are skipped and reported; they never abort the render.
    /// When a category appears more than once the first value wins.
    pub fn render<'a, I>(&self, features: I) -> RenderedPattern
    where
        I: IntoIterator<Item = &'a Feature>,
    {
        let mut return_type: Option<&str> = None;
        let mut access_flags: Option<u32> = None;
        let mut parameters: BTreeMap<usize, &str> = BTreeMap::new();
        let mut strings: Vec<&str> = Vec::new();
        let mut skipped = Vec::new();

        for feature in features {
            match feature.parse() {
                Ok(ParsedFeature::ReturnType(value)) => match return_type {
                    None => return_type = Some(value),
                    Some(existing) if existing != value => {
                        warn!("Conflicting return types '{existing}' and '{value}'; keeping the first")
                    }
                    Some(_) => {}
                },
                Ok(ParsedFeature::AccessFlags(bits)) => match access_flags {
                    None => access_flags = Some(bits),
                    Some(existing) if existing != bits => {
                        warn!("Conflicting access flags {existing} and {bits}; keeping the first")
                    }
                    Some(_) => {}
                },
                Ok(ParsedFeature::Parameter { index, descriptor }) => {
                    let slot = parameters.entry(index).or_insert(descriptor);
                    if *slot != descriptor {
                        warn!("Conflicting types for parameter {index}; keeping '{slot}'");
                    }
                }
                Ok(ParsedFeature::String(value)) => {
                    if !strings.contains(&value) {
                        strings.push(value);
                    }
                }
                Err(err) => {
                    warn!("Skipping malformed feature: {err}");
                    skipped.push(err);
                }
            }
        }

        let mut sections = Vec::new();
        if let Some(value) = return_type {
            sections.push(format!("returns({})", quote(value)));
        }
        let mut omitted_access_flags = 0;
        if let Some(bits) = access_flags {
            let (section, omitted) = render_access_flags(bits);
            sections.push(section);
            omitted_access_flags = omitted;
        }
        if let Some((&max_index, _)) = parameters.last_key_value() {
            let arity = self
                .parameter_count
                .unwrap_or(0)
                .max(max_index.saturating_add(1))
                .min(MAX_PARAMETER_INDEX + 1);
            let slots: Vec<String> = (0..arity)
                .map(|index| quote(parameters.get(&index).copied().unwrap_or("")))
                .collect();
            sections.push(format!("parameters({})", slots.join(", ")));
        }
        if !strings.is_empty() {
            let quoted: Vec<String> = strings.iter().map(|value| quote(value)).collect();
            sections.push(format!("strings({})", quoted.join(", ")));
        }

        let mut text = String::from("fingerprint {\n");
        for section in &sections {
            text.push('\t');
            text.push_str(section);
            text.push('\n');
        }
        text.push('}');

        RenderedPattern { text, skipped, omitted_access_flags }
    }
}

/// Render with default options.
pub fn render<'a, I>(features: I) -> RenderedPattern
where
    I: IntoIterator<Item = &'a Feature>,
{
    FingerprintRenderer::new().render(features)
}

fn render_access_flags(bits: u32) -> (String, u32) {
    let unknown = AccessFlag::unknown_bits(bits);
    if unknown != 0 {
        warn!("Access flag bits {unknown:#x} have no method flag name and are omitted");
    }
    let names: Vec<String> =
        AccessFlag::decode(bits).iter().map(|flag| format!("AccessFlags.{}", flag.name())).collect();
    (format!("accessFlags({})", names.join(", ")), unknown)
}

/// Quote a value as a string literal, escaping characters the resolver's
/// literal syntax gives meaning to.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
