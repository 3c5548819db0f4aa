//! Feature extraction: turning a method record into canonical feature tokens.
//!
//! A feature is a `"<category>|<value>"` token. Tokens are compared as plain
//! strings, which gives every feature list a stable, reproducible order.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::MethodRecord;

const SEPARATOR: char = '|';
const PARAMETER_PREFIX: &str = "parameter_";

/// Highest parameter slot a token may name. A method frame has at most 255
/// parameter registers, so no real descriptor reaches past this.
pub const MAX_PARAMETER_INDEX: usize = 254;

/// Feature categories that the extractor emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureCategory {
    ReturnType,
    /// Parameter slot, keyed by position.
    Parameter(usize),
    Strings,
    AccessFlags,
}

impl fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureCategory::ReturnType => f.write_str("returnType"),
            FeatureCategory::Parameter(index) => write!(f, "{PARAMETER_PREFIX}{index}"),
            FeatureCategory::Strings => f.write_str("strings"),
            FeatureCategory::AccessFlags => f.write_str("accessFlags"),
        }
    }
}

/// A token that does not parse into a known category/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedFeatureToken {
    #[error("Feature token '{0}' has no category separator")]
    MissingSeparator(String),

    #[error("Feature token '{token}' has unknown category '{category}'")]
    UnknownCategory { token: String, category: String },

    #[error("Feature token '{0}' has an invalid parameter index")]
    InvalidParameterIndex(String),

    #[error("Feature token '{0}' carries a non-numeric access flag mask")]
    InvalidAccessFlags(String),
}

impl MalformedFeatureToken {
    /// The offending raw token.
    pub fn token(&self) -> &str {
        match self {
            MalformedFeatureToken::MissingSeparator(token)
            | MalformedFeatureToken::InvalidParameterIndex(token)
            | MalformedFeatureToken::InvalidAccessFlags(token) => token,
            MalformedFeatureToken::UnknownCategory { token, .. } => token,
        }
    }
}

/// A feature token split into its typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedFeature<'a> {
    ReturnType(&'a str),
    Parameter { index: usize, descriptor: &'a str },
    String(&'a str),
    AccessFlags(u32),
}

impl ParsedFeature<'_> {
    pub fn category(&self) -> FeatureCategory {
        match self {
            ParsedFeature::ReturnType(_) => FeatureCategory::ReturnType,
            ParsedFeature::Parameter { index, .. } => FeatureCategory::Parameter(*index),
            ParsedFeature::String(_) => FeatureCategory::Strings,
            ParsedFeature::AccessFlags(_) => FeatureCategory::AccessFlags,
        }
    }
}

/// One canonical `"<category>|<value>"` token.
///
/// Construction through [`Feature::new`] always yields a well-formed token.
/// [`Feature::from_token`] accepts anything, so features assembled from other
/// sources are only validated when they are parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feature(String);

impl Feature {
    pub fn new(category: FeatureCategory, value: impl AsRef<str>) -> Self {
        Self(format!("{category}{SEPARATOR}{}", value.as_ref()))
    }

    pub fn return_type(descriptor: impl AsRef<str>) -> Self {
        Self::new(FeatureCategory::ReturnType, descriptor)
    }

    pub fn parameter(index: usize, descriptor: impl AsRef<str>) -> Self {
        Self::new(FeatureCategory::Parameter(index), descriptor)
    }

    pub fn string(literal: impl AsRef<str>) -> Self {
        Self::new(FeatureCategory::Strings, literal)
    }

    pub fn access_flags(bits: u32) -> Self {
        Self::new(FeatureCategory::AccessFlags, bits.to_string())
    }

    /// Wrap a raw token without validating it.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Wrap a raw token, rejecting it if it does not parse.
    pub fn parse_token(token: impl Into<String>) -> Result<Self, MalformedFeatureToken> {
        let feature = Self(token.into());
        feature.parse()?;
        Ok(feature)
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> Result<ParsedFeature<'_>, MalformedFeatureToken> {
        let (category, value) = self
            .0
            .split_once(SEPARATOR)
            .ok_or_else(|| MalformedFeatureToken::MissingSeparator(self.0.clone()))?;

        match category {
            "returnType" => Ok(ParsedFeature::ReturnType(value)),
            "strings" => Ok(ParsedFeature::String(value)),
            "accessFlags" => value
                .parse::<u32>()
                .map(ParsedFeature::AccessFlags)
                .map_err(|_| MalformedFeatureToken::InvalidAccessFlags(self.0.clone())),
            other => match other.strip_prefix(PARAMETER_PREFIX) {
                Some(index) => parse_parameter_index(index)
                    .map(|index| ParsedFeature::Parameter { index, descriptor: value })
                    .ok_or_else(|| MalformedFeatureToken::InvalidParameterIndex(self.0.clone())),
                None => Err(MalformedFeatureToken::UnknownCategory {
                    token: self.0.clone(),
                    category: other.to_string(),
                }),
            },
        }
    }
}

/// Only the form `Feature::parameter` writes is accepted: plain decimal
/// digits, no sign, no leading zero, at most [`MAX_PARAMETER_INDEX`].
fn parse_parameter_index(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse::<usize>().ok().filter(|index| *index <= MAX_PARAMETER_INDEX)
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of features belonging to one method, iterated in token order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeSet<Feature>);

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, feature: Feature) -> bool {
        self.0.insert(feature)
    }

    pub fn contains(&self, feature: &Feature) -> bool {
        self.0.contains(feature)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<Feature> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FeatureSet {
    type Item = &'a Feature;
    type IntoIter = std::collections::btree_set::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Which feature categories take part in fingerprinting.
///
/// Changing any toggle changes the feature universe, so an index built under
/// one setting cannot be reused under another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub use_return_type: bool,
    pub use_parameters: bool,
    pub use_strings: bool,
    pub use_access_flags: bool,
    /// Reserved. Opcode features are not emitted yet; the toggle is accepted
    /// so settings files stay forward compatible.
    pub use_opcodes: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            use_return_type: true,
            use_parameters: true,
            use_strings: true,
            use_access_flags: true,
            use_opcodes: false,
        }
    }
}

impl SolverSettings {
    /// True when no emitting category is enabled.
    pub fn is_empty(&self) -> bool {
        !(self.use_return_type || self.use_parameters || self.use_strings || self.use_access_flags)
    }
}

/// Deterministic, pure mapping from a method record to its feature set.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor {
    settings: SolverSettings,
}

impl FeatureExtractor {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> SolverSettings {
        self.settings
    }

    /// Extract the feature set of one method.
    ///
    /// Empty descriptors are skipped rather than emitted as empty values, so a
    /// partially filled record yields a partial set. Parameter slots keep their
    /// original positions.
    pub fn extract(&self, method: &MethodRecord) -> FeatureSet {
        let mut features = FeatureSet::new();

        if self.settings.use_return_type && !method.return_type.is_empty() {
            features.insert(Feature::return_type(&method.return_type));
        }

        if self.settings.use_parameters {
            let slots = method.parameters.iter().enumerate().take(MAX_PARAMETER_INDEX + 1);
            for (index, descriptor) in slots {
                if !descriptor.is_empty() {
                    features.insert(Feature::parameter(index, descriptor));
                }
            }
        }

        if self.settings.use_strings {
            for literal in &method.strings {
                features.insert(Feature::string(literal));
            }
        }

        if self.settings.use_access_flags {
            features.insert(Feature::access_flags(method.access_flags));
        }

        features
    }
}

/// Extract with default settings (every category on).
pub fn extract(method: &MethodRecord) -> FeatureSet {
    FeatureExtractor::default().extract(method)
}
