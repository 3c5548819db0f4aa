use std::iter::Peekable;
use std::str::Chars;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::{Feature, MAX_PARAMETER_INDEX};
use crate::model::AccessFlag;

const HEADER: &str = "fingerprint";
const FLAG_QUALIFIER: &str = "AccessFlags.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("Pattern must start with 'fingerprint {{'")]
    MissingHeader,

    #[error("Pattern is missing its closing '}}'")]
    Unterminated,

    #[error("Line {line}: {message}")]
    Syntax { line: usize, message: String },
}

fn syntax(line: usize, message: impl Into<String>) -> PatternError {
    PatternError::Syntax { line, message: message.into() }
}

/// Feature values recovered from a rendered pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPattern {
    pub return_type: Option<String>,
    pub access_flags: Option<u32>,
    /// Positional slots; `None` marks an unconstrained placeholder.
    pub parameters: Option<Vec<Option<String>>>,
    pub strings: Vec<String>,
}

impl ParsedPattern {
    /// Convert back into feature tokens. Placeholder slots produce nothing.
    pub fn to_features(&self) -> Vec<Feature> {
        let mut features = Vec::new();
        if let Some(return_type) = &self.return_type {
            features.push(Feature::return_type(return_type));
        }
        if let Some(bits) = self.access_flags {
            features.push(Feature::access_flags(bits));
        }
        if let Some(parameters) = &self.parameters {
            for (index, slot) in parameters.iter().enumerate() {
                if let Some(descriptor) = slot {
                    features.push(Feature::parameter(index, descriptor));
                }
            }
        }
        features.extend(self.strings.iter().map(Feature::string));
        features.sort();
        features
    }
}

enum Arg {
    Quoted(String),
    Bare(String),
}

/// Parse a pattern produced by the renderer back into feature values.
///
/// Sections may come in any order but each may appear only once.
pub fn parse_pattern(text: &str) -> Result<ParsedPattern, PatternError> {
    let rest = text.trim().strip_prefix(HEADER).ok_or(PatternError::MissingHeader)?;
    let body = rest.trim_start().strip_prefix('{').ok_or(PatternError::MissingHeader)?;
    let body = body.trim_end().strip_suffix('}').ok_or(PatternError::Unterminated)?;

    let mut pattern = ParsedPattern::default();
    let mut seen_strings = false;

    for (offset, raw) in body.lines().enumerate() {
        let line = offset + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let open = trimmed.find('(').ok_or_else(|| syntax(line, "expected 'section(...)'"))?;
        let inner = trimmed[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| syntax(line, "section is missing its closing ')'"))?;
        let name = trimmed[..open].trim();
        let args = parse_args(inner, line)?;

        match name {
            "returns" => {
                if pattern.return_type.is_some() {
                    return Err(syntax(line, "duplicate returns section"));
                }
                match args.as_slice() {
                    [Arg::Quoted(value)] => pattern.return_type = Some(value.clone()),
                    _ => return Err(syntax(line, "returns takes exactly one string literal")),
                }
            }
            "accessFlags" => {
                if pattern.access_flags.is_some() {
                    return Err(syntax(line, "duplicate accessFlags section"));
                }
                let mut flags = Vec::with_capacity(args.len());
                for arg in &args {
                    let Arg::Bare(name) = arg else {
                        return Err(syntax(line, "access flags are not quoted"));
                    };
                    let bare = name.strip_prefix(FLAG_QUALIFIER).unwrap_or(name);
                    let flag = AccessFlag::from_name(bare)
                        .ok_or_else(|| syntax(line, format!("unknown access flag '{name}'")))?;
                    flags.push(flag);
                }
                pattern.access_flags = Some(AccessFlag::encode(&flags));
            }
            "parameters" => {
                if pattern.parameters.is_some() {
                    return Err(syntax(line, "duplicate parameters section"));
                }
                let values = quoted_values(args, line, "parameters")?;
                if values.len() > MAX_PARAMETER_INDEX + 1 {
                    return Err(syntax(
                        line,
                        format!("parameters section has more than {} slots", MAX_PARAMETER_INDEX + 1),
                    ));
                }
                pattern.parameters = Some(
                    values
                        .into_iter()
                        .map(|value| if value.is_empty() { None } else { Some(value) })
                        .collect(),
                );
            }
            "strings" => {
                if seen_strings {
                    return Err(syntax(line, "duplicate strings section"));
                }
                seen_strings = true;
                pattern.strings = quoted_values(args, line, "strings")?;
            }
            other => return Err(syntax(line, format!("unknown section '{other}'"))),
        }
    }

    Ok(pattern)
}

fn quoted_values(args: Vec<Arg>, line: usize, section: &str) -> Result<Vec<String>, PatternError> {
    args.into_iter()
        .map(|arg| match arg {
            Arg::Quoted(value) => Ok(value),
            Arg::Bare(value) => {
                Err(syntax(line, format!("{section} expects string literals, found '{value}'")))
            }
        })
        .collect()
}

fn parse_args(src: &str, line: usize) -> Result<Vec<Arg>, PatternError> {
    let mut args = Vec::new();
    let mut chars = src.chars().peekable();

    loop {
        skip_whitespace(&mut chars);
        match chars.peek() {
            None if args.is_empty() => break,
            None => return Err(syntax(line, "trailing ',' in argument list")),
            Some('"') => {
                chars.next();
                args.push(Arg::Quoted(read_literal(&mut chars, line)?));
            }
            Some(_) => {
                let mut bare = String::new();
                while let Some(&c) = chars.peek() {
                    if c == ',' || c.is_whitespace() {
                        break;
                    }
                    bare.push(c);
                    chars.next();
                }
                args.push(Arg::Bare(bare));
            }
        }

        skip_whitespace(&mut chars);
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(c) => return Err(syntax(line, format!("unexpected '{c}' after argument"))),
        }
    }

    Ok(args)
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

/// Read a string literal body; the opening quote is already consumed.
fn read_literal(chars: &mut Peekable<Chars<'_>>, line: usize) -> Result<String, PatternError> {
    let mut out = String::new();
    loop {
        match chars.next() {
            None => return Err(syntax(line, "unterminated string literal")),
            Some('"') => return Ok(out),
            Some('\\') => match chars.next() {
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some('$') => out.push('$'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(other) => return Err(syntax(line, format!("unknown escape '\\{other}'"))),
                None => return Err(syntax(line, "unterminated string literal")),
            },
            Some(c) => out.push(c),
        }
    }
}
