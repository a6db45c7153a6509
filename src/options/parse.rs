//! The argv parser and the ordered option log it produces.

use super::{longest_prefix_match, option_def, OptionGroup, OptionId, OptionKind};
use crate::error::{DriverError, Result};

/// The spelling of the standard-input sentinel.
pub const STDIN_SENTINEL: &str = "-";

/// What a parsed entry stands for: a schema option or a positional input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParsedOptionId {
    Opt(OptionId),
    Input,
}

/// The argument payload of a parsed option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    None,
    Single(String),
    Multiple(Vec<String>),
}

impl OptionValue {
    /// The single value, if this is a single-valued entry.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            _ => None,
        }
    }
}

/// One option occurrence, in appearance order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedOption {
    pub id: ParsedOptionId,
    pub value: OptionValue,
}

impl ParsedOption {
    fn opt(id: OptionId, value: OptionValue) -> Self {
        Self { id: ParsedOptionId::Opt(id), value }
    }

    fn input(path: impl Into<String>) -> Self {
        Self { id: ParsedOptionId::Input, value: OptionValue::Single(path.into()) }
    }

    /// Returns the canonical option id unless this entry is an input.
    pub fn option_id(&self) -> Option<OptionId> {
        match self.id {
            ParsedOptionId::Opt(id) => Some(id),
            ParsedOptionId::Input => None,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self.id, ParsedOptionId::Input)
    }
}

/// The ordered, multiplicity-preserving log of parsed options.
///
/// The log is append-only except for [`ParsedOptions::for_each_modifying`],
/// which the working-directory pass uses to rewrite path values in place.
/// Consuming a value never removes it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedOptions {
    entries: Vec<ParsedOption>,
}

impl ParsedOptions {
    pub fn iter(&self) -> impl Iterator<Item = &ParsedOption> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The last occurrence of `id`, if any.
    pub fn last(&self, id: OptionId) -> Option<&ParsedOption> {
        self.entries.iter().rev().find(|entry| entry.option_id() == Some(id))
    }

    /// The value of the last occurrence of `id`.
    pub fn last_value(&self, id: OptionId) -> Option<&str> {
        self.last(id).and_then(|entry| entry.value.as_single())
    }

    /// The last option belonging to `group`.
    pub fn last_in_group(&self, group: OptionGroup) -> Option<&ParsedOption> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.option_id().is_some_and(|id| option_def(id).group == Some(group)))
    }

    pub fn contains(&self, id: OptionId) -> bool {
        self.entries.iter().any(|entry| entry.option_id() == Some(id))
    }

    pub fn contains_any(&self, ids: &[OptionId]) -> bool {
        self.entries.iter().any(|entry| entry.option_id().is_some_and(|id| ids.contains(&id)))
    }

    /// All inputs in source order.
    ///
    /// Tokens swallowed by `--` count as inputs and always come last, since
    /// `--` consumes the remainder of argv.
    pub fn inputs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().flat_map(|entry| match (&entry.id, &entry.value) {
            (ParsedOptionId::Input, OptionValue::Single(path)) => vec![path.as_str()],
            (ParsedOptionId::Opt(OptionId::DashDash), OptionValue::Multiple(paths)) => {
                paths.iter().map(String::as_str).collect()
            }
            _ => Vec::new(),
        })
    }

    /// Applies `f` to every entry in place.
    ///
    /// This is the only sanctioned mutation of a parsed option log; it exists
    /// for the working-directory path rewrite.
    pub fn for_each_modifying(&mut self, mut f: impl FnMut(&mut ParsedOption)) {
        for entry in &mut self.entries {
            f(entry);
        }
    }

    /// Reconstructs an argv-style vector using canonical spellings.
    ///
    /// Order and multiplicity of both options and inputs are preserved.
    pub fn to_arguments(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            match entry.id {
                ParsedOptionId::Input => {
                    if let OptionValue::Single(path) = &entry.value {
                        args.push(path.clone());
                    }
                }
                ParsedOptionId::Opt(id) => {
                    let def = option_def(id);
                    match (&entry.value, def.kind) {
                        (OptionValue::None, _) => args.push(def.spelling.to_string()),
                        (OptionValue::Single(value), OptionKind::Joined) => {
                            args.push(format!("{}{value}", def.spelling));
                        }
                        (OptionValue::Single(value), _) => {
                            args.push(def.spelling.to_string());
                            args.push(value.clone());
                        }
                        (OptionValue::Multiple(values), _) => {
                            args.push(def.spelling.to_string());
                            args.extend(values.iter().cloned());
                        }
                    }
                }
            }
        }
        args
    }

    fn push(&mut self, entry: ParsedOption) {
        self.entries.push(entry);
    }
}

/// Parses an argv tail against the option schema.
///
/// The parser preserves order and multiplicity, never folds duplicates, and
/// resolves aliases to their canonical option.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArgumentParser;

impl ArgumentParser {
    /// Parses `args` (the argv tail, without argv[0]).
    pub fn parse<I, S>(args: I) -> Result<ParsedOptions>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|arg| arg.as_ref().to_string()).collect();
        let mut parsed = ParsedOptions::default();
        let mut iter = args.into_iter();

        while let Some(token) = iter.next() {
            if token == STDIN_SENTINEL {
                parsed.push(ParsedOption::input(STDIN_SENTINEL));
                continue;
            }
            if !token.starts_with('-') {
                parsed.push(ParsedOption::input(token));
                continue;
            }

            let Some(def) = longest_prefix_match(&token) else {
                return Err(DriverError::UnknownOption(token));
            };
            let id = def.canonical_id();
            let suffix = &token[def.spelling.len()..];

            match def.kind {
                OptionKind::Flag => {
                    if !suffix.is_empty() {
                        return Err(DriverError::UnknownOption(token));
                    }
                    parsed.push(ParsedOption::opt(id, OptionValue::None));
                }
                OptionKind::Joined => {
                    parsed.push(ParsedOption::opt(id, OptionValue::Single(suffix.to_string())));
                }
                OptionKind::Separate => {
                    if !suffix.is_empty() {
                        return Err(DriverError::UnknownOption(token));
                    }
                    let value = iter
                        .next()
                        .ok_or_else(|| DriverError::MissingValue(def.spelling.to_string()))?;
                    parsed.push(ParsedOption::opt(id, OptionValue::Single(value)));
                }
                OptionKind::JoinedOrSeparate => {
                    if !suffix.is_empty() {
                        parsed.push(ParsedOption::opt(id, OptionValue::Single(suffix.to_string())));
                    } else {
                        let value = iter
                            .next()
                            .ok_or_else(|| DriverError::MissingValue(def.spelling.to_string()))?;
                        parsed.push(ParsedOption::opt(id, OptionValue::Single(value)));
                    }
                }
                OptionKind::RemainingArgs => {
                    if !suffix.is_empty() {
                        return Err(DriverError::UnknownOption(token));
                    }
                    let rest: Vec<String> = iter.by_ref().collect();
                    parsed.push(ParsedOption::opt(id, OptionValue::Multiple(rest)));
                }
            }
        }

        trace!("parsed {} option occurrences", parsed.len());
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> ParsedOptions {
        ArgumentParser::parse(args.iter().copied()).unwrap()
    }

    #[test]
    fn preserves_order_and_multiplicity() {
        let parsed = parse(&["-g", "a.swift", "-g", "b.swift", "-module-name", "M"]);
        let round_trip = parse(&parsed.to_arguments().iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(parsed, round_trip);
        assert_eq!(parsed.inputs().collect::<Vec<_>>(), vec!["a.swift", "b.swift"]);
        assert_eq!(
            parsed.iter().filter(|entry| entry.option_id() == Some(OptionId::G)).count(),
            2
        );
    }

    #[test]
    fn resolves_aliases() {
        let parsed = parse(&["-c", "a.swift"]);
        assert!(parsed.contains(OptionId::EmitObject));
    }

    #[test]
    fn joined_and_separate_values() {
        let parsed = parse(&["-o", "out", "-oout2", "-debug-info-format=codeview"]);
        let outputs: Vec<_> = parsed
            .iter()
            .filter(|entry| entry.option_id() == Some(OptionId::Output))
            .map(|entry| entry.value.as_single().unwrap())
            .collect();
        assert_eq!(outputs, vec!["out", "out2"]);
        assert_eq!(parsed.last_value(OptionId::DebugInfoFormat), Some("codeview"));
    }

    #[test]
    fn stdin_sentinel_is_an_input() {
        let parsed = parse(&["-", "-typecheck"]);
        assert_eq!(parsed.inputs().collect::<Vec<_>>(), vec![STDIN_SENTINEL]);
        assert!(parsed.contains(OptionId::Typecheck));
    }

    #[test]
    fn remaining_args_become_inputs() {
        let parsed = parse(&["-emit-object", "--", "-weird.swift", "b.swift"]);
        assert_eq!(parsed.inputs().collect::<Vec<_>>(), vec!["-weird.swift", "b.swift"]);
        assert_eq!(
            parsed.last(OptionId::DashDash).unwrap().value,
            OptionValue::Multiple(vec!["-weird.swift".to_string(), "b.swift".to_string()])
        );
    }

    #[test]
    fn unknown_option_and_missing_value_fail() {
        assert!(matches!(
            ArgumentParser::parse(["-definitely-not-an-option"]),
            Err(DriverError::UnknownOption(_))
        ));
        assert!(matches!(
            ArgumentParser::parse(["-module-name"]),
            Err(DriverError::MissingValue(_))
        ));
        // a flag does not accept joined text
        assert!(matches!(
            ArgumentParser::parse(["-gsomething"]),
            Err(DriverError::UnknownOption(_))
        ));
    }

    #[test]
    fn last_in_group_wins() {
        let parsed = parse(&["-g", "-gnone", "-gline-tables-only"]);
        assert_eq!(
            parsed.last_in_group(OptionGroup::DebugInfo).unwrap().option_id(),
            Some(OptionId::GlineTablesOnly)
        );
    }
}
