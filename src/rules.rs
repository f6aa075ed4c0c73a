//! Rule registration and compilation
//!
//! A rule set is built once, compiled with [`RuleSetBuilder::finalize`],
//! and read-only for the rest of the process. Registration order is the
//! match priority: when two rules match at the same offset, the one
//! registered first wins.

use regex::Regex;
use thiserror::Error;
use tracing::warn;

/// Identifier of a registered attribute class.
///
/// Attribute classes are opaque to the engine; a theme resolves their
/// names to display styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrId(pub(crate) u16);

/// Identifier of a compiled range rule, stored in line states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RangeId(pub(crate) u16);

/// A malformed rule pattern, detected at finalize time.
///
/// Never fatal: the offending rule is logged, dropped from matching, and
/// kept for inspection on the finalized set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid pattern '{pattern}': {message}")]
pub struct PatternError {
    /// The offending pattern text
    pub pattern: String,
    /// Human-readable diagnostic from the regex engine
    pub message: String,
}

/// Specification of a multi-line range rule, before compilation
#[derive(Debug, Clone)]
pub struct RangeSpec {
    /// Pattern that opens the range
    pub start: String,
    /// Pattern that closes the range
    pub end: String,
    /// Pattern consumed without closing (escaped delimiters)
    pub skip: Option<String>,
    /// Whether the range always closes at end of line
    pub one_line: bool,
}

impl RangeSpec {
    /// Create a range bounded by a start and end pattern
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            skip: None,
            one_line: false,
        }
    }

    /// Builder: set a skip pattern matched before the end pattern
    pub fn with_skip(mut self, skip: &str) -> Self {
        self.skip = Some(skip.to_string());
        self
    }

    /// Builder: confine the range to a single line
    pub fn one_line(mut self) -> Self {
        self.one_line = true;
        self
    }
}

/// A registered rule, before compilation
#[derive(Debug, Clone)]
enum RuleSpec {
    /// Word-boundary-delimited literal
    Keyword(String),
    /// Regex whose capture group becomes the highlighted span
    Regex { pattern: String, group: usize },
    /// Multi-line region
    Range(RangeSpec),
}

/// Ordered rule registration, write-once
///
/// Obtained from [`RuleSet::builder`]; consumed by
/// [`RuleSetBuilder::finalize`].
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    attrs: Vec<String>,
    rules: Vec<(AttrId, RuleSpec)>,
}

impl RuleSetBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attribute class, or return the id of an existing one
    pub fn attr(&mut self, name: &str) -> AttrId {
        if let Some(idx) = self.attrs.iter().position(|a| a == name) {
            return AttrId(idx as u16);
        }
        self.attrs.push(name.to_string());
        AttrId((self.attrs.len() - 1) as u16)
    }

    /// Register a word-boundary-delimited keyword
    pub fn keyword(&mut self, attr: AttrId, word: &str) {
        self.rules.push((attr, RuleSpec::Keyword(word.to_string())));
    }

    /// Register a regex rule highlighting the whole match
    pub fn regex(&mut self, attr: AttrId, pattern: &str) {
        self.regex_group(attr, pattern, 0);
    }

    /// Register a regex rule highlighting one capture group of the match
    pub fn regex_group(&mut self, attr: AttrId, pattern: &str, group: usize) {
        self.rules.push((
            attr,
            RuleSpec::Regex {
                pattern: pattern.to_string(),
                group,
            },
        ));
    }

    /// Register a multi-line range rule
    pub fn range(&mut self, attr: AttrId, spec: RangeSpec) {
        self.rules.push((attr, RuleSpec::Range(spec)));
    }

    /// Compile all patterns into an immutable [`RuleSet`]
    ///
    /// Malformed patterns are logged at WARN and dropped from matching;
    /// they are never fatal and can be inspected afterwards with
    /// [`RuleSet::pattern_errors`].
    pub fn finalize(self) -> RuleSet {
        let mut rules = Vec::new();
        let mut ranges = Vec::new();
        let mut errors = Vec::new();

        for (attr, spec) in self.rules {
            match compile(attr, spec, ranges.len()) {
                Ok(rule) => {
                    if matches!(rule, CompiledRule::Range(_)) {
                        ranges.push(rules.len());
                    }
                    rules.push(rule);
                }
                Err(err) => {
                    warn!(pattern = %err.pattern, "dropping malformed rule: {}", err.message);
                    errors.push(err);
                }
            }
        }

        RuleSet {
            attrs: self.attrs,
            rules,
            ranges,
            errors,
        }
    }
}

/// Compile one rule spec; range rules get the next free range id
fn compile(attr: AttrId, spec: RuleSpec, next_range: usize) -> Result<CompiledRule, PatternError> {
    match spec {
        RuleSpec::Keyword(word) => {
            let pattern = format!(r"\b{}\b", regex::escape(&word));
            let regex = compile_pattern(&pattern)?;
            Ok(CompiledRule::Pattern(PatternRule {
                attr,
                regex,
                group: 0,
            }))
        }
        RuleSpec::Regex { pattern, group } => {
            let regex = compile_pattern(&pattern)?;
            if group >= regex.captures_len() {
                return Err(PatternError {
                    pattern,
                    message: format!("pattern has no capture group {}", group),
                });
            }
            Ok(CompiledRule::Pattern(PatternRule { attr, regex, group }))
        }
        RuleSpec::Range(spec) => {
            let start = compile_pattern(&spec.start)?;
            let end = compile_pattern(&spec.end)?;
            let skip = match &spec.skip {
                Some(pattern) => Some(compile_pattern(pattern)?),
                None => None,
            };
            Ok(CompiledRule::Range(RangeRule {
                attr,
                id: RangeId(next_range as u16),
                start,
                end,
                skip,
                one_line: spec.one_line,
            }))
        }
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(pattern).map_err(|err| PatternError {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })
}

/// A compiled single-line rule
#[derive(Debug)]
pub(crate) struct PatternRule {
    pub(crate) attr: AttrId,
    pub(crate) regex: Regex,
    pub(crate) group: usize,
}

/// A successful pattern match
#[derive(Debug, Clone, Copy)]
pub(crate) struct PatternMatch {
    /// Start of the whole match
    pub(crate) start: usize,
    /// End of the whole match (where the scan resumes)
    pub(crate) end: usize,
    /// The capture group interval that becomes the span
    pub(crate) group: (usize, usize),
}

impl PatternRule {
    /// Leftmost match at or after `pos` whose capture group produced text.
    ///
    /// Matching runs over the whole line so `^` and `\b` keep their real
    /// anchors; zero-width matches are stepped over.
    pub(crate) fn find_from(&self, text: &str, pos: usize) -> Option<PatternMatch> {
        let mut at = pos;
        while at <= text.len() {
            let caps = self.regex.captures_at(text, at)?;
            let whole = caps.get(0).expect("group 0 always participates");
            let group = caps.get(self.group);
            match group {
                Some(g) if g.end() > g.start() => {
                    return Some(PatternMatch {
                        start: whole.start(),
                        end: whole.end(),
                        group: (g.start(), g.end()),
                    });
                }
                _ => {
                    // Group absent or empty here; retry past this match.
                    at = next_char_boundary(text, whole.start());
                }
            }
        }
        None
    }
}

/// A compiled multi-line range rule
#[derive(Debug)]
pub(crate) struct RangeRule {
    pub(crate) attr: AttrId,
    pub(crate) id: RangeId,
    pub(crate) start: Regex,
    pub(crate) end: Regex,
    pub(crate) skip: Option<Regex>,
    pub(crate) one_line: bool,
}

impl RangeRule {
    /// Leftmost non-empty start match at or after `pos`
    pub(crate) fn find_start(&self, text: &str, pos: usize) -> Option<(usize, usize)> {
        self.start
            .find_at(text, pos)
            .filter(|m| m.end() > m.start())
            .map(|m| (m.start(), m.end()))
    }

    /// Where the range closes, searching from `from`.
    ///
    /// Skip matches are consumed before the end pattern is honored, so an
    /// escaped delimiter never closes the range. Returns the byte offset
    /// one past the end match, or None if the range stays open.
    pub(crate) fn find_close(&self, text: &str, from: usize) -> Option<usize> {
        let mut pos = from;
        loop {
            let end = self.end.find_at(text, pos)?;
            if let Some(skip) = self.skip.as_ref().and_then(|s| s.find_at(text, pos)) {
                if skip.start() <= end.start() && skip.end() > pos {
                    pos = skip.end();
                    continue;
                }
            }
            return Some(end.end());
        }
    }
}

/// A compiled rule in registration order
#[derive(Debug)]
pub(crate) enum CompiledRule {
    Pattern(PatternRule),
    Range(RangeRule),
}

/// A finalized, immutable rule table
///
/// Freely shareable; scanning never mutates it.
#[derive(Debug)]
pub struct RuleSet {
    attrs: Vec<String>,
    pub(crate) rules: Vec<CompiledRule>,
    /// Index into `rules` per range id
    ranges: Vec<usize>,
    errors: Vec<PatternError>,
}

impl RuleSet {
    /// Start building a rule set
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::new()
    }

    /// Name of a registered attribute class
    pub fn attr_name(&self, attr: AttrId) -> &str {
        &self.attrs[attr.0 as usize]
    }

    /// Number of registered attribute classes
    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    /// Number of active (successfully compiled) rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Patterns dropped at finalize time
    pub fn pattern_errors(&self) -> &[PatternError] {
        &self.errors
    }

    pub(crate) fn range_rule(&self, id: RangeId) -> Option<&RangeRule> {
        let idx = *self.ranges.get(id.0 as usize)?;
        match &self.rules[idx] {
            CompiledRule::Range(rule) => Some(rule),
            CompiledRule::Pattern(_) => None,
        }
    }
}

/// Smallest byte offset greater than `pos` that is a char boundary
fn next_char_boundary(text: &str, pos: usize) -> usize {
    let mut next = pos + 1;
    while next < text.len() && !text.is_char_boundary(next) {
        next += 1;
    }
    next
}
