//! Line scanning
//!
//! Turns one line of text plus the multi-line range context it starts
//! with into a sequence of attributed spans and the context for the next
//! line. Scanning is pure: same text and entry state, same result.

use crate::rules::{AttrId, CompiledRule, PatternMatch, RangeId, RangeRule, RuleSet};

/// The multi-line range context a line starts with
///
/// At most one range is open at a time; ranges do not nest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineState {
    open: Option<RangeId>,
}

impl LineState {
    /// State for being inside an open range
    pub(crate) fn inside(id: RangeId) -> Self {
        Self { open: Some(id) }
    }

    pub(crate) fn open_range(&self) -> Option<RangeId> {
        self.open
    }

    /// Check if no range is open
    pub fn is_normal(&self) -> bool {
        self.open.is_none()
    }

    /// Check if a multi-line range is open
    pub fn is_inside_range(&self) -> bool {
        self.open.is_some()
    }
}

/// A contiguous byte interval within one line, tagged with an attribute
/// class
///
/// Half-open: `[start, end)`. Spans of one scan never overlap; bytes not
/// covered by any span carry the default style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Byte offset where this span starts (inclusive)
    pub start: usize,
    /// Byte offset where this span ends (exclusive)
    pub end: usize,
    /// Attribute class for this span
    pub attr: AttrId,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize, attr: AttrId) -> Self {
        Self { start, end, attr }
    }

    /// Check if this span contains a byte position
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Get the length of this span in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Result of scanning a single line
#[derive(Debug)]
pub struct LineScan {
    /// Attributed spans, in line order, non-overlapping
    pub spans: Vec<Span>,
    /// State at end of line (entry state for the next line)
    pub exit: LineState,
}

impl RuleSet {
    /// Scan one line of text against the rule table.
    ///
    /// `entry` is the state the previous line ended with. The leftmost
    /// structural match wins; ties at one offset go to the rule registered
    /// first. A regex rule's span covers its capture group while the scan
    /// advances past the whole match.
    pub fn scan_line(&self, text: &str, entry: LineState) -> LineScan {
        let mut spans = Vec::new();
        let mut pos = 0;

        // Resume a range left open by the previous line.
        if let Some(id) = entry.open_range() {
            if let Some(rule) = self.range_rule(id) {
                match rule.find_close(text, 0) {
                    Some(close) => {
                        push_span(&mut spans, Span::new(0, close, rule.attr));
                        pos = close;
                    }
                    None => {
                        push_span(&mut spans, Span::new(0, text.len(), rule.attr));
                        return LineScan { spans, exit: entry };
                    }
                }
            }
            // An id the table doesn't know is stale state; rescan from
            // scratch.
        }

        while pos < text.len() {
            let Some(hit) = self.earliest_match(text, pos) else {
                break;
            };

            match hit {
                Hit::Pattern { m, attr } => {
                    push_span(&mut spans, Span::new(m.group.0, m.group.1, attr));
                    pos = m.end;
                }
                Hit::Range { rule, start, body } => match rule.find_close(text, body) {
                    Some(close) => {
                        push_span(&mut spans, Span::new(start, close, rule.attr));
                        pos = close;
                    }
                    None if rule.one_line => {
                        // One-line ranges close at end of line no matter
                        // what.
                        push_span(&mut spans, Span::new(start, text.len(), rule.attr));
                        pos = text.len();
                    }
                    None => {
                        push_span(&mut spans, Span::new(start, text.len(), rule.attr));
                        return LineScan {
                            spans,
                            exit: LineState::inside(rule.id),
                        };
                    }
                },
            }
        }

        LineScan {
            spans,
            exit: LineState::default(),
        }
    }

    /// Earliest structural match at or after `pos`.
    ///
    /// Strictly-earlier offsets win; at equal offsets the rule registered
    /// first wins because iteration follows registration order.
    fn earliest_match(&self, text: &str, pos: usize) -> Option<Hit<'_>> {
        let mut best: Option<(usize, Hit)> = None;
        for rule in &self.rules {
            let found = match rule {
                CompiledRule::Pattern(p) => p
                    .find_from(text, pos)
                    .map(|m| (m.start, Hit::Pattern { m, attr: p.attr })),
                CompiledRule::Range(r) => r
                    .find_start(text, pos)
                    .map(|(start, body)| (start, Hit::Range { rule: r, start, body })),
            };
            if let Some((at, hit)) = found {
                if best.as_ref().map_or(true, |(b, _)| at < *b) {
                    let unbeatable = at == pos;
                    best = Some((at, hit));
                    if unbeatable {
                        // Nothing later in the table can beat a match
                        // at the scan position itself.
                        break;
                    }
                }
            }
        }
        best.map(|(_, hit)| hit)
    }
}

/// A structural match candidate during one scan step
enum Hit<'a> {
    Pattern { m: PatternMatch, attr: AttrId },
    Range {
        rule: &'a RangeRule,
        start: usize,
        body: usize,
    },
}

fn push_span(spans: &mut Vec<Span>, span: Span) {
    if !span.is_empty() {
        spans.push(span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RangeSpec;

    /// Line-comment range, block-comment range, and number rules in the
    /// shape the built-in definition uses them.
    fn test_rules() -> RuleSet {
        let mut builder = RuleSet::builder();
        let comment = builder.attr("comment");
        builder.range(comment, RangeSpec::new(r"/\*", r"\*/"));
        builder.range(comment, RangeSpec::new("//", "$").one_line());
        let preproc = builder.attr("preprocessor");
        builder.regex_group(preproc, r"(#define\s+\w+)", 1);
        let number = builder.attr("number");
        builder.regex_group(number, r"(^|\W)(-?(\d+\.\d*)|(\d*\.\d+))\b", 2);
        builder.regex_group(number, r"(^|\W)(-?\d+)\b", 2);
        builder.regex_group(number, r"(^|\W)(0[xX][0-9a-fA-F]+)\b", 2);
        let rules = builder.finalize();
        assert!(rules.pattern_errors().is_empty());
        rules
    }

    fn attr_of(rules: &RuleSet, span: &Span) -> String {
        rules.attr_name(span.attr).to_string()
    }

    #[test]
    fn test_comment_covers_whole_line() {
        let rules = test_rules();
        let scan = rules.scan_line("// comment #define X 1", LineState::default());

        // One span, the comment wins over the preprocessor rule because it
        // starts first and runs to end of line.
        assert_eq!(scan.spans.len(), 1);
        assert_eq!(scan.spans[0].start, 0);
        assert_eq!(scan.spans[0].end, "// comment #define X 1".len());
        assert_eq!(attr_of(&rules, &scan.spans[0]), "comment");
        assert!(scan.exit.is_normal());
    }

    #[test]
    fn test_number_spans_leave_gaps() {
        let rules = test_rules();
        let text = "x = 0x1F + 10";
        let scan = rules.scan_line(text, LineState::default());

        assert_eq!(scan.spans.len(), 2);
        assert_eq!(&text[scan.spans[0].start..scan.spans[0].end], "0x1F");
        assert_eq!(&text[scan.spans[1].start..scan.spans[1].end], "10");
        for span in &scan.spans {
            assert_eq!(attr_of(&rules, span), "number");
        }
        // '+', '=', and the whitespace stay unattributed.
        assert!(!scan.spans.iter().any(|s| s.contains(9)));
    }

    #[test]
    fn test_scan_is_idempotent() {
        let rules = test_rules();
        let text = "a /* b */ 12 // c";
        let first = rules.scan_line(text, LineState::default());
        let second = rules.scan_line(text, LineState::default());
        assert_eq!(first.spans, second.spans);
        assert_eq!(first.exit, second.exit);
    }

    #[test]
    fn test_spans_never_overlap() {
        let rules = test_rules();
        for text in ["/* a */ 1 // b", "0x10 20 30", "//", "#define A 1"] {
            let scan = rules.scan_line(text, LineState::default());
            for pair in scan.spans.windows(2) {
                assert!(pair[0].end <= pair[1].start, "overlap in {:?}", text);
            }
        }
    }

    #[test]
    fn test_registration_order_wins_ties() {
        let mut builder = RuleSet::builder();
        let early = builder.attr("early");
        let late = builder.attr("late");
        builder.regex(early, "foo");
        builder.regex(late, "foobar");
        let rules = builder.finalize();

        // Both rules match at offset 0; the one registered first wins and
        // the other is suppressed for the overlapping region.
        let scan = rules.scan_line("foobar", LineState::default());
        assert_eq!(scan.spans.len(), 1);
        assert_eq!(rules.attr_name(scan.spans[0].attr), "early");
        assert_eq!((scan.spans[0].start, scan.spans[0].end), (0, 3));
    }

    #[test]
    fn test_multiline_open_continue_close() {
        let rules = test_rules();

        let opened = rules.scan_line("code /* comment", LineState::default());
        assert!(opened.exit.is_inside_range());
        assert_eq!(opened.spans.last().unwrap().start, 5);
        assert_eq!(opened.spans.last().unwrap().end, 15);

        let middle = rules.scan_line("still inside", opened.exit);
        assert!(middle.exit.is_inside_range());
        assert_eq!(middle.spans.len(), 1);
        assert_eq!((middle.spans[0].start, middle.spans[0].end), (0, 12));

        let closed = rules.scan_line("end */ 42", middle.exit);
        assert!(closed.exit.is_normal());
        assert_eq!((closed.spans[0].start, closed.spans[0].end), (0, 6));
        // Scanning resumes after the close: "42" is a number span.
        assert_eq!(&"end */ 42"[closed.spans[1].start..closed.spans[1].end], "42");
    }

    #[test]
    fn test_one_line_range_does_not_leak() {
        let rules = test_rules();
        let scan = rules.scan_line("x // unterminated", LineState::default());
        assert!(scan.exit.is_normal());
        assert_eq!(scan.spans.last().unwrap().end, "x // unterminated".len());
    }

    #[test]
    fn test_one_line_range_without_end_closes_at_eol() {
        let mut builder = RuleSet::builder();
        let tag = builder.attr("tag");
        builder.range(tag, RangeSpec::new("<", ">").one_line());
        let rules = builder.finalize();

        let scan = rules.scan_line("a <unclosed", LineState::default());
        assert!(scan.exit.is_normal());
        assert_eq!(
            (scan.spans[0].start, scan.spans[0].end),
            (2, "a <unclosed".len())
        );
    }

    #[test]
    fn test_escaped_delimiter_does_not_close() {
        let mut builder = RuleSet::builder();
        let string = builder.attr("string");
        builder.range(string, RangeSpec::new("\"", "\"").with_skip(r#"\\""#));
        let rules = builder.finalize();

        let text = r#""a\"b" x"#;
        let scan = rules.scan_line(text, LineState::default());
        assert!(scan.exit.is_normal());
        assert_eq!(scan.spans.len(), 1);
        // The string closes at the first unescaped quote, offset 5.
        assert_eq!((scan.spans[0].start, scan.spans[0].end), (0, 6));
    }

    #[test]
    fn test_anchored_end_only_at_line_start() {
        let mut builder = RuleSet::builder();
        let comment = builder.attr("comment");
        builder.range(
            comment,
            RangeSpec::new(r"^\s*#\s*if\s+0\b", r"^\s*#\s*(else|endif|elif|elifdef)\b"),
        );
        let rules = builder.finalize();

        let opened = rules.scan_line("#if 0", LineState::default());
        assert!(opened.exit.is_inside_range());

        // A mid-line "#else" must not close the block.
        let inside = rules.scan_line("code #else more", opened.exit);
        assert!(inside.exit.is_inside_range());
        assert_eq!((inside.spans[0].start, inside.spans[0].end), (0, 15));

        // A true directive line does.
        let closed = rules.scan_line("  #endif", inside.exit);
        assert!(closed.exit.is_normal());
        assert_eq!((closed.spans[0].start, closed.spans[0].end), (0, 8));
    }

    #[test]
    fn test_full_coverage_partition() {
        let rules = test_rules();
        let text = "// every byte styled";
        let scan = rules.scan_line(text, LineState::default());

        // With a line comment the spans partition [0, len) exactly.
        let covered: usize = scan.spans.iter().map(|s| s.len()).sum();
        assert_eq!(covered, text.len());
        assert_eq!(scan.spans.first().unwrap().start, 0);
        assert_eq!(scan.spans.last().unwrap().end, text.len());
    }

    #[test]
    fn test_block_comment_closes_same_line() {
        let rules = test_rules();
        let text = "a /* b */ c";
        let scan = rules.scan_line(text, LineState::default());
        assert!(scan.exit.is_normal());
        assert_eq!((scan.spans[0].start, scan.spans[0].end), (2, 9));
    }

    #[test]
    fn test_empty_line_keeps_state() {
        let rules = test_rules();
        let opened = rules.scan_line("/* open", LineState::default());
        let empty = rules.scan_line("", opened.exit);
        assert!(empty.exit.is_inside_range());
        assert!(empty.spans.is_empty());
    }
}
