//! Event bridge between a host editor and the highlighting engine
//!
//! A [`SyntaxEngine`] owns one finalized rule set and the per-buffer line
//! states for one content type. The host delivers four notification
//! kinds through [`EditorEvents`]; everything else stays on the host's
//! side of the boundary (rendering, color lookup, buffer storage).
//!
//! Engines are plain values: a host that highlights several content
//! types keeps one engine per type, side by side.

use std::collections::HashMap;

use tracing::debug;

use crate::rules::RuleSet;
use crate::scan::Span;
use crate::tracker::{LineSource, LineStates};

/// A content modification reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferChange {
    /// Lines `first..=last` were edited in place
    Edited { first: usize, last: usize },
    /// `count` lines were inserted before `at`
    Inserted { at: usize, count: usize },
    /// Lines `first..=last` were removed
    Deleted { first: usize, last: usize },
}

/// The four notifications a host delivers to the engine
///
/// One capability interface, no inheritance: the host calls these in
/// response to its own events and hands the returned spans to its
/// renderer.
pub trait EditorEvents {
    /// The display style scheme changed.
    ///
    /// Spans carry attribute ids, not colors, so nothing is recomputed;
    /// re-resolving attribute classes is the theme's job.
    fn style_changed(&mut self);

    /// A buffer is about to be deleted; release its state.
    fn buffer_deleted(&mut self, buffer: usize);

    /// A buffer's content changed.
    fn buffer_modified(&mut self, buffer: usize, change: BufferChange);

    /// A line is about to be drawn.
    ///
    /// Returns attributed spans for the line, or None when the buffer's
    /// content type is not this engine's.
    fn line_draw(
        &mut self,
        buffer: usize,
        line: usize,
        content_type: &str,
        source: &(impl LineSource + ?Sized),
    ) -> Option<Vec<Span>>;
}

/// Incremental syntax highlighting for one content type
pub struct SyntaxEngine {
    content_type: String,
    rules: RuleSet,
    /// Per-buffer line states (buffer id -> tracker)
    buffers: HashMap<usize, LineStates>,
}

impl SyntaxEngine {
    /// Create an engine from a finalized rule set
    pub fn new(content_type: &str, rules: RuleSet) -> Self {
        Self {
            content_type: content_type.to_string(),
            rules,
            buffers: HashMap::new(),
        }
    }

    /// The content type this engine highlights
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The finalized rule set
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl EditorEvents for SyntaxEngine {
    fn style_changed(&mut self) {
        // Nothing cached depends on colors.
    }

    fn buffer_deleted(&mut self, buffer: usize) {
        if self.buffers.remove(&buffer).is_some() {
            debug!(buffer, "released line states");
        }
    }

    fn buffer_modified(&mut self, buffer: usize, change: BufferChange) {
        let states = self.buffers.entry(buffer).or_default();
        match change {
            BufferChange::Edited { first, last } => {
                for line in first..=last {
                    states.on_line_changed(line);
                }
            }
            BufferChange::Inserted { at, count } => {
                states.on_lines_inserted(at, count);
            }
            BufferChange::Deleted { first, last } => {
                for _ in first..=last {
                    states.on_line_deleted(first);
                }
            }
        }
    }

    fn line_draw(
        &mut self,
        buffer: usize,
        line: usize,
        content_type: &str,
        source: &(impl LineSource + ?Sized),
    ) -> Option<Vec<Span>> {
        if content_type != self.content_type {
            return None;
        }
        let text = source.line(line)?;
        let states = self.buffers.entry(buffer).or_default();
        let entry = states.entry_state(line, &self.rules, source);
        let scan = self.rules.scan_line(text, entry);
        states.store_entry(line + 1, scan.exit);
        Some(scan.spans)
    }
}
