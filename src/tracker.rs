//! Per-buffer line state tracking
//!
//! Stores the multi-line range context each line starts with, invalidates
//! the affected entries when the host reports edits, and lazily rescans
//! forward when a line is drawn whose entry state is unknown.

use crate::rules::RuleSet;
use crate::scan::LineState;

/// Read access to a buffer's lines, provided by the host.
///
/// Only consulted when entry states have to be recomputed after an edit;
/// the engine never stores line text.
pub trait LineSource {
    /// Number of lines in the buffer
    fn line_count(&self) -> usize;

    /// Text of one line, without its terminator
    fn line(&self, index: usize) -> Option<&str>;
}

impl<'a> LineSource for [&'a str] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.get(index).copied()
    }
}

impl LineSource for [String] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.get(index).map(|s| s.as_str())
    }
}

/// Stored entry states for one buffer's lines
///
/// `entries[n]` is the state entering line `n`, or None when it has to be
/// recomputed. Entry 0 is always the normal state.
#[derive(Debug, Default)]
pub struct LineStates {
    entries: Vec<Option<LineState>>,
}

impl LineStates {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure the entry vector covers `line_count` lines
    pub fn ensure_size(&mut self, line_count: usize) {
        if self.entries.len() < line_count {
            self.entries.resize(line_count, None);
        }
    }

    /// Stored entry state of a line, if still trusted
    pub fn entry(&self, line: usize) -> Option<LineState> {
        self.entries.get(line).copied().flatten()
    }

    /// Number of tracked lines
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is tracked yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The host edited `line` in place.
    ///
    /// Drops the stored entry for that line and for every following line
    /// until the next line whose entry was "no range open": a change
    /// earlier in an open range can move its close, but a closed boundary
    /// blocks propagation.
    pub fn on_line_changed(&mut self, line: usize) {
        if line >= self.entries.len() {
            return;
        }
        self.entries[line] = None;
        self.invalidate_following(line + 1);
    }

    /// The host removed `line`.
    pub fn on_line_deleted(&mut self, line: usize) {
        if line < self.entries.len() {
            self.entries.remove(line);
        }
        self.on_line_changed(line);
    }

    /// The host inserted `count` lines before `line`.
    pub fn on_lines_inserted(&mut self, line: usize, count: usize) {
        if line > self.entries.len() {
            self.ensure_size(line);
        }
        for _ in 0..count {
            self.entries.insert(line, None);
        }
        self.invalidate_following(line + count);
    }

    fn invalidate_following(&mut self, from: usize) {
        for i in from..self.entries.len() {
            match self.entries[i] {
                Some(state) if state.is_normal() => break,
                _ => self.entries[i] = None,
            }
        }
    }

    /// Entry state of `line`, recomputing lazily if needed.
    ///
    /// Walks back to the nearest line whose entry is still trusted, then
    /// rescans forward, storing every exit state on the way.
    pub fn entry_state(
        &mut self,
        line: usize,
        rules: &RuleSet,
        source: &(impl LineSource + ?Sized),
    ) -> LineState {
        self.ensure_size(source.line_count().max(line + 1));
        if line == 0 {
            self.entries[0] = Some(LineState::default());
            return LineState::default();
        }

        let mut from = line;
        while from > 0 && self.entries[from].is_none() {
            from -= 1;
        }
        let mut state = self.entries[from].unwrap_or_default();
        if self.entries[from].is_none() {
            // Buffer start is always a trusted boundary.
            self.entries[from] = Some(state);
        }
        while from < line {
            let text = source.line(from).unwrap_or("");
            state = rules.scan_line(text, state).exit;
            self.store_entry(from + 1, state);
            from += 1;
        }
        state
    }

    /// Record the exit state of `line - 1` as the entry state of `line`.
    ///
    /// If the recorded value contradicts a trusted one, every entry after
    /// it is dropped: the old boundary was computed from text that no
    /// longer produces it.
    pub fn store_entry(&mut self, line: usize, state: LineState) {
        self.ensure_size(line + 1);
        if let Some(old) = self.entries[line] {
            if old != state {
                for entry in self.entries[line + 1..].iter_mut() {
                    *entry = None;
                }
            }
        }
        self.entries[line] = Some(state);
    }
}
