//! tracelight - incremental line-oriented syntax highlighting
//!
//! A small engine that turns a declarative table of lexical rules
//! (keywords, regex patterns with capture-group substitution, multi-line
//! ranges) into per-line styled spans, tracking multi-line region state
//! across edits so only the affected lines are rescanned.
//!
//! The engine never touches colors or cells: it produces `(byte range,
//! attribute class)` pairs, and a [`Theme`] maps attribute class names to
//! terminal styles for whoever does the drawing.
//!
//! ```
//! use tracelight::{LineState, RangeSpec, RuleSet};
//!
//! let mut builder = RuleSet::builder();
//! let comment = builder.attr("comment");
//! builder.range(comment, RangeSpec::new(r"/\*", r"\*/"));
//! let rules = builder.finalize();
//!
//! let scan = rules.scan_line("x /* y", LineState::default());
//! assert!(scan.exit.is_inside_range());
//! ```

mod engine;
mod error;
pub mod lang;
mod rules;
mod scan;
mod style;
mod theme;
mod tracker;

pub use engine::{BufferChange, EditorEvents, SyntaxEngine};
pub use error::{Error, Result};
pub use rules::{AttrId, PatternError, RangeSpec, RuleSet, RuleSetBuilder};
pub use scan::{LineScan, LineState, Span};
pub use style::{Color, Style};
pub use theme::Theme;
pub use tracker::{LineSource, LineStates};
