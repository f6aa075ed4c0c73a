//! Theme resolution for attribute classes
//!
//! The engine tags spans with opaque attribute class names; a theme maps
//! those names to display styles. Ships with defaults for the built-in
//! classes and accepts overrides from a TOML file:
//!
//! ```toml
//! [code-comment]
//! fg = "bright-black"
//! italic = true
//!
//! [code-string]
//! fg = "green"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::style::{Color, Style};

/// Maps attribute class names to display styles
#[derive(Debug, Clone)]
pub struct Theme {
    styles: HashMap<String, Style>,
}

impl Default for Theme {
    fn default() -> Self {
        let mut theme = Self::empty();
        theme.set("code-comment", Style::fg(Color::BrightBlack).with_italic());
        theme.set("code-string", Style::fg(Color::Green));
        theme.set("code-preprocessor", Style::fg(Color::BrightMagenta));
        theme.set("code-number", Style::fg(Color::Cyan));
        theme.set("code-typename", Style::fg(Color::Yellow));
        theme.set("code-control-flow", Style::fg(Color::Magenta).with_bold());
        theme.set("code-keyword", Style::fg(Color::BrightCyan));
        theme.set("code-fn-call", Style::fg(Color::Blue));
        theme
    }
}

impl Theme {
    /// Create a theme with no styles at all
    pub fn empty() -> Self {
        Self {
            styles: HashMap::new(),
        }
    }

    /// Set the style for an attribute class
    pub fn set(&mut self, attr: &str, style: Style) {
        self.styles.insert(attr.to_string(), style);
    }

    /// Style for an attribute class; default (plain) when unknown
    pub fn style(&self, attr: &str) -> Style {
        self.styles.get(attr).copied().unwrap_or_default()
    }

    /// Load overrides from a TOML file on top of the defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse TOML overrides on top of the defaults
    pub fn parse(contents: &str) -> Result<Self> {
        let table: toml::Table = contents.parse()?;
        let mut theme = Self::default();

        for (attr, value) in &table {
            let Some(entry) = value.as_table() else {
                continue;
            };
            let mut style = theme.style(attr);
            if let Some(name) = entry.get("fg").and_then(|v| v.as_str()) {
                style.fg =
                    Color::from_name(name).ok_or_else(|| Error::UnknownColor(name.to_string()))?;
            }
            if let Some(name) = entry.get("bg").and_then(|v| v.as_str()) {
                style.bg =
                    Color::from_name(name).ok_or_else(|| Error::UnknownColor(name.to_string()))?;
            }
            if let Some(flag) = entry.get("bold").and_then(|v| v.as_bool()) {
                style.bold = flag;
            }
            if let Some(flag) = entry.get("italic").and_then(|v| v.as_bool()) {
                style.italic = flag;
            }
            if let Some(flag) = entry.get("underline").and_then(|v| v.as_bool()) {
                style.underline = flag;
            }
            if let Some(flag) = entry.get("reverse").and_then(|v| v.as_bool()) {
                style.reverse = flag;
            }
            theme.set(attr, style);
        }

        Ok(theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme_covers_builtin_classes() {
        let theme = Theme::default();
        assert!(!theme.style("code-comment").is_default());
        assert!(!theme.style("code-string").is_default());
        assert!(!theme.style("code-fn-call").is_default());
        // Unknown classes fall back to plain text.
        assert!(theme.style("nonexistent").is_default());
    }

    #[test]
    fn test_parse_overrides() {
        let theme = Theme::parse(
            r#"
[code-comment]
fg = "blue"
italic = false

[custom-thing]
fg = "bright-red"
bold = true
"#,
        )
        .unwrap();

        let comment = theme.style("code-comment");
        assert_eq!(comment.fg, Color::Blue);
        assert!(!comment.italic);

        let custom = theme.style("custom-thing");
        assert_eq!(custom.fg, Color::BrightRed);
        assert!(custom.bold);

        // Untouched defaults survive.
        assert_eq!(theme.style("code-string").fg, Color::Green);
    }

    #[test]
    fn test_parse_unknown_color() {
        let result = Theme::parse("[code-comment]\nfg = \"mauve\"\n");
        assert!(matches!(result, Err(Error::UnknownColor(name)) if name == "mauve"));
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = Theme::parse("not [ valid toml");
        assert!(matches!(result, Err(Error::ThemeParse(_))));
    }
}
