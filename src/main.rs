//! tracelight - highlight tracing scripts on the terminal
//!
//! A small host for the highlighting engine: reads a script, drives the
//! engine through the editor-event interface one line at a time, and
//! prints ANSI-styled output.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use crossterm::{
    queue,
    style::{
        Attribute, Color as TermColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
};
use tracing_subscriber::EnvFilter;

use tracelight::lang;
use tracelight::{
    EditorEvents, Error, Result, RuleSet, Span, Style, SyntaxEngine, Theme,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut theme_path: Option<PathBuf> = None;
    let mut file: Option<PathBuf> = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "--version" | "-V" => {
                print_version();
                return Ok(());
            }
            "--theme" | "-t" => {
                let path = iter
                    .next()
                    .ok_or_else(|| Error::Message("--theme requires a file argument".into()))?;
                theme_path = Some(PathBuf::from(path));
            }
            other if other.starts_with('-') => {
                return Err(Error::Message(format!("unknown option: {}", other)));
            }
            other => file = Some(PathBuf::from(other)),
        }
    }

    let Some(path) = file else {
        print_usage();
        return Err(Error::Message("no input file given".into()));
    };

    let theme = match theme_path {
        Some(path) => Theme::load(&path)?,
        None => Theme::default(),
    };

    // The only built-in definition is bpftrace; unknown extensions are
    // treated as bpftrace rather than rejected.
    let content_type = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(lang::content_type_for_extension)
        .unwrap_or(lang::BPFTRACE);

    let contents = fs::read_to_string(&path)?;
    let lines: Vec<&str> = contents.lines().collect();

    let mut engine = SyntaxEngine::new(lang::BPFTRACE, lang::bpftrace());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (idx, text) in lines.iter().enumerate() {
        let spans = engine
            .line_draw(0, idx, content_type, &lines[..])
            .unwrap_or_default();
        render_line(&mut out, text, &spans, engine.rules(), &theme)?;
    }
    out.flush()?;

    Ok(())
}

/// Render one line: plain gaps, styled spans, newline
fn render_line<W: Write>(
    out: &mut W,
    text: &str,
    spans: &[Span],
    rules: &RuleSet,
    theme: &Theme,
) -> Result<()> {
    let mut pos = 0;
    for span in spans {
        if span.start > pos {
            queue!(out, Print(&text[pos..span.start]))?;
        }
        let style = theme.style(rules.attr_name(span.attr));
        apply_style(out, &style)?;
        queue!(out, Print(&text[span.start..span.end]))?;
        queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
        pos = span.end;
    }
    if pos < text.len() {
        queue!(out, Print(&text[pos..]))?;
    }
    queue!(out, Print("\n"))?;
    Ok(())
}

fn apply_style<W: Write>(out: &mut W, style: &Style) -> Result<()> {
    if style.fg != tracelight::Color::Default {
        queue!(out, SetForegroundColor(term_color(style.fg)))?;
    }
    if style.bg != tracelight::Color::Default {
        queue!(out, SetBackgroundColor(term_color(style.bg)))?;
    }
    if style.bold {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if style.italic {
        queue!(out, SetAttribute(Attribute::Italic))?;
    }
    if style.underline {
        queue!(out, SetAttribute(Attribute::Underlined))?;
    }
    if style.reverse {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }
    Ok(())
}

/// Map theme colors onto the crossterm palette
fn term_color(color: tracelight::Color) -> TermColor {
    use tracelight::Color::*;
    match color {
        Default => TermColor::Reset,
        Black => TermColor::Black,
        Red => TermColor::DarkRed,
        Green => TermColor::DarkGreen,
        Yellow => TermColor::DarkYellow,
        Blue => TermColor::DarkBlue,
        Magenta => TermColor::DarkMagenta,
        Cyan => TermColor::DarkCyan,
        White => TermColor::Grey,
        BrightBlack => TermColor::DarkGrey,
        BrightRed => TermColor::Red,
        BrightGreen => TermColor::Green,
        BrightYellow => TermColor::Yellow,
        BrightBlue => TermColor::Blue,
        BrightMagenta => TermColor::Magenta,
        BrightCyan => TermColor::Cyan,
        BrightWhite => TermColor::White,
    }
}

fn print_usage() {
    println!(
        "tracelight {} - syntax highlighting for tracing scripts",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("Usage: tracelight [OPTIONS] FILE");
    println!();
    println!("Options:");
    println!("  -t, --theme FILE  Load style overrides from a TOML theme file");
    println!("  -h, --help        Show this help message");
    println!("  -V, --version     Show version information");
}

fn print_version() {
    println!("tracelight {}", env!("CARGO_PKG_VERSION"));
}
