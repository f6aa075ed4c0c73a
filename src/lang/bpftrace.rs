//! bpftrace language definition
//!
//! The tracing-script language of bpftrace(8): probe declarations,
//! C-like blocks, `@map` and `$scratch` variables, and a fixed set of
//! builtin functions. Attribute classes are registered in the order that
//! decides overlap priority: comments first, then strings, then the rest.

use crate::rules::{RangeSpec, RuleSet};

/// Content type tag for bpftrace buffers
pub const BPFTRACE: &str = "bpftrace";

/// Probe kinds that open a probe declaration
const PROBE_KINDS: &[&str] = &[
    "BEGIN",
    "END",
    "kprobe",
    "kretprobe",
    "uprobe",
    "uretprobe",
    "tracepoint",
    "usdt",
    "profile",
    "interval",
    "software",
    "hardware",
    "watchpoint",
    "asyncwatchpoint",
    "kfunc",
    "kretfunc",
    "iter",
];

/// Control-flow keywords shared with C
const CONTROL_FLOW: &[&str] = &[
    "break", "case", "continue", "default", "do", "else", "for", "goto", "if", "return", "switch",
    "while", "delete",
];

/// Builtin variables available inside probe bodies
const BUILTIN_VARS: &[&str] = &[
    "nsecs", "kstack", "ustack", "pid", "tid", "uid", "gid", "elapsed", "numaid", "cpu", "comm",
    "retval", "func", "probe", "curtask", "rand", "cgroup", "cpid",
];

/// Builtin functions, highlighted only when followed by a call paren
const BUILTIN_CALLS: &[&str] = &[
    "printf",
    "time",
    "join",
    "str",
    "ksym",
    "usym",
    "kaddr",
    "uaddr",
    "reg",
    "system",
    "exit",
    "cgroupid",
    "ntop",
    "kstack",
    "ustack",
    "cat",
    "signal",
    "strncmp",
    "override",
    "buf",
    "sizeof",
    "print",
    "strftime",
    "path",
    "uptr",
    "kptr",
    "macaddr",
    "cgroup_path",
];

/// Build the bpftrace rule table
pub fn bpftrace() -> RuleSet {
    let mut b = RuleSet::builder();

    let comment = b.attr("code-comment");
    b.range(comment, RangeSpec::new(r"/\*", r"\*/"));
    b.range(comment, RangeSpec::new("//", "$").one_line());
    // Disabled conditional blocks; both patterns are honored only at the
    // start of a line.
    b.range(
        comment,
        RangeSpec::new(r"^\s*#\s*if\s+0\b", r"^\s*#\s*(else|endif|elif|elifdef)\b"),
    );

    let string = b.attr("code-string");
    b.range(string, RangeSpec::new("\"", "\"").with_skip(r#"\\""#));
    b.range(string, RangeSpec::new("'", "'").with_skip(r"\\'"));

    let preproc = b.attr("code-preprocessor");
    b.regex_group(preproc, r"(#define\s+\w+)", 1);
    for kind in PROBE_KINDS {
        b.keyword(preproc, kind);
    }

    let number = b.attr("code-number");
    b.regex_group(number, r"(^|\W)(-?(\d+\.\d*)|(\d*\.\d+))\b", 2);
    b.regex_group(number, r"(^|\W)(-?\d+)\b", 2);
    b.regex_group(number, r"(^|\W)(0[xX][0-9a-fA-F]+)\b", 2);

    let typename = b.attr("code-typename");
    b.regex_group(typename, r"(@\w+)", 1);

    let flow = b.attr("code-control-flow");
    for word in CONTROL_FLOW {
        b.keyword(flow, word);
    }
    b.regex_group(flow, r"^\s*([A-Za-z_]\w*):", 1);

    let keyword = b.attr("code-keyword");
    b.regex_group(keyword, r"(count)\(", 1);
    b.regex_group(keyword, r"(hist)\(", 1);
    b.regex_group(keyword, r"(lhist)\(", 1);
    for var in BUILTIN_VARS {
        b.keyword(keyword, var);
    }
    b.regex_group(keyword, r"\b(arg[0-9]+)\b", 1);
    b.regex_group(keyword, r"\b(sarg[0-9]+)\b", 1);
    b.regex_group(keyword, r"(\$\w+)", 1);
    b.keyword(keyword, "struct");
    b.keyword(keyword, "typedef");

    let call = b.attr("code-fn-call");
    for name in BUILTIN_CALLS {
        b.regex_group(call, &format!(r"({})\(", name), 1);
    }

    b.finalize()
}
