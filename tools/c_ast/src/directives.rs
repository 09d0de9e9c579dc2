//! Recovers the `#include` directives physically written in a source file.
//!
//! clang's AST dump does not record inclusions, so the primary file's text is scanned directly.
//! Only that file is scanned, which keeps includes nested inside other headers out of the result.

use hgen_core::{IncludeStyle, InclusionEvent};
use tracing::debug;

/// Returns the `<...>` and `"..."` include directives of `text`, in source order.
///
/// Backslash-newline continuations are joined and comments are removed before a line is
/// examined, so `# include` split over lines or hidden in `/* ... */` behaves as the
/// preprocessor would see it. Conditional compilation is not evaluated.
pub fn scan_includes(source_file: &str, text: &str) -> Vec<InclusionEvent> {
    let mut events = Vec::new();
    let mut in_block_comment = false;
    for (line, logical) in logical_lines(text) {
        let code = strip_comments(&logical, &mut in_block_comment);
        let Some(operand) = include_operand(&code) else {
            continue;
        };
        match parse_operand(operand) {
            Some((spelling, style)) => events.push(InclusionEvent {
                spelling: spelling.to_owned(),
                style,
                source_file: source_file.to_owned(),
                line,
            }),
            None => debug!("{source_file}:{line}: skipping computed include {operand:?}"),
        }
    }
    events
}

/// Splits `text` into logical lines, joining backslash continuations. Each line is paired with
/// the 1-based number of its first physical line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut start = None;
    for (i, physical) in text.lines().enumerate() {
        let physical = physical.strip_suffix('\r').unwrap_or(physical);
        start.get_or_insert(i + 1);
        match physical.strip_suffix('\\') {
            Some(head) => current.push_str(head),
            None => {
                current.push_str(physical);
                lines.push((start.take().unwrap_or(i + 1), std::mem::take(&mut current)));
            }
        }
    }
    if let Some(start) = start {
        lines.push((start, current));
    }
    lines
}

/// Removes comments from one logical line, replacing each with a space. `in_block` carries an
/// unterminated `/*` over to the next line.
fn strip_comments(line: &str, in_block: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut quote = None;
    while let Some(c) = chars.next() {
        if *in_block {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_block = false;
                out.push(' ');
            }
            continue;
        }
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match (c, chars.peek()) {
            ('/', Some('*')) => {
                chars.next();
                *in_block = true;
            }
            ('/', Some('/')) => break,
            ('"' | '\'', _) => {
                quote = Some(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// If `code` is an include directive, returns the text following the `include` keyword.
fn include_operand(code: &str) -> Option<&str> {
    let rest = code.trim_start().strip_prefix('#')?.trim_start();
    let rest = rest.strip_prefix("include")?;
    // Reject longer identifiers such as `include_next` or `included`.
    if rest.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some(rest.trim())
}

/// Splits `<name>` or `"name"` into the header name and bracket style.
fn parse_operand(operand: &str) -> Option<(&str, IncludeStyle)> {
    if let Some(rest) = operand.strip_prefix('<') {
        let end = rest.find('>')?;
        return Some((&rest[..end], IncludeStyle::Angled));
    }
    let rest = operand.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some((&rest[..end], IncludeStyle::Quoted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directives(text: &str) -> Vec<String> {
        scan_includes("f.c", text)
            .iter()
            .map(InclusionEvent::directive)
            .collect()
    }

    #[test]
    fn captures_both_bracket_styles() {
        let events = scan_includes("f1.c", "#include <stdio.h>\n#include \"inttypes.h\"\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].spelling, "stdio.h");
        assert_eq!(events[0].style, IncludeStyle::Angled);
        assert_eq!(events[0].line, 1);
        assert_eq!(events[1].spelling, "inttypes.h");
        assert_eq!(events[1].style, IncludeStyle::Quoted);
        assert_eq!(events[1].line, 2);
        assert!(events.iter().all(|e| e.source_file == "f1.c"));
    }

    #[test]
    fn whitespace_and_comments() {
        let text = "  #  include<stdint.h> // ints\n\
                    #include /* why not */ \"a.h\"\n\
                    // #include <commented.h>\n\
                    /* #include <block.h>\n\
                    #include <still_block.h> */\n\
                    #include <after.h>\n";
        assert_eq!(
            directives(text),
            ["<stdint.h>", "\"a.h\"", "<after.h>"]
        );
    }

    #[test]
    fn continuation_lines() {
        let events = scan_includes("f.c", "int x;\n#include \\\n  <stddef.h>\n#include <b.h>\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].spelling, "stddef.h");
        assert_eq!(events[0].line, 2);
        assert_eq!(events[1].line, 4);
    }

    #[test]
    fn ignores_non_include_directives() {
        let text = "#include_next <x.h>\n#define include 1\n#pragma once\n#include MACRO_HEADER\n\
                    const char *s = \"#include <not_a_directive.h>\";\n";
        assert!(directives(text).is_empty());
    }

    #[test]
    fn comment_markers_inside_strings() {
        let text = "const char *p = \"/*\";\n#include <real.h>\n";
        assert_eq!(directives(text), ["<real.h>"]);
    }

    #[test]
    fn crlf_line_endings() {
        assert_eq!(directives("#include <a.h>\r\n#include \"b.h\"\r\n"), ["<a.h>", "\"b.h\""]);
    }
}
