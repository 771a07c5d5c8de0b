// SPDX-License-Identifier: PMPL-1.0-or-later

//! Call-site scanning for gettext-style functions
//!
//! Sources are first masked so that comments (and, where safe, string
//! contents) cannot produce false call matches. Arguments are then read from
//! the comment-masked text with string literals intact.

use crate::types::SourceLanguage;
use regex::Regex;
use std::sync::OnceLock;

/// A function call found in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub name: String,
    /// 1-based line of the function name
    pub line: usize,
    /// One entry per argument; `None` when the argument is not a literal
    pub args: Vec<Option<String>>,
}

#[derive(Debug, Clone, Copy)]
struct Syntax {
    hash_comments: bool,
    slash_comments: bool,
    html_comments: bool,
    /// Blank string contents when searching for call names
    mask_strings: bool,
    backticks: bool,
    /// Slash comments only count outside `<template>` blocks
    template_sections: bool,
    concat: char,
    /// PHP single quotes only know `\'` and `\\`
    raw_single_quotes: bool,
}

impl Syntax {
    fn for_language(language: SourceLanguage) -> Self {
        match language {
            SourceLanguage::Php => Syntax {
                hash_comments: true,
                slash_comments: true,
                html_comments: false,
                mask_strings: true,
                backticks: false,
                template_sections: false,
                concat: '.',
                raw_single_quotes: true,
            },
            SourceLanguage::Vue => Syntax {
                hash_comments: false,
                slash_comments: true,
                html_comments: true,
                mask_strings: false,
                backticks: true,
                template_sections: true,
                concat: '+',
                raw_single_quotes: false,
            },
            SourceLanguage::JavaScript | SourceLanguage::Unknown => Syntax {
                hash_comments: false,
                slash_comments: true,
                html_comments: false,
                mask_strings: true,
                backticks: true,
                template_sections: false,
                concat: '+',
                raw_single_quotes: false,
            },
        }
    }

    fn is_quote(&self, c: u8) -> bool {
        c == b'"' || c == b'\'' || (self.backticks && c == b'`')
    }
}

fn call_regex() -> &'static Regex {
    static CALL: OnceLock<Regex> = OnceLock::new();
    CALL.get_or_init(|| {
        Regex::new(r"([A-Za-z_$][A-Za-z0-9_$]*)\s*\(").expect("call pattern compiles")
    })
}

/// Replace every byte in `range` except newlines with spaces.
fn blank(bytes: &mut [u8], from: usize, to: usize) {
    let end = to.min(bytes.len());
    for b in &mut bytes[from..end] {
        if *b != b'\n' {
            *b = b' ';
        }
    }
}

fn string_end(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn line_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|b| *b == b'\n')
        .map(|p| start + p)
        .unwrap_or(bytes.len())
}

/// `<name` or `</name` followed by `>` or whitespace
fn starts_tag(rest: &[u8], tag: &[u8]) -> bool {
    rest.len() > tag.len()
        && rest.starts_with(tag)
        && (rest[tag.len()] == b'>' || rest[tag.len()].is_ascii_whitespace())
}

fn find_from(bytes: &[u8], start: usize, needle: &[u8]) -> usize {
    bytes[start..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| start + p + needle.len())
        .unwrap_or(bytes.len())
}

/// Two masked copies of `content`, byte-for-byte the same length:
/// (names view, arguments view).
fn mask(content: &str, syntax: Syntax) -> (Vec<u8>, Vec<u8>) {
    let bytes = content.as_bytes();
    let mut names = bytes.to_vec();
    let mut args = bytes.to_vec();

    let mut template_depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        let rest = &bytes[i..];
        if syntax.template_sections {
            if starts_tag(rest, b"<template") {
                template_depth += 1;
            } else if starts_tag(rest, b"</template") {
                template_depth = template_depth.saturating_sub(1);
            }
        }
        let slash_comments = syntax.slash_comments && template_depth == 0;

        let comment_end = if slash_comments && rest.starts_with(b"//") {
            Some(line_end(bytes, i))
        } else if slash_comments && rest.starts_with(b"/*") {
            Some(find_from(bytes, i + 2, b"*/"))
        } else if syntax.hash_comments && rest[0] == b'#' && !rest.starts_with(b"#[") {
            Some(line_end(bytes, i))
        } else if syntax.html_comments && rest.starts_with(b"<!--") {
            Some(find_from(bytes, i + 4, b"-->"))
        } else {
            None
        };

        if let Some(end) = comment_end {
            blank(&mut names, i, end);
            blank(&mut args, i, end);
            i = end;
            continue;
        }

        if syntax.is_quote(rest[0]) {
            let end = string_end(bytes, i);
            if syntax.mask_strings {
                let terminated = end - i >= 2 && bytes.get(end - 1) == Some(&rest[0]);
                blank(&mut names, i + 1, if terminated { end - 1 } else { end });
            }
            i = end;
            continue;
        }
        i += 1;
    }
    (names, args)
}

fn unescape(raw: &str, quote: char, raw_single_quotes: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        if quote == '\'' && raw_single_quotes {
            if next == '\'' || next == '\\' {
                out.push(next);
            } else {
                out.push('\\');
                out.push(next);
            }
            continue;
        }
        match next {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' | '\'' | '"' | '`' | '$' => out.push(next),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

struct ArgParser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    syntax: Syntax,
}

impl<'a> ArgParser<'a> {
    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// One string literal, or `None` (position unchanged) when there is none.
    fn literal(&mut self) -> Option<String> {
        let quote = self.peek().filter(|c| self.syntax.is_quote(*c))?;
        let end = string_end(self.bytes, self.pos);
        if end > self.bytes.len() || self.bytes.get(end - 1) != Some(&quote) || end - self.pos < 2 {
            return None;
        }
        let raw = self.text.get(self.pos + 1..end - 1)?;
        if quote == b'`' && raw.contains("${") {
            return None;
        }
        if quote == b'"' && !self.syntax.backticks && raw.contains('$') {
            // PHP interpolation
            return None;
        }
        self.pos = end;
        Some(unescape(raw, quote as char, self.syntax.raw_single_quotes))
    }

    /// Skip any expression up to the next top-level `,` or `)`.
    fn skip_expression(&mut self) -> bool {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' if depth > 0 => depth -= 1,
                b')' | b',' if depth == 0 => return true,
                b']' | b'}' => return false,
                c if self.syntax.is_quote(c) => {
                    self.pos = string_end(self.bytes, self.pos);
                    continue;
                }
                _ => {}
            }
            self.pos += 1;
        }
        false
    }

    fn argument(&mut self) -> Option<Option<String>> {
        self.skip_ws();
        let start = self.pos;
        let mut joined: Option<String> = None;

        while let Some(piece) = self.literal() {
            joined.get_or_insert_with(String::new).push_str(&piece);
            self.skip_ws();
            if self.peek() == Some(self.syntax.concat as u8) {
                self.pos += 1;
                self.skip_ws();
                continue;
            }
            break;
        }

        self.skip_ws();
        if joined.is_some() && matches!(self.peek(), Some(b',') | Some(b')')) {
            return Some(joined);
        }
        self.pos = start;
        if self.skip_expression() {
            Some(None)
        } else {
            None
        }
    }

    /// Arguments up to the closing parenthesis; `None` if unterminated.
    fn arguments(&mut self) -> Option<Vec<Option<String>>> {
        let mut args = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b')') {
            return Some(args);
        }
        loop {
            args.push(self.argument()?);
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_ws();
                    // trailing comma
                    if self.peek() == Some(b')') {
                        return Some(args);
                    }
                }
                Some(b')') => return Some(args),
                _ => return None,
            }
        }
    }
}

fn line_starts(content: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(content.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

fn line_of(starts: &[usize], offset: usize) -> usize {
    match starts.binary_search(&offset) {
        Ok(index) => index + 1,
        Err(index) => index,
    }
}

fn is_definition(names: &str, name_start: usize) -> bool {
    let before = names[..name_start].trim_end();
    before.ends_with("function") || before.ends_with("->") || before.ends_with("::")
}

/// Every call to one of `functions` in `content`.
pub fn find_calls<F>(content: &str, language: SourceLanguage, is_function: F) -> Vec<CallSite>
where
    F: Fn(&str) -> bool,
{
    let syntax = Syntax::for_language(language);
    let (names, args) = mask(content, syntax);
    // Masks replace whole characters, so both views stay UTF-8
    let (Ok(names), Ok(args)) = (String::from_utf8(names), String::from_utf8(args)) else {
        return Vec::new();
    };

    let starts = line_starts(content);
    let mut calls = Vec::new();
    for captures in call_regex().captures_iter(&names) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if !is_function(name.as_str()) {
            continue;
        }
        let preceded_by_ident = names[..name.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$');
        if preceded_by_ident || is_definition(&names, name.start()) {
            continue;
        }

        let mut parser = ArgParser {
            text: &args,
            bytes: args.as_bytes(),
            pos: whole.end(),
            syntax,
        };
        if let Some(arguments) = parser.arguments() {
            calls.push(CallSite {
                name: name.as_str().to_string(),
                line: line_of(&starts, name.start()),
                args: arguments,
            });
        }
    }
    calls
}

/// Comment text on the line directly above `line` (1-based), if any.
pub fn comment_above(content: &str, line: usize, language: SourceLanguage) -> Option<String> {
    let previous = content.lines().nth(line.checked_sub(2)?)?.trim();
    let syntax = Syntax::for_language(language);

    let text = if let Some(rest) = previous.strip_prefix("//") {
        rest
    } else if let Some(rest) = previous
        .strip_prefix("/*")
        .and_then(|r| r.strip_suffix("*/"))
    {
        rest.trim_start_matches('*')
    } else if let Some(rest) = previous
        .strip_prefix("<!--")
        .and_then(|r| r.strip_suffix("-->"))
    {
        rest
    } else if syntax.hash_comments && previous.starts_with('#') && !previous.starts_with("#[") {
        &previous[1..]
    } else {
        return None;
    };

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calls(content: &str, language: SourceLanguage) -> Vec<CallSite> {
        find_calls(content, language, |name| {
            matches!(name, "__" | "_" | "gettext" | "ngettext" | "dgettext" | "pgettext")
        })
    }

    #[test]
    fn php_literals_and_concatenation() {
        let found = calls(
            "<?php\necho __('Hello ' . 'world');\necho ngettext(\"apple\", \"apples\", $n);\n",
            SourceLanguage::Php,
        );
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].args, vec![Some("Hello world".to_string())]);
        assert_eq!(found[0].line, 2);
        assert_eq!(
            found[1].args,
            vec![Some("apple".to_string()), Some("apples".to_string()), None]
        );
    }

    #[test]
    fn non_literal_arguments_are_none() {
        let found = calls("__($message); __(fn('x'), 'y')", SourceLanguage::Php);
        assert_eq!(found[0].args, vec![None]);
        assert_eq!(found[1].args, vec![None, Some("y".to_string())]);
    }

    #[test]
    fn commented_calls_are_ignored() {
        let found = calls(
            "// __('nope')\n/* gettext('nope') */\nconst a = __('yes');\nconst s = \"__('in string')\";",
            SourceLanguage::JavaScript,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].args, vec![Some("yes".to_string())]);
    }

    #[test]
    fn template_literals_without_interpolation() {
        let found = calls("__(`plain`); __(`hi ${name}`)", SourceLanguage::JavaScript);
        assert_eq!(found[0].args, vec![Some("plain".to_string())]);
        assert_eq!(found[1].args, vec![None]);
    }

    #[test]
    fn vue_template_attribute_calls() {
        let found = calls(
            "<template>\n  <a :title=\"__('Open')\">{{ __('Click') }}</a>\n</template>",
            SourceLanguage::Vue,
        );
        let originals: Vec<_> = found.iter().map(|c| c.args[0].clone()).collect();
        assert_eq!(originals, vec![Some("Open".to_string()), Some("Click".to_string())]);
    }

    #[test]
    fn vue_script_comments_are_ignored() {
        let source = "<template>\n  <a href=\"http://example.com\">{{ __('Link') }}</a>\n</template>\n<script>\n// __('commented')\n/* __('blocked') */\nconst a = __('live');\n</script>\n";
        let found = calls(source, SourceLanguage::Vue);
        let originals: Vec<_> = found.iter().filter_map(|c| c.args[0].clone()).collect();
        assert_eq!(originals, vec!["Link".to_string(), "live".to_string()]);
    }

    #[test]
    fn definitions_and_methods_are_skipped() {
        let found = calls(
            "function __($s) {}\n$this->__('x');\nmy__('y');\n",
            SourceLanguage::Php,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn php_single_quotes_keep_backslash_n() {
        let found = calls(r#"__('a\nb'); __("a\nb");"#, SourceLanguage::Php);
        assert_eq!(found[0].args[0].as_deref(), Some("a\\nb"));
        assert_eq!(found[1].args[0].as_deref(), Some("a\nb"));
    }

    #[test]
    fn comment_directly_above() {
        let source = "<?php\n// Greeting on the landing page\necho __('Hi');\n\necho __('Bye');\n";
        assert_eq!(
            comment_above(source, 3, SourceLanguage::Php).as_deref(),
            Some("Greeting on the landing page")
        );
        assert_eq!(comment_above(source, 5, SourceLanguage::Php), None);
        assert_eq!(comment_above(source, 1, SourceLanguage::Php), None);
    }
}
