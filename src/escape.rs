// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Display;

use crate::ast::{Fragment, NativePattern};

// characters that need a backslash to be matched literally
pub(crate) const META_CHARS: [char; 16] = [
    '\\', '/', '^', '$', '.', '|', '?', '*', '+', '(', ')', '[', ']', '{', '}', '-',
];

// an already escaped backslash in the input
const ESCAPED_BACKSLASH: &str = "\\\\";

/// A literal value to be matched as plain text.
#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Literal {
    /// Any value with a text conversion.
    pub fn display<T: Display + ?Sized>(value: &T) -> Self {
        Literal::Text(value.to_string())
    }

    pub fn to_text(&self) -> String {
        match self {
            Literal::Text(s) => s.clone(),
            Literal::Integer(i) => i.to_string(),
            Literal::Float(f) => f.to_string(),
            Literal::Boolean(b) => if *b { "true" } else { "false" }.to_owned(),
        }
    }

    /// A leaf whose pattern matches the literal text exactly.
    pub fn to_fragment(&self) -> Fragment {
        Fragment::native(NativePattern::new(&escape_literal(&self.to_text())))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_owned())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<char> for Literal {
    fn from(value: char) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Integer(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Integer(value as i64)
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Self {
        Literal::Integer(value as i64)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

/// Escape every regex meta character of `text`.
///
/// An escaped backslash `\\` already present in the text is kept as `\\`
/// instead of becoming `\\\\`: the input is split at those sequences first,
/// the pieces are escaped, then joined back with `\\`.
pub fn escape_literal(text: &str) -> String {
    let pieces: Vec<String> = text.split(ESCAPED_BACKSLASH).map(escape_piece).collect();
    pieces.join(ESCAPED_BACKSLASH)
}

fn escape_piece(piece: &str) -> String {
    let mut escaped = String::with_capacity(piece.len());
    for c in piece.chars() {
        if META_CHARS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_str_eq;

    use crate::{Flags, Regex};

    use super::{escape_literal, Literal};

    #[test]
    fn test_escape_meta_chars() {
        assert_str_eq!(escape_literal("abc"), "abc");
        assert_str_eq!(escape_literal("a.b"), r"a\.b");
        assert_str_eq!(
            escape_literal(r"/^$.|?*+()[]{}-"),
            r"\/\^\$\.\|\?\*\+\(\)\[\]\{\}\-"
        );
        assert_str_eq!(escape_literal(r"a\b"), r"a\\b");
        assert_str_eq!(escape_literal("日本 語"), "日本 語");
    }

    #[test]
    fn test_escape_keeps_escaped_backslash() {
        // `\\` in the input survives as `\\`
        assert_str_eq!(escape_literal(r"a\\b"), r"a\\b");
        assert_str_eq!(escape_literal(r"x\\.y"), r"x\\\.y");

        // three backslashes: one protected pair plus a lone one
        assert_str_eq!(escape_literal(r"a\\\b"), r"a\\\\b");

        // no sentinel to collide with
        assert_str_eq!(escape_literal(r"xx\\x"), r"xx\\x");
    }

    #[test]
    fn test_escape_round_trip() {
        let inputs = [
            "1+1=2",
            "(a|b)*",
            "price: $5.00",
            r"C:\temp\file.txt",
            "[x]{2}-^",
            "a/b/c?",
        ];

        for input in inputs {
            let re = Regex::new(&escape_literal(input), &Flags::new()).unwrap();
            let text = format!("<<{}>>", input);
            let m = re.find(&text).unwrap();
            assert_str_eq!(m.as_str(), input);
            assert_eq!(m.start(), 2);
        }

        // matches nothing else
        let re = Regex::new(&escape_literal("a.c"), &Flags::new()).unwrap();
        assert!(!re.is_match("abc"));
        assert!(re.is_match("a.c"));
    }

    #[test]
    fn test_literal_text() {
        assert_str_eq!(Literal::from(42).to_text(), "42");
        assert_str_eq!(Literal::from(-7i64).to_text(), "-7");
        assert_str_eq!(Literal::from(1.5).to_text(), "1.5");
        assert_str_eq!(Literal::from(2.0).to_text(), "2");
        assert_str_eq!(Literal::from(true).to_text(), "true");
        assert_str_eq!(Literal::from(false).to_text(), "false");
        assert_str_eq!(Literal::display(&std::net::Ipv4Addr::LOCALHOST).to_text(), "127.0.0.1");

        let fragment = Literal::display(&std::net::Ipv4Addr::LOCALHOST).to_fragment();
        assert_str_eq!(fragment.native_pattern().unwrap().source, r"127\.0\.0\.1");
    }
}
