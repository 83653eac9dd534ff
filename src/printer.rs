// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::{Display, Write};

use crate::{
    argument::Argument,
    ast::{Fragment, FragmentKind, Modifiers, NativePattern, UntilDirection},
    compiler::MAX_NESTING_DEPTH,
    escape::Literal,
};

impl Display for NativePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Text(s) => write!(f, "\"{}\"", s),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::Boolean(b) => write!(f, "{}", b),
        }
    }
}

// the suffix notation, negation is printed by the owner as a `!` prefix
impl Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.one_or_more {
            f.write_char('+')?;
        }

        if self.zero_or_more && self.optional {
            f.write_str("*?")?;
        } else if self.zero_or_more {
            f.write_char('*')?;
        }

        if let Some(quantifier) = &self.quantifier {
            f.write_str(quantifier)?;
        }

        if self.optional && !self.zero_or_more {
            f.write_char('?')?;
        }
        Ok(())
    }
}

impl Display for UntilDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UntilDirection::Ahead => f.write_str("until"),
            UntilDirection::Behind => f.write_str("behind_until"),
        }
    }
}

impl Display for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Argument::Native(p) => write!(f, "{}", p),
            Argument::Fragment(fragment) => write!(f, "{}", fragment),
            Argument::Name(name) => f.write_str(name),
            Argument::LiteralFn(_) => f.write_str("fn() -> String"),
            Argument::Combinator(_) => f.write_str("fn(&RegexBuilder) -> Fragment"),
            Argument::Literal(literal) => write!(f, "{}", literal),
            Argument::Until(None) => f.write_str("until"),
            Argument::Until(Some(p)) => write!(f, "until({})", p),
            Argument::BehindUntil(None) => f.write_str("behind_until"),
            Argument::BehindUntil(Some(p)) => write!(f, "behind_until({})", p),
        }
    }
}

impl std::fmt::Debug for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Argument({})", self)
    }
}

// one line, e.g. `(/a/, /b/i+) || /c/`
fn write_inline(fragment: &Fragment, f: &mut dyn Write, depth: usize) -> std::fmt::Result {
    if depth > MAX_NESTING_DEPTH {
        return f.write_str("...");
    }

    let node = fragment.borrow();

    if node.modifiers.negated {
        f.write_char('!')?;
    }

    let grouped = !node.alternatives.is_empty();
    if grouped {
        f.write_char('(')?;
    }

    match &node.kind {
        FragmentKind::Native(pattern) => write!(f, "{}", pattern)?,
        FragmentKind::Composite(children) => {
            f.write_char('(')?;
            for (idx, child) in children.iter().enumerate() {
                if idx != 0 {
                    f.write_str(", ")?;
                }
                write_inline(child, f, depth + 1)?;
            }
            f.write_char(')')?;
        }
        FragmentKind::Until { ahead, direction, .. } => {
            write!(f, "{}(", direction)?;
            write_inline(ahead, f, depth + 1)?;
            f.write_char(')')?;
        }
        FragmentKind::EndOfExpression => f.write_str("end_of_expression")?,
    }

    for alternative in &node.alternatives {
        f.write_str(" || ")?;
        write_inline(alternative, f, depth + 1)?;
    }

    if grouped {
        f.write_char(')')?;
    }

    write!(f, "{}", node.modifiers)
}

// one node per line, children indented
fn write_outline(
    fragment: &Fragment,
    f: &mut String,
    depth: usize,
) -> std::fmt::Result {
    let indent = "  ".repeat(depth);
    if depth > MAX_NESTING_DEPTH {
        return writeln!(f, "{}...", indent);
    }

    let node = fragment.borrow();
    let negated = if node.modifiers.negated { "!" } else { "" };
    let skipped = if node.skip { " (skip)" } else { "" };

    match &node.kind {
        FragmentKind::Native(pattern) => {
            writeln!(f, "{}{}{}{}{}", indent, negated, pattern, node.modifiers, skipped)?
        }
        FragmentKind::Composite(children) => {
            writeln!(f, "{}{}composite{}{}", indent, negated, node.modifiers, skipped)?;
            for child in children {
                write_outline(child, f, depth + 1)?;
            }
        }
        FragmentKind::Until { ahead, direction, .. } => {
            writeln!(f, "{}{}{}{}", indent, negated, direction, node.modifiers)?;
            write_outline(ahead, f, depth + 1)?;
        }
        FragmentKind::EndOfExpression => writeln!(f, "{}end_of_expression", indent)?,
    }

    for alternative in &node.alternatives {
        writeln!(f, "{}or", indent)?;
        write_outline(alternative, f, depth + 1)?;
    }
    Ok(())
}

impl Display for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = String::new();
        write_inline(self, &mut s, 0)?;
        f.write_str(&s)
    }
}

impl Fragment {
    /// A multi-line outline of the tree, for debugging.
    pub fn debug_text(&self) -> String {
        let mut s = String::new();
        // writing into a `String` does not fail
        let _ = write_outline(self, &mut s, 0);
        s
    }
}
