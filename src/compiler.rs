// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{
    ast::{Fragment, FragmentKind, UntilDirection},
    flags::Flags,
    regex::Regex,
    FragmentError,
};

/// Compiling deeper than this fails instead of exhausting the stack,
/// e.g. when an alias is made to contain itself through `or`.
pub const MAX_NESTING_DEPTH: usize = 512;

// the prefixes that must not directly follow a `(` they were not written after
const GROUP_PREFIXES: [&str; 4] = ["?:", "?!", "?=", "?<"];

#[derive(Debug, PartialEq, Clone)]
enum Piece {
    Text(String),
    EndOfExpression,
}

/// Intermediate output of the compiler: pattern text interleaved
/// with the end-of-expression markers that are still pending.
#[derive(Debug, PartialEq, Clone, Default)]
struct Emitted {
    pieces: Vec<Piece>,
}

impl Emitted {
    fn text(s: &str) -> Self {
        let mut emitted = Emitted::default();
        emitted.push_str(s);
        emitted
    }

    fn marker() -> Self {
        Emitted {
            pieces: vec![Piece::EndOfExpression],
        }
    }

    fn push_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }

        match self.pieces.last_mut() {
            Some(Piece::Text(last)) => last.push_str(s),
            _ => self.pieces.push(Piece::Text(s.to_owned())),
        }
    }

    fn append(&mut self, other: Emitted) {
        for piece in other.pieces {
            match piece {
                Piece::Text(s) => self.push_str(&s),
                Piece::EndOfExpression => self.pieces.push(Piece::EndOfExpression),
            }
        }
    }

    fn wrap(self, prefix: &str, suffix: &str) -> Emitted {
        let mut wrapped = Emitted::text(prefix);
        wrapped.append(self);
        wrapped.push_str(suffix);
        wrapped
    }

    // the text characters, markers contribute nothing
    fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.pieces
            .iter()
            .filter_map(|piece| match piece {
                Piece::Text(s) => Some(s.chars()),
                Piece::EndOfExpression => None,
            })
            .flatten()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        let mut chars = self.chars();
        prefix.chars().all(|expected| chars.next() == Some(expected))
    }

    fn starts_with_group_prefix(&self) -> bool {
        GROUP_PREFIXES.iter().any(|prefix| self.starts_with(prefix))
    }
}

/// Compile a fragment tree into the pattern source.
pub fn compile_source(fragment: &Fragment) -> Result<String, FragmentError> {
    let emitted = compile_fragment(fragment, 0)?;
    let source = resolve_end_markers(emitted);

    log::trace!("compiled fragment: /{}/", source);
    Ok(source)
}

/// Compile a fragment into a [`Regex`].
///
/// Flags, first match wins: `flags` given by the caller, the explicit
/// flags of the fragment, `default_flags`, the union of the flags of
/// every native leaf. The global flag is always added.
pub fn compile_regex(
    fragment: &Fragment,
    flags: Option<&Flags>,
    default_flags: Option<&Flags>,
) -> Result<Regex, FragmentError> {
    let source = compile_source(fragment)?;
    let flags = resolve_flags(fragment, flags, default_flags)?;
    Regex::new(&source, &flags)
}

pub fn resolve_flags(
    fragment: &Fragment,
    flags: Option<&Flags>,
    default_flags: Option<&Flags>,
) -> Result<Flags, FragmentError> {
    let resolved = if let Some(flags) = flags {
        flags.clone()
    } else if let Some(explicit) = fragment.flags() {
        explicit
    } else if let Some(flags) = default_flags {
        flags.clone()
    } else {
        let mut collected = Flags::new();
        collect_leaf_flags(fragment, &mut collected, 0)?;
        collected
    };

    Ok(resolved.with_global())
}

// depth first, in child order
fn collect_leaf_flags(
    fragment: &Fragment,
    collected: &mut Flags,
    depth: usize,
) -> Result<(), FragmentError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(FragmentError::NestingTooDeep(MAX_NESTING_DEPTH));
    }

    let node = fragment.borrow();
    match &node.kind {
        FragmentKind::Native(pattern) => collected.extend(&pattern.flags),
        FragmentKind::Composite(children) => {
            for child in children {
                collect_leaf_flags(child, collected, depth + 1)?;
            }
        }
        FragmentKind::Until { ahead, .. } => collect_leaf_flags(ahead, collected, depth + 1)?,
        FragmentKind::EndOfExpression => {}
    }

    for alternative in &node.alternatives {
        collect_leaf_flags(alternative, collected, depth + 1)?;
    }

    Ok(())
}

fn compile_fragment(fragment: &Fragment, depth: usize) -> Result<Emitted, FragmentError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(FragmentError::NestingTooDeep(MAX_NESTING_DEPTH));
    }

    let node = fragment.borrow();

    let mut emitted = match &node.kind {
        FragmentKind::Native(pattern) => Emitted::text(&pattern.source),
        FragmentKind::Composite(children) => {
            let mut sequence = Emitted::default();
            for child in children {
                let compiled = compile_fragment(child, depth + 1)?;
                if compiled.starts_with("(") {
                    sequence.append(compiled);
                } else {
                    sequence.append(compiled.wrap("(", ")"));
                }
            }
            sequence
        }
        FragmentKind::Until {
            ahead,
            end,
            direction,
        } => {
            let mut ahead = compile_fragment(ahead, depth + 1)?;

            // a stripped group, put its parentheses back
            if ahead.starts_with_group_prefix() {
                ahead = ahead.wrap("(", ")");
            }
            ahead.append(compile_fragment(end, depth + 1)?);

            match direction {
                UntilDirection::Ahead => ahead.wrap(".*?(?=", ")"),
                UntilDirection::Behind => ahead.wrap("(?<=.*?(?=", "))"),
            }
        }
        FragmentKind::EndOfExpression => Emitted::marker(),
    };

    if !node.alternatives.is_empty() {
        let mut disjunction = emitted.wrap("((", ")");
        for alternative in &node.alternatives {
            let compiled = compile_fragment(alternative, depth + 1)?;
            disjunction.append(compiled.wrap("|(", ")"));
        }
        disjunction.push_str(")");
        emitted = disjunction;
    }

    let modifiers = &node.modifiers;

    if modifiers.one_or_more {
        emitted = emitted.wrap("(", ")+");
    }

    // star together with optional is a single lazy star
    if modifiers.zero_or_more && modifiers.optional {
        emitted = emitted.wrap("(", ")*?");
    } else if modifiers.zero_or_more {
        emitted = emitted.wrap("(", ")*");
    }

    if let Some(quantifier) = &modifiers.quantifier {
        emitted = emitted.wrap("(", &format!("){}", quantifier));
    }

    if modifiers.negated {
        emitted = emitted.wrap("[^", "]");
    }

    if modifiers.optional && !modifiers.zero_or_more {
        emitted = emitted.wrap("(", ")?");
    }

    Ok(emitted)
}

// the last marker becomes `$` when only group closings follow it,
// every other marker is dropped.
fn resolve_end_markers(emitted: Emitted) -> String {
    let pieces = emitted.pieces;

    let last_marker = pieces
        .iter()
        .rposition(|piece| *piece == Piece::EndOfExpression);

    let anchored = match last_marker {
        Some(index) => pieces[index + 1..].iter().all(|piece| match piece {
            Piece::Text(s) => s.chars().all(|c| c == ')'),
            Piece::EndOfExpression => true,
        }),
        None => false,
    };

    let mut source = String::new();
    for (index, piece) in pieces.iter().enumerate() {
        match piece {
            Piece::Text(s) => source.push_str(s),
            Piece::EndOfExpression => {
                if anchored && Some(index) == last_marker {
                    source.push('$');
                }
            }
        }
    }
    source
}

/// Whether the source starts with a group prefix such as `?:` or `?<=`,
/// i.e. it was an enclosed group whose `(` has been stripped.
pub fn has_group_prefix(source: &str) -> bool {
    GROUP_PREFIXES.iter().any(|prefix| source.starts_with(prefix))
}

/// The byte index of the `)` closing the `(` at the start of `source`.
///
/// Escaped characters and character classes are skipped.
fn enclosing_group_end(source: &str) -> Option<usize> {
    if !source.starts_with('(') {
        return None;
    }

    let mut level = 0usize;
    let mut escaped = false;
    let mut in_class = false;

    for (index, c) in source.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }

        match c {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => level += 1,
            ')' if !in_class => {
                level = level.saturating_sub(1);
                if level == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }

    None
}

/// Remove one pair of parentheses when it encloses the whole source,
/// `(ab)` becomes `ab` but `(a)(b)` is kept.
pub fn strip_enclosing_group(source: &str) -> &str {
    match enclosing_group_end(source) {
        Some(end) if end == source.len() - 1 => &source[1..end],
        _ => source,
    }
}

/// The capture groups of a source in index order, `None` for unnamed ones.
pub fn capture_group_names(source: &str) -> Vec<Option<String>> {
    let mut names = vec![];
    let mut escaped = false;
    let mut in_class = false;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if escaped {
            escaped = false;
            continue;
        }

        match c {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => {
                if chars.peek() != Some(&'?') {
                    names.push(None);
                    continue;
                }

                // `(?<name>` is a named group, `(?<=` and `(?<!` are lookbehinds
                let rest: String = chars.clone().take(3).collect();
                let mut prefix = rest.chars().skip(1);
                if prefix.next() == Some('<') && !matches!(prefix.next(), Some('=' | '!')) {
                    chars.next(); // ?
                    chars.next(); // <
                    let name: String = chars.by_ref().take_while(|c| *c != '>').collect();
                    names.push(Some(name));
                }
            }
            _ => {}
        }
    }

    names
}

impl Fragment {
    /// The compiled pattern source.
    pub fn to_source(&self) -> Result<String, FragmentError> {
        compile_source(self)
    }

    pub fn to_regex(&self) -> Result<Regex, FragmentError> {
        compile_regex(self, None, None)
    }

    pub fn to_regex_with_flags(&self, flags: &Flags) -> Result<Regex, FragmentError> {
        compile_regex(self, Some(flags), None)
    }

    /// The flags [`Fragment::to_regex`] would use.
    pub fn resolved_flags(&self) -> Result<Flags, FragmentError> {
        resolve_flags(self, None, None)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::{assert_eq, assert_str_eq};

    use crate::{
        ast::{Fragment, FragmentKind, NativePattern, UntilDirection},
        flags::Flags,
        FragmentError,
    };

    use super::{capture_group_names, has_group_prefix, strip_enclosing_group};

    fn leaf(source: &str) -> Fragment {
        Fragment::native(NativePattern::new(source))
    }

    fn leaf_with_flags(source: &str, flags: &str) -> Fragment {
        Fragment::native(NativePattern::with_flags(source, flags).unwrap())
    }

    #[test]
    fn test_compile_leaf_and_sequence() {
        assert_str_eq!(leaf(r"a\d").to_source().unwrap(), r"a\d");

        let sequence = Fragment::composite(vec![leaf("a"), leaf("b")]);
        assert_str_eq!(sequence.to_source().unwrap(), "(a)(b)");

        // a child starting with `(` is not wrapped again
        let sequence = Fragment::composite(vec![leaf("(x)"), leaf("y")]);
        assert_str_eq!(sequence.to_source().unwrap(), "(x)(y)");

        // nested composites
        let nested = Fragment::composite(vec![
            leaf("a"),
            Fragment::composite(vec![leaf("b"), leaf("c")]),
        ]);
        assert_str_eq!(nested.to_source().unwrap(), "(a)(b)(c)");

        assert_str_eq!(Fragment::composite(vec![]).to_source().unwrap(), "");
    }

    #[test]
    fn test_compile_alternatives() {
        let fragment = Fragment::composite(vec![leaf("a")]);
        fragment.push_alternative(leaf("b"));
        fragment.push_alternative(Fragment::composite(vec![leaf("c"), leaf("d")]));

        assert_str_eq!(fragment.to_source().unwrap(), "(((a))|(b)|((c)(d)))");

        let re = fragment.to_regex().unwrap();
        assert!(re.is_match("cd"));
        assert!(re.is_match("b"));
        assert!(!re.is_match("c"));
    }

    #[test]
    fn test_compile_modifiers() {
        let plus = leaf("a");
        plus.borrow_mut().modifiers.one_or_more = true;
        assert_str_eq!(plus.to_source().unwrap(), "(a)+");

        let star = leaf("a");
        star.borrow_mut().modifiers.zero_or_more = true;
        assert_str_eq!(star.to_source().unwrap(), "(a)*");

        let quantified = leaf("a");
        quantified.set_quantifier("{2,3}");
        assert_str_eq!(quantified.to_source().unwrap(), "(a){2,3}");

        let negated = leaf("a");
        negated.borrow_mut().modifiers.negated = true;
        assert_str_eq!(negated.to_source().unwrap(), "[^a]");

        let optional = leaf("a");
        optional.set_optional(true);
        assert_str_eq!(optional.to_source().unwrap(), "(a)?");

        let plus_optional = leaf("a");
        plus_optional.borrow_mut().modifiers.one_or_more = true;
        plus_optional.set_optional(true);
        assert_str_eq!(plus_optional.to_source().unwrap(), "((a)+)?");

        // fixed order: plus, star, quantifier, negation, optional
        let everything = leaf("a");
        {
            let mut node = everything.borrow_mut();
            node.modifiers.one_or_more = true;
            node.modifiers.negated = true;
            node.modifiers.optional = true;
            node.modifiers.quantifier = Some("{2}".to_owned());
        }
        assert_str_eq!(everything.to_source().unwrap(), "([^((a)+){2}])?");
    }

    #[test]
    fn test_compile_star_optional_folding() {
        let fragment = leaf("a");
        fragment.borrow_mut().modifiers.zero_or_more = true;
        fragment.set_optional(true);

        let source = fragment.to_source().unwrap();
        assert_str_eq!(source, "(a)*?");
        assert!(!source.ends_with(")?)") && !source.starts_with("(("));
    }

    #[test]
    fn test_compile_until() {
        let ahead = Fragment::composite(vec![leaf("X")]);

        // followed by other parts, the end marker is dropped
        let sequence = Fragment::composite(vec![
            Fragment::until(ahead.clone(), UntilDirection::Ahead),
            leaf("X"),
        ]);
        assert_str_eq!(sequence.to_source().unwrap(), "(.*?(?=(X)))(X)");

        let re = sequence.to_regex().unwrap();
        let captures = re.captures("abcXdef").unwrap();
        assert_str_eq!(captures.get(0).unwrap().as_str(), "abcX");
        assert_str_eq!(captures.get(1).unwrap().as_str(), "abc");

        // standing alone, it reaches the end of the expression
        let alone = Fragment::until(ahead.clone(), UntilDirection::Ahead);
        assert_str_eq!(alone.to_source().unwrap(), ".*?(?=(X)$)");

        let behind = Fragment::until(ahead, UntilDirection::Behind);
        assert_str_eq!(behind.to_source().unwrap(), "(?<=.*?(?=(X)$))");
    }

    #[test]
    fn test_compile_until_group_prefix() {
        let until = Fragment::until(leaf("?:x"), UntilDirection::Ahead);
        assert_str_eq!(until.to_source().unwrap(), ".*?(?=(?:x)$)");

        let re = until.to_regex().unwrap();
        assert_str_eq!(re.find("abx").unwrap().as_str(), "ab");

        let until = Fragment::until(leaf("?<x>y"), UntilDirection::Ahead);
        assert_str_eq!(until.to_source().unwrap(), ".*?(?=(?<x>y)$)");
        assert!(until.to_regex().is_ok());
    }

    #[test]
    fn test_until_end_node() {
        let until = Fragment::until(leaf("x"), UntilDirection::Ahead);
        let node = until.borrow();
        let FragmentKind::Until { ahead, end, .. } = &node.kind else {
            panic!("expected an until node");
        };

        assert!(matches!(end.borrow().kind, FragmentKind::EndOfExpression));
        assert!(end.parent().unwrap().ptr_eq(&until));
        assert!(ahead.parent().unwrap().ptr_eq(&until));
    }

    #[test]
    fn test_compile_end_markers() {
        let fragment = Fragment::composite(vec![
            Fragment::end_of_expression(),
            leaf("a"),
            Fragment::end_of_expression(),
        ]);
        assert_str_eq!(fragment.to_source().unwrap(), "()(a)($)");

        let fragment = Fragment::composite(vec![Fragment::end_of_expression(), leaf("a")]);
        assert_str_eq!(fragment.to_source().unwrap(), "()(a)");
    }

    #[test]
    fn test_compile_deterministic() {
        let fragment = Fragment::composite(vec![leaf("a"), leaf("b")]);
        fragment.push_alternative(leaf("c"));
        fragment.set_optional(true);

        assert_eq!(fragment.to_source().unwrap(), fragment.to_source().unwrap());
    }

    #[test]
    fn test_compile_nesting_too_deep() {
        let fragment = Fragment::composite(vec![leaf("a")]);
        fragment.push_alternative(fragment.clone());

        assert!(matches!(
            fragment.to_source(),
            Err(FragmentError::NestingTooDeep(_))
        ));
        assert!(matches!(
            fragment.resolved_flags(),
            Err(FragmentError::NestingTooDeep(_))
        ));

        // break the cycle
        fragment.borrow_mut().alternatives.clear();
    }

    #[test]
    fn test_resolve_flags() {
        let fragment = Fragment::composite(vec![
            leaf_with_flags("a", "i"),
            Fragment::composite(vec![leaf_with_flags("b", "m"), leaf_with_flags("c", "im")]),
            leaf("d"),
        ]);

        let flags = fragment.resolved_flags().unwrap();
        assert_eq!(flags.to_string(), "gim");
        assert_eq!(flags.len(), 3);

        // explicit flags win
        fragment.set_flags(Flags::parse("s").unwrap());
        assert_eq!(fragment.resolved_flags().unwrap().to_string(), "gs");

        // caller flags win over explicit flags
        let re = fragment
            .to_regex_with_flags(&Flags::parse("y").unwrap())
            .unwrap();
        assert_eq!(re.flags().to_string(), "gy");

        assert_eq!(leaf("a").resolved_flags().unwrap().to_string(), "g");
    }

    #[test]
    fn test_case_insensitive_leaf() {
        let fragment = Fragment::composite(vec![leaf_with_flags("abc", "i")]);
        assert!(fragment.to_regex().unwrap().is_match("xABCx"));
    }

    #[test]
    fn test_strip_enclosing_group() {
        assert_str_eq!(strip_enclosing_group("(ab)"), "ab");
        assert_str_eq!(strip_enclosing_group("((a)(b))"), "(a)(b)");
        assert_str_eq!(strip_enclosing_group("(a)(b)"), "(a)(b)");
        assert_str_eq!(strip_enclosing_group("ab"), "ab");
        assert_str_eq!(strip_enclosing_group("(a"), "(a");

        // escaped parens and classes do not count
        assert_str_eq!(strip_enclosing_group(r"(a\))"), r"a\)");
        assert_str_eq!(strip_enclosing_group(r"(a[)])"), "a[)]");
        assert_str_eq!(strip_enclosing_group(r"\(a\)"), r"\(a\)");
    }

    #[test]
    fn test_has_group_prefix() {
        assert!(has_group_prefix("?:a"));
        assert!(has_group_prefix("?<=a"));
        assert!(has_group_prefix("?<name>a"));
        assert!(!has_group_prefix("a?:"));
    }

    #[test]
    fn test_capture_group_names() {
        assert_eq!(
            capture_group_names(r"(a)(?:b)(?<year>\d{4})(?=c)(?<=d)(?<!e)\((f)[(](?<x>g)"),
            vec![
                None,
                Some("year".to_owned()),
                None,
                Some("x".to_owned())
            ]
        );
    }
}
