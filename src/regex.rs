// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::ops::{Index, Range};

use crate::{
    compiler::capture_group_names,
    flags::{Flag, Flags},
    FragmentError,
};

/// A compiled pattern: the source, its flags and the `regress` engine.
///
/// Iteration is always global. With the sticky flag (`y`) a match must
/// start exactly where the previous one ended (the first one at 0), or
/// one character further after an empty match.
#[derive(Debug, Clone)]
pub struct Regex {
    source: String,
    flags: Flags,
    capture_names: Vec<Option<String>>,
    engine: regress::Regex,
}

impl Regex {
    pub fn new(source: &str, flags: &Flags) -> Result<Self, FragmentError> {
        let engine = regress::Regex::with_flags(source, flags.engine_flags().as_str())
            .map_err(|e| FragmentError::InvalidPattern {
                pattern: source.to_owned(),
                message: e.to_string(),
            })?;

        // group 0 is the whole match
        let mut capture_names = vec![None];
        capture_names.extend(capture_group_names(source));

        Ok(Regex {
            source: source.to_owned(),
            flags: flags.clone(),
            capture_names,
            engine,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn is_sticky(&self) -> bool {
        self.flags.contains(Flag::Sticky)
    }

    pub fn find<'a>(&'a self, text: &'a str) -> Option<Match<'a>> {
        self.find_iter(text).next()
    }

    pub fn find_iter<'a>(&'a self, text: &'a str) -> Matches<'a> {
        Matches {
            text,
            inner: self.raw_matches(text),
        }
    }

    pub fn captures<'a>(&'a self, text: &'a str) -> Option<Captures<'a>> {
        self.captures_iter(text).next()
    }

    pub fn captures_iter<'a>(&'a self, text: &'a str) -> CaptureMatches<'a> {
        CaptureMatches {
            regex: self,
            text,
            inner: self.raw_matches(text),
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.raw_matches(text).next().is_some()
    }

    /// The engine matches, cut at the first gap when the regex is sticky.
    ///
    /// After an empty match the next one may start one character later,
    /// as the search position steps over it.
    pub(crate) fn raw_matches<'a>(
        &'a self,
        text: &'a str,
    ) -> Box<dyn Iterator<Item = regress::Match> + 'a> {
        let matches = self.engine.find_iter(text);
        if self.is_sticky() {
            let mut expected = 0;
            Box::new(matches.take_while(move |m| {
                if m.start() != expected {
                    return false;
                }

                expected = if m.end() == m.start() {
                    text[m.end()..]
                        .chars()
                        .next()
                        .map_or(m.end() + 1, |c| m.end() + c.len_utf8())
                } else {
                    m.end()
                };
                true
            }))
        } else {
            Box::new(matches)
        }
    }
}

pub struct Matches<'a> {
    text: &'a str,
    inner: Box<dyn Iterator<Item = regress::Match> + 'a>,
}

impl<'a> Iterator for Matches<'a> {
    type Item = Match<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let m = self.inner.next()?;
        let text: &'a str = self.text;
        Some(Match::new(m.start(), m.end(), None, &text[m.range()]))
    }
}

pub struct CaptureMatches<'a> {
    regex: &'a Regex,
    text: &'a str,
    inner: Box<dyn Iterator<Item = regress::Match> + 'a>,
}

impl<'a> Iterator for CaptureMatches<'a> {
    type Item = Captures<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let m = self.inner.next()?;
        let regex: &'a Regex = self.regex;
        let names = &regex.capture_names;
        let text: &'a str = self.text;

        let matches = m
            .groups()
            .enumerate()
            .map(|(idx, range)| {
                range.map(|range| {
                    let name = names.get(idx).and_then(|name| name.as_deref());
                    Match::new(range.start, range.end, name, &text[range])
                })
            })
            .collect();

        Some(Captures { matches })
    }
}

/// The groups of one match, `None` for a group that did not participate.
#[derive(Debug, PartialEq, Clone)]
pub struct Captures<'a> {
    pub matches: Vec<Option<Match<'a>>>,
}

impl Captures<'_> {
    // the following methods are intended to
    // be compatible with the 'Captures' API of crate 'regex':
    // https://docs.rs/regex/latest/regex/struct.Captures.html

    pub fn get(&self, index: usize) -> Option<&Match<'_>> {
        self.matches.get(index).and_then(|item| item.as_ref())
    }

    pub fn name(&self, name: &str) -> Option<&Match<'_>> {
        self.matches
            .iter()
            .flatten()
            .find(|item| item.name == Some(name))
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Index<usize> for Captures<'_> {
    type Output = str;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index)
            .unwrap_or_else(|| panic!(
                "Index {} is out of range of the capture group or did not participate, the length of capture groups is {}.",
                index, self.len()))
            .as_str()
    }
}

impl Index<&str> for Captures<'_> {
    type Output = str;

    fn index(&self, name: &str) -> &Self::Output {
        self.name(name)
            .unwrap_or_else(|| panic!("Cannot find the capture group named \"{}\".", name))
            .as_str()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Match<'a> {
    pub start: usize, // the position of utf-8 byte stream (value included)
    pub end: usize,   // the position of utf-8 byte stream (value excluded)
    pub name: Option<&'a str>,
    pub value: &'a str,
}

impl<'a> Match<'a> {
    pub fn new(start: usize, end: usize, name: Option<&'a str>, value: &'a str) -> Self {
        Match {
            start,
            end,
            name,
            value,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn range(&self) -> Range<usize> {
        Range {
            start: self.start,
            end: self.end,
        }
    }

    pub fn as_str(&self) -> &'a str {
        self.value
    }
}
