// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::fmt::Display;

use crate::FragmentError;

/// A single regular expression mode flag, ECMAScript spelling.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Flag {
    CaseInsensitive, // i
    Global,          // g
    Multiline,       // m
    DotAll,          // s
    Unicode,         // u
    Sticky,          // y
}

impl Flag {
    pub fn from_char(c: char) -> Option<Flag> {
        let flag = match c {
            'i' => Flag::CaseInsensitive,
            'g' => Flag::Global,
            'm' => Flag::Multiline,
            's' => Flag::DotAll,
            'u' => Flag::Unicode,
            'y' => Flag::Sticky,
            _ => return None,
        };
        Some(flag)
    }

    pub fn as_char(&self) -> char {
        match self {
            Flag::CaseInsensitive => 'i',
            Flag::Global => 'g',
            Flag::Multiline => 'm',
            Flag::DotAll => 's',
            Flag::Unicode => 'u',
            Flag::Sticky => 'y',
        }
    }

    /// Whether the flag changes how the engine interprets the pattern.
    /// `g` and `y` only change how matches are iterated.
    pub fn is_engine_flag(&self) -> bool {
        !matches!(self, Flag::Global | Flag::Sticky)
    }
}

/// An ordered set of flags without duplicates.
///
/// The order is the order of first insertion, so aggregating the flags
/// of a fragment tree is deterministic.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Flags {
    items: Vec<Flag>,
}

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a flag string such as `"im"`.
    ///
    /// Unknown letters and repeated letters are rejected, any unique
    /// combination of `i g m s u y` is accepted.
    pub fn parse(s: &str) -> Result<Self, FragmentError> {
        let mut flags = Flags::new();
        for c in s.chars() {
            let flag = Flag::from_char(c).ok_or_else(|| {
                FragmentError::InvalidFlags(format!("Unknown flag '{}' in \"{}\".", c, s))
            })?;

            if flags.contains(flag) {
                return Err(FragmentError::InvalidFlags(format!(
                    "Duplicate flag '{}' in \"{}\".",
                    c, s
                )));
            }
            flags.items.push(flag);
        }
        Ok(flags)
    }

    pub fn contains(&self, flag: Flag) -> bool {
        self.items.contains(&flag)
    }

    /// Add a flag, keeping the existing position if it is already present.
    pub fn insert(&mut self, flag: Flag) {
        if !self.contains(flag) {
            self.items.push(flag);
        }
    }

    pub fn extend(&mut self, other: &Flags) {
        for flag in &other.items {
            self.insert(*flag);
        }
    }

    /// Returns a copy with the global flag added in front if it was missing.
    pub fn with_global(&self) -> Flags {
        if self.contains(Flag::Global) {
            self.clone()
        } else {
            let mut items = Vec::with_capacity(self.items.len() + 1);
            items.push(Flag::Global);
            items.extend(self.items.iter().copied());
            Flags { items }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// The letters understood by the matching engine (`i m s u`),
    /// the iteration flags are handled by [`crate::Regex`] itself.
    pub fn engine_flags(&self) -> String {
        self.items
            .iter()
            .filter(|flag| flag.is_engine_flag())
            .map(|flag| flag.as_char())
            .collect()
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<T: IntoIterator<Item = Flag>>(iter: T) -> Self {
        let mut flags = Flags::new();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Display for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for flag in &self.items {
            write!(f, "{}", flag)?;
        }
        Ok(())
    }
}
