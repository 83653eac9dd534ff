// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{
    ast::{Fragment, NativePattern},
    builder::RegexBuilder,
    escape::Literal,
    FragmentError,
};

pub type LiteralFn = Box<dyn FnOnce() -> String>;
pub type CombinatorFn = Box<dyn FnOnce(&RegexBuilder) -> Result<Fragment, FragmentError>>;

/// One argument of a combinator call, or the value of an alias/group.
///
/// A bare `&str` converts to [`Argument::Name`] (a reference to an alias
/// or group, with the suffix grammar); text to be matched literally goes
/// through [`Argument::literal`] or [`Argument::text_fn`].
pub enum Argument {
    Native(NativePattern),
    Fragment(Fragment),
    Name(String),
    LiteralFn(LiteralFn),
    Combinator(CombinatorFn),
    Literal(Literal),

    // `None` means "up to where the remaining arguments match"
    Until(Option<NativePattern>),
    BehindUntil(Option<NativePattern>),
}

impl Argument {
    pub fn name(name: &str) -> Self {
        Argument::Name(name.to_owned())
    }

    pub fn native(source: &str) -> Self {
        Argument::Native(NativePattern::new(source))
    }

    pub fn literal<T: Into<Literal>>(value: T) -> Self {
        Argument::Literal(value.into())
    }

    pub fn text_fn<F>(f: F) -> Self
    where
        F: FnOnce() -> String + 'static,
    {
        Argument::LiteralFn(Box::new(f))
    }

    pub fn combinator<F>(f: F) -> Self
    where
        F: FnOnce(&RegexBuilder) -> Result<Fragment, FragmentError> + 'static,
    {
        Argument::Combinator(Box::new(f))
    }

    pub fn until() -> Self {
        Argument::Until(None)
    }

    pub fn until_pattern(pattern: NativePattern) -> Self {
        Argument::Until(Some(pattern))
    }

    pub fn behind_until() -> Self {
        Argument::BehindUntil(None)
    }

    pub fn behind_until_pattern(pattern: NativePattern) -> Self {
        Argument::BehindUntil(Some(pattern))
    }

    pub fn is_forward_reference(&self) -> bool {
        matches!(self, Argument::Until(_) | Argument::BehindUntil(_))
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::Name(value.to_owned())
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Argument::Name(value)
    }
}

impl From<NativePattern> for Argument {
    fn from(value: NativePattern) -> Self {
        Argument::Native(value)
    }
}

impl From<Fragment> for Argument {
    fn from(value: Fragment) -> Self {
        Argument::Fragment(value)
    }
}

impl From<&Fragment> for Argument {
    fn from(value: &Fragment) -> Self {
        Argument::Fragment(value.clone())
    }
}

impl From<Literal> for Argument {
    fn from(value: Literal) -> Self {
        Argument::Literal(value)
    }
}

impl From<i64> for Argument {
    fn from(value: i64) -> Self {
        Argument::Literal(Literal::Integer(value))
    }
}

impl From<i32> for Argument {
    fn from(value: i32) -> Self {
        Argument::Literal(Literal::Integer(value as i64))
    }
}

impl From<f64> for Argument {
    fn from(value: f64) -> Self {
        Argument::Literal(Literal::Float(value))
    }
}

impl From<bool> for Argument {
    fn from(value: bool) -> Self {
        Argument::Literal(Literal::Boolean(value))
    }
}

/// Build a `Vec<Argument>` from values convertible into [`Argument`].
///
/// ```
/// use regex_fragment::{args, Argument};
/// let list = args!["digit+", Argument::literal("."), Argument::until(), "end"];
/// assert_eq!(list.len(), 4);
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::Argument::from($arg)),*]
    };
}
