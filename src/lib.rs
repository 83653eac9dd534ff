// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

mod argument;
mod ast;
mod builder;
mod capture;
mod combinator;
mod compiler;
mod escape;
mod flags;
mod printer;
mod regex;
mod registry;

pub use argument::{Argument, CombinatorFn, LiteralFn};
pub use ast::{Fragment, FragmentInput, Modifiers, NativePattern};
pub use builder::RegexBuilder;
pub use capture::{sanitize_group_name, CaptureMode, CaptureOptions, CaptureRecord, GroupMatch};
pub use compiler::MAX_NESTING_DEPTH;
pub use escape::{escape_literal, Literal};
pub use flags::{Flag, Flags};
pub use regex::{CaptureMatches, Captures, Match, Matches, Regex};

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum FragmentError {
    #[error("The name of an alias or group cannot be empty.")]
    EmptyName,

    #[error("The name \"{0}\" is already registered.")]
    DuplicateName(String),

    #[error("Could not find an alias or group for \"{0}\".")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    InvalidFlags(String),

    #[error("Invalid pattern /{pattern}/: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("The group name \"{0}\" clashes with another group once sanitized.")]
    DuplicateCaptureName(String),

    #[error("The fragment is nested deeper than {0} levels.")]
    NestingTooDeep(usize),
}
