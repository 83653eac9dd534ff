// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{collections::HashSet, ops::Index};

use indexmap::IndexMap;

use crate::{
    ast::Fragment,
    compiler::{compile_source, resolve_flags},
    escape::META_CHARS,
    flags::Flags,
    regex::Regex,
    FragmentError,
};

// inserted between two groups when `strict_mode` is off
const LOOSE_GAP: &str = r"(?:[\s\S]*?)";

const DIGIT_WORDS: [&str; 10] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub enum CaptureMode {
    #[default]
    None,
    FromBegin,         // ^...
    UntilEnd,          // ...$
    FromBeginUntilEnd, // ^...$
}

impl CaptureMode {
    fn anchors_begin(&self) -> bool {
        matches!(self, CaptureMode::FromBegin | CaptureMode::FromBeginUntilEnd)
    }

    fn anchors_end(&self) -> bool {
        matches!(self, CaptureMode::UntilEnd | CaptureMode::FromBeginUntilEnd)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct CaptureOptions {
    // `None` falls back to the builder flags, then to the flags of the groups
    pub flags: Option<Flags>,
    pub capture_mode: CaptureMode,

    // groups must follow each other without any gap
    pub strict_mode: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            flags: None,
            capture_mode: CaptureMode::None,
            strict_mode: true,
        }
    }
}

impl CaptureOptions {
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn with_capture_mode(mut self, capture_mode: CaptureMode) -> Self {
        self.capture_mode = capture_mode;
        self
    }

    pub fn with_strict_mode(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }
}

/// The text matched by one group.
#[derive(Debug, PartialEq, Clone)]
pub struct GroupMatch {
    pub value: String,
    pub index: usize,  // the character offset where the group ends (excluded)
    pub length: usize, // in characters
}

/// The groups of one match, in registration order.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct CaptureRecord {
    groups: IndexMap<String, GroupMatch>,
}

impl CaptureRecord {
    pub fn get(&self, name: &str) -> Option<&GroupMatch> {
        self.groups.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(|name| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GroupMatch)> {
        self.groups.iter().map(|(name, item)| (name.as_str(), item))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Index<&str> for CaptureRecord {
    type Output = GroupMatch;

    fn index(&self, name: &str) -> &Self::Output {
        self.get(name)
            .unwrap_or_else(|| panic!("Cannot find the capture group named \"{}\".", name))
    }
}

/// Turn a registered name into a valid native group name:
/// meta characters removed, whitespace to `_`, digits spelled out,
/// then anything that cannot appear in an identifier removed.
///
/// The result may be empty, e.g. for `"..."`.
pub fn sanitize_group_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for c in name.chars() {
        if META_CHARS.contains(&c) {
            continue;
        }

        if c.is_whitespace() {
            sanitized.push('_');
        } else if let Some(digit) = c.to_digit(10) {
            sanitized.push_str(DIGIT_WORDS[digit as usize]);
        } else if c == '_' || c.is_alphabetic() {
            sanitized.push(c);
        }
    }
    sanitized
}

struct CaptureEntry<'a> {
    name: &'a str,
    native_name: String,
    skip: bool,
}

// char offsets from byte offsets, moving forward only
struct CharCursor<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    fn offset_of(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            return self.text[..byte].chars().count();
        }

        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}

/// Run every group of `groups` as one pattern of adjacent named groups
/// over `text`, one record per match.
///
/// Per match the running offset starts at the match start and advances
/// by the length of each group in turn; each group records the offset
/// reached after it. In loose mode (`strict_mode` off) the offset jumps
/// to the real end of each group so the gaps are accounted for.
pub fn capture(
    text: &str,
    groups: &IndexMap<String, Fragment>,
    options: &CaptureOptions,
    default_flags: Option<&Flags>,
) -> Result<Vec<CaptureRecord>, FragmentError> {
    if groups.is_empty() {
        return Ok(vec![]);
    }

    let mut entries = Vec::with_capacity(groups.len());
    let mut taken = HashSet::new();
    let mut source = String::new();

    if options.capture_mode.anchors_begin() {
        source.push('^');
    }

    for (index, (name, fragment)) in groups.iter().enumerate() {
        let native_name = sanitize_group_name(name);
        if native_name.is_empty() {
            return Err(FragmentError::InvalidArgument(format!(
                "the group name \"{}\" has no character usable in a native group name",
                name
            )));
        }
        if !taken.insert(native_name.clone()) {
            return Err(FragmentError::DuplicateCaptureName(name.clone()));
        }

        if index > 0 && !options.strict_mode {
            source.push_str(LOOSE_GAP);
        }

        let group_source = compile_source(fragment)?;
        source.push_str(&format!("(?<{}>{})", native_name, group_source));

        entries.push(CaptureEntry {
            name,
            native_name,
            skip: fragment.is_skipped(),
        });
    }

    if options.capture_mode.anchors_end() {
        source.push('$');
    }

    let flags = match options.flags.as_ref().or(default_flags) {
        Some(flags) => flags.with_global(),
        None => {
            let mut flags = Flags::new();
            for fragment in groups.values() {
                flags.extend(&resolve_flags(fragment, None, None)?);
            }
            flags.with_global()
        }
    };

    log::debug!("capture pattern: /{}/{}", source, flags);

    let regex = Regex::new(&source, &flags)?;
    let mut cursor = CharCursor::new(text);
    let mut records = vec![];

    for m in regex.raw_matches(text) {
        let mut offset = cursor.offset_of(m.start());
        let mut record = CaptureRecord::default();

        for entry in &entries {
            let range = m.named_group(&entry.native_name);

            // a group that did not participate matched the empty string
            let (value, length) = match &range {
                Some(range) => {
                    let value = &text[range.clone()];
                    (value, value.chars().count())
                }
                None => ("", 0),
            };

            match &range {
                Some(range) if !options.strict_mode => {
                    offset = cursor.offset_of(range.end);
                }
                _ => offset += length,
            }

            if entry.skip {
                continue;
            }

            record.groups.insert(
                entry.name.to_owned(),
                GroupMatch {
                    value: value.to_owned(),
                    index: offset,
                    length,
                },
            );
        }

        log::trace!("capture record: {:?}", record);
        records.push(record);
    }

    Ok(records)
}
