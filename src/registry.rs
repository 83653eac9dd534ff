// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use indexmap::IndexMap;

use crate::{
    ast::{Fragment, Modifiers},
    FragmentError,
};

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum NameClass {
    Alias,
    Group,
}

/// Names to fragments, one instance per builder.
///
/// Both maps keep insertion order, which is also the order of the
/// named groups in a capture pattern.
#[derive(Debug, Default)]
pub struct Registry {
    aliases: IndexMap<String, Fragment>,
    groups: IndexMap<String, Fragment>,
}

/// A registered fragment found through a (possibly suffixed) name.
#[derive(Debug, Clone)]
pub struct ResolvedName {
    pub name: String,
    pub target: Fragment,
    pub modifiers: Modifiers,
}

impl ResolvedName {
    /// The registered node itself when there is no suffix,
    /// otherwise a wrapper carrying the suffix modifiers.
    pub fn into_fragment(self) -> Fragment {
        if self.modifiers.is_empty() {
            self.target
        } else {
            Fragment::wrap_with(&self.target, self.modifiers)
        }
    }
}

impl Registry {
    pub fn contains(&self, name: &str) -> bool {
        self.aliases.contains_key(name) || self.groups.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Fragment> {
        self.aliases
            .get(name)
            .or_else(|| self.groups.get(name))
            .cloned()
    }

    pub fn get_alias(&self, name: &str) -> Option<Fragment> {
        self.aliases.get(name).cloned()
    }

    pub fn get_group(&self, name: &str) -> Option<Fragment> {
        self.groups.get(name).cloned()
    }

    /// Whether this exact node is registered under any name.
    pub fn contains_fragment(&self, fragment: &Fragment) -> bool {
        self.aliases
            .values()
            .chain(self.groups.values())
            .any(|item| item.ptr_eq(fragment))
    }

    pub fn aliases(&self) -> &IndexMap<String, Fragment> {
        &self.aliases
    }

    pub fn groups(&self) -> &IndexMap<String, Fragment> {
        &self.groups
    }

    /// Add a name, the registry is left untouched when it fails.
    pub fn insert(
        &mut self,
        class: NameClass,
        name: &str,
        fragment: Fragment,
    ) -> Result<(), FragmentError> {
        check_name(self, name)?;

        match class {
            NameClass::Alias => self.aliases.insert(name.to_owned(), fragment),
            NameClass::Group => self.groups.insert(name.to_owned(), fragment),
        };
        Ok(())
    }

    /// Resolve a name reference with the suffix grammar.
    ///
    /// One suffix is stripped at a time and the lookup is retried after
    /// each strip, so a registered name wins over a suffix reading of it:
    ///
    /// - `name*?` zero or more, lazy (star and optional)
    /// - `name+?` one or more and optional
    /// - `name?`  optional
    /// - `name+`  one or more
    /// - `name*`  zero or more
    /// - `[^name]` negated
    pub fn resolve(&self, token: &str) -> Option<ResolvedName> {
        let mut rest = token;
        let mut modifiers = Modifiers::default();

        loop {
            if let Some(target) = self.get(rest) {
                return Some(ResolvedName {
                    name: rest.to_owned(),
                    target,
                    modifiers,
                });
            }

            let (stripped, suffix) = strip_suffix(rest)?;
            modifiers.merge(&suffix);
            rest = stripped;
        }
    }
}

fn check_name(registry: &Registry, name: &str) -> Result<(), FragmentError> {
    if name.is_empty() {
        Err(FragmentError::EmptyName)
    } else if registry.contains(name) {
        Err(FragmentError::DuplicateName(name.to_owned()))
    } else {
        Ok(())
    }
}

/// Whether `token` carries a suffix of the name grammar.
pub fn has_suffix(token: &str) -> bool {
    strip_suffix(token).is_some()
}

// the longest suffix is tried first so that `*?` is not read
// as `*` followed by a dangling `?`.
fn strip_suffix(token: &str) -> Option<(&str, Modifiers)> {
    let mut modifiers = Modifiers::default();

    let stripped = if let Some(s) = token.strip_suffix("*?") {
        modifiers.zero_or_more = true;
        modifiers.optional = true;
        s
    } else if let Some(s) = token.strip_suffix("+?") {
        modifiers.one_or_more = true;
        modifiers.optional = true;
        s
    } else if let Some(s) = token.strip_suffix('?') {
        modifiers.optional = true;
        s
    } else if let Some(s) = token.strip_suffix('+') {
        modifiers.one_or_more = true;
        s
    } else if let Some(s) = token.strip_suffix('*') {
        modifiers.zero_or_more = true;
        s
    } else if let Some(s) = token
        .strip_prefix("[^")
        .and_then(|inner| inner.strip_suffix(']'))
    {
        modifiers.negated = true;
        s
    } else {
        return None;
    };

    if stripped.is_empty() {
        None
    } else {
        Some((stripped, modifiers))
    }
}
