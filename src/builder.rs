// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use indexmap::IndexMap;

use crate::{
    argument::Argument,
    ast::{Fragment, Modifiers, NativePattern},
    capture::{self, CaptureOptions, CaptureRecord},
    combinator::{self, resolve_value},
    compiler::{compile_regex, compile_source, has_group_prefix, strip_enclosing_group},
    escape::Literal,
    flags::Flags,
    regex::Regex,
    registry::{NameClass, Registry, ResolvedName},
    FragmentError,
};

const SKIPPED_GROUP_PREFIX: &str = "group_that_is_skipped_";

/// The entry point: owns the alias/group registry shared by every
/// fragment built through it.
///
/// Cloning a builder shares the registry.
///
/// ```
/// use regex_fragment::{args, Argument, NativePattern, RegexBuilder};
///
/// let builder = RegexBuilder::new();
/// builder.alias("digit", NativePattern::new(r"\d")).unwrap();
/// builder.group("year", Argument::combinator(|b| {
///     let year = b.regex(args!["digit"])?;
///     year.set_quantifier("{4}");
///     Ok(year)
/// })).unwrap();
///
/// let records = builder.capture("in 2024", &Default::default()).unwrap();
/// assert_eq!(records[0]["year"].value, "2024");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegexBuilder {
    registry: Rc<RefCell<Registry>>,

    // default flags of `to_regex`, `compile` and `capture`
    flags: Option<Flags>,
}

impl RegexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flags(flags: Flags) -> Self {
        Self {
            registry: Rc::default(),
            flags: Some(flags),
        }
    }

    pub(crate) fn from_registry(registry: Rc<RefCell<Registry>>) -> Self {
        Self {
            registry,
            flags: None,
        }
    }

    pub fn set_flags(&mut self, flags: Flags) -> &mut Self {
        self.flags = Some(flags);
        self
    }

    pub fn flags(&self) -> Option<&Flags> {
        self.flags.as_ref()
    }

    pub(crate) fn registry_handle(&self) -> Weak<RefCell<Registry>> {
        Rc::downgrade(&self.registry)
    }

    pub(crate) fn resolve(&self, token: &str) -> Option<ResolvedName> {
        self.registry.borrow().resolve(token)
    }

    /// Register a reusable fragment under `name`.
    pub fn alias<T: Into<Argument>>(&self, name: &str, value: T) -> Result<Fragment, FragmentError> {
        self.register(NameClass::Alias, name, value.into())
    }

    /// Register a named capture target under `name`.
    pub fn group<T: Into<Argument>>(&self, name: &str, value: T) -> Result<Fragment, FragmentError> {
        self.register(NameClass::Group, name, value.into())
    }

    /// Register a capture target whose matches are consumed
    /// but left out of the capture records.
    pub fn skip<T: Into<Argument>>(&self, value: T) -> Result<Fragment, FragmentError> {
        let fragment = resolve_value(self, value.into())?;
        let name = self.next_skip_name();
        self.insert(NameClass::Group, &name, fragment, true)
    }

    fn register(
        &self,
        class: NameClass,
        name: &str,
        value: Argument,
    ) -> Result<Fragment, FragmentError> {
        // fail before running any combinator function
        if name.is_empty() {
            return Err(FragmentError::EmptyName);
        }
        if self.registry.borrow().contains(name) {
            return Err(FragmentError::DuplicateName(name.to_owned()));
        }

        let fragment = resolve_value(self, value)?;
        self.insert(class, name, fragment, false)
    }

    fn insert(
        &self,
        class: NameClass,
        name: &str,
        fragment: Fragment,
        skip: bool,
    ) -> Result<Fragment, FragmentError> {
        let fragment = {
            let mut registry = self.registry.borrow_mut();

            // never mark a node that is also registered under another name
            let fragment = if skip && registry.contains_fragment(&fragment) {
                Fragment::wrap_with(&fragment, Modifiers::default())
            } else {
                fragment
            };

            // checked again, a combinator function may have taken the name
            registry.insert(class, name, fragment.clone())?;
            fragment
        };

        if skip {
            fragment.set_skip(true);
        }
        fragment.adopt(&self.registry_handle());

        log::debug!("registered {:?} \"{}\"", class, name);
        Ok(fragment)
    }

    fn next_skip_name(&self) -> String {
        let registry = self.registry.borrow();
        let mut number = registry.groups().len() + 1;
        let mut name = format!("{}{}", SKIPPED_GROUP_PREFIX, number);

        while registry.contains(&name) {
            log::warn!("skipped group name \"{}\" is taken", name);
            number += 1;
            name = format!("{}{}", SKIPPED_GROUP_PREFIX, number);
        }
        name
    }

    /// Combine `args` into one composite fragment.
    pub fn regex(&self, args: Vec<Argument>) -> Result<Fragment, FragmentError> {
        combinator::combine(self, args)
    }

    /// A fragment matching `value` literally.
    pub fn variable<T: Into<Literal>>(&self, value: T) -> Fragment {
        let fragment = value.into().to_fragment();
        fragment.adopt(&self.registry_handle());
        fragment
    }

    pub fn lookahead(&self, args: Vec<Argument>) -> Result<NativePattern, FragmentError> {
        self.lookaround("?=", args)
    }

    pub fn lookbehind(&self, args: Vec<Argument>) -> Result<NativePattern, FragmentError> {
        self.lookaround("?<=", args)
    }

    pub fn negative_lookahead(&self, args: Vec<Argument>) -> Result<NativePattern, FragmentError> {
        self.lookaround("?!", args)
    }

    pub fn negative_lookbehind(&self, args: Vec<Argument>) -> Result<NativePattern, FragmentError> {
        self.lookaround("?<!", args)
    }

    fn lookaround(&self, prefix: &str, args: Vec<Argument>) -> Result<NativePattern, FragmentError> {
        let source = combinator::combine(self, args)?.to_source()?;
        Ok(NativePattern::new(&format!(
            "({}{})",
            prefix,
            strip_enclosing_group(&source)
        )))
    }

    /// One group per argument: `(?<group_N>...)` with `N` the 1-based
    /// argument position.
    ///
    /// Sources starting with a lookaround or named group prefix, and
    /// `until` sources, become plain groups.
    pub fn capture_groups(&self, args: Vec<Argument>) -> Result<NativePattern, FragmentError> {
        let products = combinator::products(self, args)?;

        let mut source = String::new();
        for (index, product) in products.iter().enumerate() {
            let Some(product) = product else {
                continue;
            };

            let compiled = compile_source(product)?;
            let compiled = strip_enclosing_group(&compiled);
            if has_group_prefix(compiled) || compiled.starts_with(".*?") {
                source.push_str(&format!("({})", compiled));
            } else {
                source.push_str(&format!("(?<group_{}>{})", index + 1, compiled));
            }
        }

        let stripped = strip_enclosing_group(&source);
        let source = if has_group_prefix(stripped) {
            format!("({})", stripped)
        } else {
            stripped.to_owned()
        };

        Ok(NativePattern::new(&source))
    }

    /// Compile a single value (a name with suffixes, a native pattern,
    /// a fragment, a literal or a function) into a [`Regex`].
    ///
    /// `flags` wins over the flags of the value and the builder flags.
    pub fn to_regex<T: Into<Argument>>(
        &self,
        value: T,
        flags: Option<&Flags>,
    ) -> Result<Regex, FragmentError> {
        let fragment = resolve_value(self, value.into())?;
        compile_regex(&fragment, flags, self.flags.as_ref())
    }

    pub fn to_source<T: Into<Argument>>(
        &self,
        value: T,
        flags: Option<&Flags>,
    ) -> Result<String, FragmentError> {
        self.to_regex(value, flags)
            .map(|regex| regex.source().to_owned())
    }

    /// Combine `args` and compile the result.
    pub fn compile(&self, args: Vec<Argument>) -> Result<Regex, FragmentError> {
        let fragment = combinator::combine(self, args)?;
        compile_regex(&fragment, None, self.flags.as_ref())
    }

    pub fn source(&self, args: Vec<Argument>) -> Result<String, FragmentError> {
        combinator::combine(self, args)?.to_source()
    }

    /// Capture every registered group, in registration order.
    pub fn capture(
        &self,
        text: &str,
        options: &CaptureOptions,
    ) -> Result<Vec<CaptureRecord>, FragmentError> {
        let groups = self.registry.borrow().groups().clone();
        self.capture_groups_in(text, &groups, options)
    }

    /// Capture the given groups instead of the registered ones.
    pub fn capture_groups_in(
        &self,
        text: &str,
        groups: &IndexMap<String, Fragment>,
        options: &CaptureOptions,
    ) -> Result<Vec<CaptureRecord>, FragmentError> {
        capture::capture(text, groups, options, self.flags.as_ref())
    }

    pub fn aliases(&self) -> Vec<String> {
        self.registry.borrow().aliases().keys().cloned().collect()
    }

    pub fn groups(&self) -> Vec<String> {
        self.registry.borrow().groups().keys().cloned().collect()
    }

    pub fn get_alias(&self, name: &str) -> Option<Fragment> {
        self.registry.borrow().get_alias(name)
    }

    pub fn get_group(&self, name: &str) -> Option<Fragment> {
        self.registry.borrow().get_group(name)
    }
}
