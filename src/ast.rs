// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use std::{
    cell::{Ref, RefCell, RefMut},
    collections::HashSet,
    rc::{Rc, Weak},
};

use crate::{escape::Literal, flags::Flags, registry::Registry, FragmentError};

/// A raw pattern handed to the matching engine as-is,
/// the counterpart of an ECMAScript `RegExp` value.
#[derive(Debug, PartialEq, Clone)]
pub struct NativePattern {
    pub source: String,
    pub flags: Flags,
}

impl NativePattern {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_owned(),
            flags: Flags::new(),
        }
    }

    pub fn with_flags(source: &str, flags: &str) -> Result<Self, FragmentError> {
        Ok(Self {
            source: source.to_owned(),
            flags: Flags::parse(flags)?,
        })
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UntilDirection {
    Ahead,  // .*?(?=...)
    Behind, // (?<=.*?(?=...))
}

#[derive(Debug)]
pub enum FragmentKind {
    /// A leaf holding a raw pattern.
    Native(NativePattern),

    /// An ordered sequence of children, concatenated when compiled.
    Composite(Vec<Fragment>),

    /**
     * "match lazily everything up to where `ahead` starts matching".
     *
     * `ahead` is the combination of every argument following the marker
     * in the same combinator call. `end` is an `EndOfExpression` node
     * closing the lookahead; it is resolved only when the whole tree
     * has been compiled.
     * */
    Until {
        ahead: Fragment,
        end: Fragment,
        direction: UntilDirection,
    },

    /// Placeholder for "end of the overall expression".
    EndOfExpression,
}

/// Quantifier and negation settings of a node.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Modifiers {
    pub optional: bool,
    pub one_or_more: bool,  // `+`
    pub zero_or_more: bool, // `*`
    pub quantifier: Option<String>,
    pub negated: bool, // `[^...]`
}

impl Modifiers {
    pub fn is_empty(&self) -> bool {
        !self.optional
            && !self.one_or_more
            && !self.zero_or_more
            && self.quantifier.is_none()
            && !self.negated
    }

    /// Merge the settings of `other` into `self`, a set switch stays set.
    pub fn merge(&mut self, other: &Modifiers) {
        self.optional |= other.optional;
        self.one_or_more |= other.one_or_more;
        self.zero_or_more |= other.zero_or_more;
        self.negated |= other.negated;
        if other.quantifier.is_some() {
            self.quantifier.clone_from(&other.quantifier);
        }
    }
}

#[derive(Debug)]
pub struct FragmentNode {
    pub kind: FragmentKind,
    pub alternatives: Vec<Fragment>,
    pub modifiers: Modifiers,

    // `None` means the flags are aggregated from the leaves.
    pub flags: Option<Flags>,

    // excluded from the capture output when used as a named group
    pub skip: bool,

    // non-owning, the builder owns the registry
    pub(crate) registry: Weak<RefCell<Registry>>,

    // bookkeeping only, never consulted by the compiler
    pub(crate) parent: Weak<RefCell<FragmentNode>>,
}

impl FragmentNode {
    fn new(kind: FragmentKind) -> Self {
        Self {
            kind,
            alternatives: vec![],
            modifiers: Modifiers::default(),
            flags: None,
            skip: false,
            registry: Weak::new(),
            parent: Weak::new(),
        }
    }
}

/// Value accepted by [`Fragment::new`].
#[derive(Debug, Clone)]
pub enum FragmentInput {
    Native(NativePattern),
    Fragment(Fragment),
    Literal(Literal),
}

impl From<NativePattern> for FragmentInput {
    fn from(value: NativePattern) -> Self {
        FragmentInput::Native(value)
    }
}

impl From<Fragment> for FragmentInput {
    fn from(value: Fragment) -> Self {
        FragmentInput::Fragment(value)
    }
}

impl From<&Fragment> for FragmentInput {
    fn from(value: &Fragment) -> Self {
        FragmentInput::Fragment(value.clone())
    }
}

impl From<Literal> for FragmentInput {
    fn from(value: Literal) -> Self {
        FragmentInput::Literal(value)
    }
}

/// A shared handle to a node of the fragment tree.
///
/// Cloning the handle does not copy the node: an aliased fragment is the
/// same node everywhere it is referenced, so changing its modifiers is
/// observed by every tree that contains it.
#[derive(Clone)]
pub struct Fragment(Rc<RefCell<FragmentNode>>);

impl Fragment {
    fn from_kind(kind: FragmentKind) -> Self {
        Fragment(Rc::new(RefCell::new(FragmentNode::new(kind))))
    }

    /// Construct a fragment following the construction rule:
    ///
    /// - exactly one native pattern builds a leaf.
    /// - any other list builds a composite, each input converted
    ///   into a child (native pattern to leaf, fragment reused,
    ///   literal escaped).
    pub fn new(inputs: Vec<FragmentInput>) -> Self {
        if inputs.len() == 1 {
            if let FragmentInput::Native(pattern) = &inputs[0] {
                return Fragment::native(pattern.clone());
            }
        }

        let children = inputs
            .into_iter()
            .map(|input| match input {
                FragmentInput::Native(pattern) => Fragment::native(pattern),
                FragmentInput::Fragment(fragment) => fragment,
                FragmentInput::Literal(literal) => literal.to_fragment(),
            })
            .collect();

        Fragment::composite(children)
    }

    pub fn native(pattern: NativePattern) -> Self {
        Fragment::from_kind(FragmentKind::Native(pattern))
    }

    pub fn composite(children: Vec<Fragment>) -> Self {
        let fragment = Fragment::from_kind(FragmentKind::Composite(vec![]));
        for child in &children {
            child.set_parent(&fragment);
        }
        if let FragmentKind::Composite(items) = &mut fragment.borrow_mut().kind {
            *items = children;
        }
        fragment
    }

    pub(crate) fn until(ahead: Fragment, direction: UntilDirection) -> Self {
        let end = Fragment::end_of_expression();
        let fragment = Fragment::from_kind(FragmentKind::Until {
            ahead: ahead.clone(),
            end: end.clone(),
            direction,
        });
        ahead.set_parent(&fragment);
        end.set_parent(&fragment);
        fragment
    }

    pub(crate) fn end_of_expression() -> Self {
        Fragment::from_kind(FragmentKind::EndOfExpression)
    }

    /// A new composite node whose only child is `target`,
    /// carrying `modifiers` so that `target` itself stays untouched.
    pub(crate) fn wrap_with(target: &Fragment, modifiers: Modifiers) -> Self {
        let wrapper = Fragment::composite(vec![target.clone()]);
        wrapper.borrow_mut().modifiers = modifiers;
        wrapper
    }

    pub(crate) fn borrow(&self) -> Ref<'_, FragmentNode> {
        self.0.borrow()
    }

    pub(crate) fn borrow_mut(&self) -> RefMut<'_, FragmentNode> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Fragment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn set_parent(&self, parent: &Fragment) {
        self.0.borrow_mut().parent = Rc::downgrade(&parent.0);
    }

    pub fn parent(&self) -> Option<Fragment> {
        self.0.borrow().parent.upgrade().map(Fragment)
    }

    pub fn is_native(&self) -> bool {
        matches!(self.0.borrow().kind, FragmentKind::Native(_))
    }

    pub fn native_pattern(&self) -> Option<NativePattern> {
        match &self.0.borrow().kind {
            FragmentKind::Native(pattern) => Some(pattern.clone()),
            _ => None,
        }
    }

    pub fn children(&self) -> Vec<Fragment> {
        match &self.0.borrow().kind {
            FragmentKind::Composite(children) => children.clone(),
            _ => vec![],
        }
    }

    pub fn alternatives(&self) -> Vec<Fragment> {
        self.0.borrow().alternatives.clone()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.0.borrow().modifiers.clone()
    }

    /// The explicit flags set by [`Fragment::set_flags`], if any.
    pub fn flags(&self) -> Option<Flags> {
        self.0.borrow().flags.clone()
    }

    pub fn is_skipped(&self) -> bool {
        self.0.borrow().skip
    }

    pub(crate) fn set_skip(&self, skip: bool) {
        self.0.borrow_mut().skip = skip;
    }

    pub fn set_flags(&self, flags: Flags) -> &Self {
        self.0.borrow_mut().flags = Some(flags);
        self
    }

    pub fn set_quantifier(&self, quantifier: &str) -> &Self {
        self.0.borrow_mut().modifiers.quantifier = Some(quantifier.to_owned());
        self
    }

    /// Use the source of a native pattern as the quantifier, e.g. `/{2,3}/`.
    pub fn set_quantifier_pattern(&self, pattern: &NativePattern) -> &Self {
        self.set_quantifier(&pattern.source)
    }

    pub fn set_optional(&self, optional: bool) -> &Self {
        self.0.borrow_mut().modifiers.optional = optional;
        self
    }

    pub(crate) fn push_alternative(&self, branch: Fragment) {
        branch.set_parent(self);
        self.0.borrow_mut().alternatives.push(branch);
    }

    /// Point this node and its whole subtree at `registry`.
    pub(crate) fn adopt(&self, registry: &Weak<RefCell<Registry>>) {
        let mut visited = HashSet::new();
        self.adopt_inner(registry, &mut visited);
    }

    fn adopt_inner(
        &self,
        registry: &Weak<RefCell<Registry>>,
        visited: &mut HashSet<*const RefCell<FragmentNode>>,
    ) {
        // an alias may end up referencing itself through `or`
        if !visited.insert(Rc::as_ptr(&self.0)) {
            return;
        }

        let linked = {
            let mut node = self.0.borrow_mut();
            node.registry = registry.clone();

            let mut linked = node.alternatives.clone();
            match &node.kind {
                FragmentKind::Composite(children) => linked.extend(children.iter().cloned()),
                FragmentKind::Until { ahead, end, .. } => {
                    linked.push(ahead.clone());
                    linked.push(end.clone());
                }
                FragmentKind::Native(_) | FragmentKind::EndOfExpression => {}
            }
            linked
        };

        for fragment in linked {
            fragment.adopt_inner(registry, visited);
        }
    }

    pub(crate) fn registry(&self) -> Option<Rc<RefCell<Registry>>> {
        self.0.borrow().registry.upgrade()
    }
}

impl std::fmt::Debug for Fragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.try_borrow() {
            Ok(node) => write!(f, "Fragment({:?}, {:?})", node.kind, node.modifiers),
            Err(_) => f.write_str("Fragment(<borrowed>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::escape::Literal;

    use super::{Fragment, FragmentInput, Modifiers, NativePattern};

    #[test]
    fn test_construction_rule() {
        // one native pattern is a leaf
        let leaf = Fragment::new(vec![NativePattern::new("a+").into()]);
        assert!(leaf.is_native());
        assert!(leaf.children().is_empty());
        assert_eq!(leaf.native_pattern().unwrap().source, "a+");

        // anything else is a composite
        let inner = Fragment::native(NativePattern::new("b"));
        let composite = Fragment::new(vec![
            NativePattern::new("a").into(),
            FragmentInput::from(&inner),
            Literal::from("c.d").into(),
        ]);
        assert!(!composite.is_native());
        assert!(composite.native_pattern().is_none());

        let children = composite.children();
        assert_eq!(children.len(), 3);
        assert!(children[1].ptr_eq(&inner));
        assert_eq!(children[2].native_pattern().unwrap().source, r"c\.d");

        // children point back to the composite
        for child in &children {
            assert!(child.parent().unwrap().ptr_eq(&composite));
        }

        // a single literal is still a composite with one child
        let single = Fragment::new(vec![Literal::from(5).into()]);
        assert_eq!(single.children().len(), 1);
    }

    #[test]
    fn test_shared_mutation() {
        let shared = Fragment::native(NativePattern::new("x"));
        let first = Fragment::composite(vec![shared.clone()]);
        let second = Fragment::composite(vec![shared.clone()]);

        shared.set_optional(true);

        assert!(first.children()[0].modifiers().optional);
        assert!(second.children()[0].modifiers().optional);
    }

    #[test]
    fn test_modifier_setters() {
        let fragment = Fragment::native(NativePattern::new("x"));
        fragment
            .set_quantifier("{2,3}")
            .set_optional(true)
            .set_flags(crate::Flags::parse("i").unwrap());

        assert_eq!(
            fragment.modifiers(),
            Modifiers {
                optional: true,
                quantifier: Some("{2,3}".to_owned()),
                ..Modifiers::default()
            }
        );
        assert_eq!(fragment.flags().unwrap().to_string(), "i");

        fragment.set_quantifier_pattern(&NativePattern::new("{4}"));
        assert_eq!(fragment.modifiers().quantifier.as_deref(), Some("{4}"));
    }

    #[test]
    fn test_modifiers_merge() {
        let mut base = Modifiers {
            optional: true,
            ..Modifiers::default()
        };
        assert!(!base.is_empty());

        base.merge(&Modifiers {
            zero_or_more: true,
            ..Modifiers::default()
        });
        assert!(base.optional && base.zero_or_more);
        assert!(!base.one_or_more);
        assert!(Modifiers::default().is_empty());
    }
}
