// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{
    argument::Argument,
    ast::{Fragment, NativePattern, UntilDirection},
    builder::RegexBuilder,
    escape::Literal,
    registry::has_suffix,
    FragmentError,
};

const ANCHOR_BEGIN: &str = "begin";
const ANCHOR_END: &str = "end";

// one argument after classification
enum Slot {
    Product(Fragment),
    Forward(UntilDirection),
    Dropped,
}

/// Combine an argument list into one composite fragment
/// adopted into the registry of `builder`.
pub fn combine(builder: &RegexBuilder, args: Vec<Argument>) -> Result<Fragment, FragmentError> {
    let children = products(builder, args)?.into_iter().flatten().collect();
    let fragment = Fragment::composite(children);
    fragment.adopt(&builder.registry_handle());
    Ok(fragment)
}

/// The fragment produced by each argument, in argument order.
///
/// `None` stands for an argument that produces nothing: an unknown bare
/// name, or a forward reference with no argument after it.
///
/// Arguments are resolved left to right (combinator functions may still
/// register names used further on), then assembled right to left so that
/// a forward reference can take everything after it as its `ahead`.
pub fn products(
    builder: &RegexBuilder,
    args: Vec<Argument>,
) -> Result<Vec<Option<Fragment>>, FragmentError> {
    let mut slots = Vec::with_capacity(args.len());
    for arg in args {
        slots.push(classify(builder, arg)?);
    }

    let mut products: Vec<Option<Fragment>> = Vec::with_capacity(slots.len());
    for slot in slots.into_iter().rev() {
        let product = match slot {
            Slot::Product(fragment) => Some(fragment),
            Slot::Dropped => None,
            Slot::Forward(direction) => {
                // `products` holds the later arguments in reverse order
                let later: Vec<Fragment> = products.iter().rev().flatten().cloned().collect();
                if later.is_empty() {
                    None
                } else {
                    Some(Fragment::until(Fragment::composite(later), direction))
                }
            }
        };
        products.push(product);
    }

    products.reverse();
    Ok(products)
}

fn classify(builder: &RegexBuilder, arg: Argument) -> Result<Slot, FragmentError> {
    let slot = match arg {
        Argument::Until(Some(pattern)) | Argument::BehindUntil(Some(pattern)) => {
            Slot::Product(Fragment::native(pattern))
        }
        Argument::Until(None) => Slot::Forward(UntilDirection::Ahead),
        Argument::BehindUntil(None) => Slot::Forward(UntilDirection::Behind),
        Argument::Name(name) => match resolve_reference(builder, &name)? {
            Some(fragment) => Slot::Product(fragment),
            None => {
                log::debug!("dropped unknown name \"{}\"", name);
                Slot::Dropped
            }
        },
        other => Slot::Product(resolve_value(builder, other)?),
    };
    Ok(slot)
}

/// Resolve a name reference inside an argument list.
///
/// An unknown name without a suffix yields `None`.
fn resolve_reference(
    builder: &RegexBuilder,
    name: &str,
) -> Result<Option<Fragment>, FragmentError> {
    if let Some(resolved) = builder.resolve(name) {
        if resolved.name != name {
            log::trace!("\"{}\" resolved through \"{}\"", name, resolved.name);
        }
        return Ok(Some(resolved.into_fragment()));
    }

    let fragment = match name {
        ANCHOR_BEGIN => Some(Fragment::native(NativePattern::new("^"))),
        ANCHOR_END => Some(Fragment::native(NativePattern::new("$"))),
        _ if has_suffix(name) => return Err(FragmentError::NotFound(name.to_owned())),
        _ => None,
    };
    Ok(fragment)
}

/// Resolve a single value, e.g. the value of an alias or of `to_regex`.
///
/// Unlike inside an argument list, a name must resolve and forward
/// references are rejected.
pub fn resolve_value(builder: &RegexBuilder, value: Argument) -> Result<Fragment, FragmentError> {
    match value {
        Argument::Native(pattern) => Ok(Fragment::native(pattern)),
        Argument::Fragment(fragment) => Ok(fragment),
        Argument::Name(name) => {
            resolve_reference(builder, &name)?.ok_or(FragmentError::NotFound(name))
        }
        Argument::LiteralFn(f) => Ok(Literal::Text(f()).to_fragment()),
        Argument::Combinator(f) => f(builder),
        Argument::Literal(literal) => Ok(literal.to_fragment()),
        Argument::Until(_) => Err(FragmentError::InvalidArgument(
            "\"until\" is only allowed in an argument list.".to_owned(),
        )),
        Argument::BehindUntil(_) => Err(FragmentError::InvalidArgument(
            "\"behind until\" is only allowed in an argument list.".to_owned(),
        )),
    }
}

impl Fragment {
    /// Add an alternation branch built from `args`.
    ///
    /// Names are resolved against the registry this fragment was adopted
    /// into, so aliases defined after the fragment was built are visible.
    pub fn or(&self, args: Vec<Argument>) -> Result<&Self, FragmentError> {
        if args.is_empty() {
            return Ok(self);
        }

        let builder = match self.registry() {
            Some(registry) => RegexBuilder::from_registry(registry),
            None => RegexBuilder::new(),
        };

        let branch = combine(&builder, args)?;
        self.push_alternative(branch);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::{assert_eq, assert_str_eq};

    use crate::{
        args,
        argument::Argument,
        ast::NativePattern,
        builder::RegexBuilder,
        FragmentError,
    };

    use super::{combine, products, resolve_value};

    #[test]
    fn test_combine_mixed_arguments() {
        let builder = RegexBuilder::new();
        builder.alias("digit", NativePattern::new(r"\d")).unwrap();

        let fragment = combine(
            &builder,
            args![
                "digit+",
                Argument::literal("."),
                NativePattern::new("[a-z]"),
                Argument::text_fn(|| "1+1".to_owned()),
                7,
                true,
            ],
        )
        .unwrap();

        assert_str_eq!(
            fragment.to_source().unwrap(),
            r"((\d))+(\.)([a-z])(1\+1)(7)(true)"
        );
        assert!(fragment.registry().is_some());
    }

    #[test]
    fn test_combine_until() {
        let builder = RegexBuilder::new();
        builder.alias("x", NativePattern::new("X")).unwrap();

        let fragment = combine(&builder, args![Argument::until(), "x"]).unwrap();
        assert_str_eq!(fragment.to_source().unwrap(), "(.*?(?=(X)))(X)");

        let re = fragment.to_regex().unwrap();
        let captures = re.captures("abcXdef").unwrap();
        assert_str_eq!(captures.get(1).unwrap().as_str(), "abc");
        assert_str_eq!(captures.get(0).unwrap().as_str(), "abcX");

        // the lookahead alone stops before the literal
        let until = products(&builder, args![Argument::until(), "x"]).unwrap()[0]
            .clone()
            .unwrap();
        let re = until.to_regex().unwrap();
        assert_str_eq!(re.source(), ".*?(?=(X)$)");
        assert_str_eq!(re.find("abcX").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_combine_behind_until() {
        let builder = RegexBuilder::new();
        let fragment = combine(
            &builder,
            args![Argument::behind_until(), NativePattern::new("b")],
        )
        .unwrap();
        assert_str_eq!(fragment.to_source().unwrap(), "(?<=.*?(?=(b)))(b)");
    }

    #[test]
    fn test_combine_until_with_pattern() {
        let builder = RegexBuilder::new();
        let fragment = combine(
            &builder,
            args![
                Argument::until_pattern(NativePattern::new("[^;]*")),
                Argument::literal(";")
            ],
        )
        .unwrap();
        assert_str_eq!(fragment.to_source().unwrap(), "([^;]*)(;)");
    }

    #[test]
    fn test_combine_until_at_end() {
        let builder = RegexBuilder::new();
        let products = products(&builder, args![NativePattern::new("a"), Argument::until()]).unwrap();
        assert!(products[0].is_some());
        assert!(products[1].is_none());
    }

    #[test]
    fn test_combine_anchors_and_unknown_names() {
        let builder = RegexBuilder::new();
        let fragment = combine(
            &builder,
            args!["begin", NativePattern::new("a"), "nothing", "end"],
        )
        .unwrap();
        assert_str_eq!(fragment.to_source().unwrap(), "(^)(a)($)");

        // a registered name wins over the anchor
        builder.alias("end", NativePattern::new("END")).unwrap();
        let fragment = combine(&builder, args!["end"]).unwrap();
        assert_str_eq!(fragment.to_source().unwrap(), "(END)");
    }

    #[test]
    fn test_combine_suffix_not_found() {
        let builder = RegexBuilder::new();
        assert!(matches!(
            combine(&builder, args!["missing+"]),
            Err(FragmentError::NotFound(name)) if name == "missing+"
        ));
    }

    #[test]
    fn test_combine_shares_alias_node() {
        let builder = RegexBuilder::new();
        let word = builder.alias("word", NativePattern::new("w")).unwrap();
        let fragment = combine(&builder, args!["word", "word?"]).unwrap();

        let children = fragment.children();
        assert!(children[0].ptr_eq(&word));
        assert!(children[1].children()[0].ptr_eq(&word));
        assert_str_eq!(fragment.to_source().unwrap(), "(w)((w))?");

        // later changes to the alias are observed
        word.set_quantifier("{2}");
        assert_str_eq!(fragment.to_source().unwrap(), "(w){2}((w){2})?");
    }

    #[test]
    fn test_combinator_function() {
        let builder = RegexBuilder::new();
        builder.alias("a", NativePattern::new("a")).unwrap();

        let fragment = resolve_value(
            &builder,
            Argument::combinator(|b| b.regex(args!["a", b.variable("+")])),
        )
        .unwrap();
        assert_str_eq!(fragment.to_source().unwrap(), r"(a)(\+)");
    }

    #[test]
    fn test_resolve_value_rejects_forward_reference() {
        let builder = RegexBuilder::new();
        assert!(matches!(
            resolve_value(&builder, Argument::until()),
            Err(FragmentError::InvalidArgument(_))
        ));
        assert!(matches!(
            resolve_value(&builder, Argument::name("ghost")),
            Err(FragmentError::NotFound(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_or() {
        let builder = RegexBuilder::new();
        let fragment = builder.regex(args![NativePattern::new("a")]).unwrap();

        // an alias defined after the fragment was built
        builder.alias("b", NativePattern::new("b")).unwrap();
        fragment.or(args!["b"]).unwrap().or(vec![]).unwrap();

        assert_eq!(fragment.alternatives().len(), 1);
        assert_str_eq!(fragment.to_source().unwrap(), "(((a))|((b)))");

        let re = fragment.to_regex().unwrap();
        assert!(re.is_match("xbx"));
    }
}
