// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use regex_fragment::{
    args, Argument, CaptureOptions, Fragment, FragmentError, NativePattern, RegexBuilder,
};

pub fn main() {
    colors();
    key_values();
}

fn colors() {
    let builder = RegexBuilder::new();
    builder
        .alias("hex", NativePattern::new("[0-9a-fA-F]"))
        .unwrap();

    let pair = |b: &RegexBuilder| -> Result<Fragment, FragmentError> {
        let pair = b.regex(args!["hex"])?;
        pair.set_quantifier("{2}");
        Ok(pair)
    };

    builder.skip(Argument::literal("#")).unwrap();
    builder.group("red", Argument::combinator(pair)).unwrap();
    builder.group("green", Argument::combinator(pair)).unwrap();
    builder.group("blue", Argument::combinator(pair)).unwrap();

    let text = "The color is #ffbb33 and the background is #bbdd99.";

    // one record per match
    let records = builder.capture(text, &CaptureOptions::default()).unwrap();
    for record in records {
        for (name, group) in record.iter() {
            println!(
                "{}: {} (ends at {}, length {})",
                name, group.value, group.index, group.length
            );
        }
    }
}

fn key_values() {
    let builder = RegexBuilder::new();
    builder.alias("word", NativePattern::new(r"\w+")).unwrap();

    // everything up to the first `;`
    let re = builder
        .compile(args!["word", Argument::literal("="), Argument::until(), Argument::literal(";")])
        .unwrap();
    println!("Source: /{}/{}", re.source(), re.flags());

    let text = "name=regex fragment;version=0.1.0;";
    for m in re.captures_iter(text) {
        println!("Found match: {}", m.get(0).unwrap().as_str());
    }
}
