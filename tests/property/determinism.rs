//! Property-based tests for rule matching and diagnostic guarantees

use codeweave::context::RequestContext;
use codeweave::markup::diagnostic_comment;
use codeweave::rules::{should_inject, RuleSet};
use proptest::prelude::*;

fn arb_context() -> impl Strategy<Value = RequestContext> {
    (
        any::<bool>(),
        proptest::option::of(0u64..50),
        proptest::option::of("[a-z]{1,8}"),
        proptest::collection::vec("[a-z]{1,6}", 0..3),
    )
        .prop_map(|(singular, id, slug, categories)| {
            let mut builder = RequestContext::builder()
                .singular(singular)
                .categories(categories);
            if let Some(id) = id {
                builder = builder.resource_id(id);
            }
            if let Some(slug) = slug {
                builder = builder.slug(slug);
            }
            builder.build()
        })
}

/// Matching is a pure function of rule text and request
#[test]
fn test_should_inject_is_deterministic() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&("[a-z0-9, -]{0,40}", arb_context()), |(rules, ctx)| {
            prop_assert_eq!(should_inject(&rules, &ctx), should_inject(&rules, &ctx));
            Ok(())
        })
        .unwrap();
}

/// Admin requests never match, whatever the rules
#[test]
fn test_admin_never_matches() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&"[a-z0-9, -]{0,40}", |rules| {
            let admin = RequestContext::builder().admin(true).singular(true).build();
            prop_assert!(!should_inject(&rules, &admin));
            let with_all = format!("all,{}", rules);
            prop_assert!(!should_inject(&with_all, &admin));
            Ok(())
        })
        .unwrap();
}

/// Blank rule text never matches; `all` always matches front-end requests
#[test]
fn test_blank_and_all_rules() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(" {0,5}", arb_context()), |(blank, ctx)| {
            prop_assert!(RuleSet::parse(&blank).is_empty());
            prop_assert!(!should_inject(&blank, &ctx));
            let with_all = format!("{},all", blank);
            prop_assert!(should_inject(&with_all, &ctx));
            Ok(())
        })
        .unwrap();
}

/// Adding a rule can only widen the match (logical OR)
#[test]
fn test_rules_are_monotonic() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &("[a-z0-9-]{1,10}", "[a-z0-9-]{1,10}", arb_context()),
            |(first, second, ctx)| {
                if should_inject(&first, &ctx) {
                    let first_second = format!("{}, {}", first, second);
                    let second_first = format!("{}, {}", second, first);
                    prop_assert!(should_inject(&first_second, &ctx));
                    prop_assert!(should_inject(&second_first, &ctx));
                }
                Ok(())
            },
        )
        .unwrap();
}

/// Diagnostic comments contain exactly one terminator
#[test]
fn test_diagnostic_comment_is_single_comment() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&any::<String>(), |message| {
            let comment = diagnostic_comment("Script error", &message);
            prop_assert!(comment.starts_with("<!-- Script error: "));
            prop_assert_eq!(comment.matches("-->").count(), 1);
            Ok(())
        })
        .unwrap();
}
