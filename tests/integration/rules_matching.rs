//! Rule matching against realistic request shapes

use codeweave::context::{RequestContext, ResourceType};
use codeweave::rules::{should_inject, ConditionRule, RuleSet};

fn post(id: u64, slug: &str, title: &str, categories: &[&str]) -> RequestContext {
    RequestContext::builder()
        .singular(true)
        .resource_id(id)
        .slug(slug)
        .title(title)
        .resource_type(ResourceType::Post)
        .categories(categories.iter().copied())
        .build()
}

#[test]
fn test_mixed_rule_list() {
    let rules = "post-12, about, category-news";

    assert!(should_inject(rules, &post(12, "hello", "Hello", &[])));
    assert!(should_inject(rules, &post(3, "about", "About", &[])));
    assert!(should_inject(rules, &post(4, "launch", "Launch", &["news"])));
    assert!(!should_inject(rules, &post(5, "other", "Other", &["sports"])));
}

#[test]
fn test_title_and_bare_id_name_a_page() {
    let page = RequestContext::builder()
        .singular(true)
        .resource_id(40)
        .slug("contact-us")
        .title("Contact Us")
        .resource_type(ResourceType::Page)
        .build();

    assert!(should_inject("Contact Us", &page));
    assert!(should_inject("40", &page));
    assert!(!should_inject("41", &page));
}

#[test]
fn test_whitespace_is_trimmed_and_empty_tokens_ignored() {
    let ctx = post(9, "about", "About", &[]);
    assert!(should_inject("  ,, about  ,", &ctx));
    assert!(!should_inject(" , , ", &ctx));
}

#[test]
fn test_listing_requests_only_match_by_category_or_all() {
    let archive = RequestContext::builder()
        .singular(false)
        .resource_id(12)
        .slug("about")
        .category("news")
        .build();

    assert!(!should_inject("post-12", &archive));
    assert!(!should_inject("about", &archive));
    assert!(should_inject("category-news", &archive));
    assert!(should_inject("all", &archive));
}

#[test]
fn test_first_match_reports_winning_rule() {
    let rules = RuleSet::parse("contact, category-news, all");
    let ctx = post(2, "launch", "Launch", &["news"]);
    assert_eq!(
        rules.first_match(&ctx),
        Some(&ConditionRule::CategorySlug {
            name: "news".to_string(),
            raw: "category-news".to_string(),
        })
    );
}
