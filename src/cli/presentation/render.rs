//! Render and check presentation.

use crate::context::RequestContext;
use crate::pipeline::RenderedPoint;
use crate::rules::{ConditionRule, RuleSet};

pub fn format_rendered(rendered: &RenderedPoint, show_errors: bool) -> String {
    let mut output = rendered.markup.clone();
    if show_errors && !rendered.errors.is_empty() {
        if !output.is_empty() {
            output.push_str("\n\n");
        }
        output.push_str(&format!("Errors ({}):", rendered.errors.len()));
        for error in &rendered.errors {
            output.push_str(&format!("\n  - {}", error.message));
        }
    }
    output
}

pub fn format_check_result(
    rules: &RuleSet,
    matched: Option<&ConditionRule>,
    ctx: &RequestContext,
) -> String {
    if rules.is_empty() {
        return "No condition rules set; global fragments are not injected.".to_string();
    }
    let tokens: Vec<&str> = rules.rules().iter().map(|rule| rule.as_token()).collect();
    let mut output = format!("Rules: {}\n", tokens.join(", "));
    if ctx.is_admin() {
        output.push_str("Result: skipped (admin request)");
        return output;
    }
    match matched {
        Some(rule) => output.push_str(&format!("Result: inject (matched '{}')", rule)),
        None => output.push_str("Result: skip (no rule matched)"),
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::ErrorInfo;

    #[test]
    fn test_format_rendered_hides_errors_by_default() {
        let rendered = RenderedPoint {
            markup: "<!-- Global script error: boom -->".to_string(),
            errors: vec![ErrorInfo {
                message: "boom".to_string(),
            }],
        };
        assert_eq!(
            format_rendered(&rendered, false),
            "<!-- Global script error: boom -->"
        );
        assert_eq!(
            format_rendered(&rendered, true),
            "<!-- Global script error: boom -->\n\nErrors (1):\n  - boom"
        );
    }

    #[test]
    fn test_format_check_result() {
        let rules = RuleSet::parse("post-12, about");
        let ctx = RequestContext::builder().singular(true).slug("about").build();
        let text = format_check_result(&rules, rules.first_match(&ctx), &ctx);
        assert_eq!(text, "Rules: post-12, about\nResult: inject (matched 'about')");

        let admin = RequestContext::builder().admin(true).build();
        let text = format_check_result(&rules, rules.first_match(&admin), &admin);
        assert!(text.ends_with("skipped (admin request)"));

        let empty = RuleSet::parse("");
        assert!(format_check_result(&empty, None, &ctx).starts_with("No condition rules"));
    }
}
