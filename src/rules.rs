//! Rule matcher: decides whether global fragments apply to a request.
//!
//! Rule text is operator-authored and comma separated, e.g.
//! `all`, `post-123`, `about`, `category-news`. Matching is a logical OR over
//! the tokens. Tokens that fit no grammar are ignored rather than rejected.

use crate::context::RequestContext;
use crate::types::ResourceId;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const ALL_TOKEN: &str = "all";
const RESOURCE_PREFIX: &str = "post-";
const CATEGORY_PREFIX: &str = "category-";

/// A single parsed rule token.
///
/// Every variant keeps the token as written: besides its own criterion, each
/// token is also tried as a literal slug/title of the current resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionRule {
    All,
    ResourceId { id: ResourceId, raw: String },
    CategorySlug { name: String, raw: String },
    Slug(String),
}

impl ConditionRule {
    /// Evaluate this token against the request.
    ///
    /// Checks run in a fixed order: `all`, resource id, slug equality,
    /// named page/post lookup, category membership.
    pub fn matches(&self, ctx: &RequestContext) -> bool {
        match self {
            ConditionRule::All => true,
            ConditionRule::ResourceId { id, raw } => {
                ctx.singular_resource_id() == Some(*id) || literal_matches(raw, ctx)
            }
            ConditionRule::CategorySlug { name, raw } => {
                literal_matches(raw, ctx) || ctx.in_category(name)
            }
            ConditionRule::Slug(raw) => literal_matches(raw, ctx),
        }
    }

    /// The token as written in the rule text.
    pub fn as_token(&self) -> &str {
        match self {
            ConditionRule::All => ALL_TOKEN,
            ConditionRule::ResourceId { raw, .. } => raw,
            ConditionRule::CategorySlug { raw, .. } => raw,
            ConditionRule::Slug(raw) => raw,
        }
    }
}

impl FromStr for ConditionRule {
    type Err = Infallible;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token == ALL_TOKEN {
            return Ok(ConditionRule::All);
        }

        if let Some(suffix) = token.strip_prefix(RESOURCE_PREFIX) {
            if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(id) = suffix.parse::<ResourceId>() {
                    return Ok(ConditionRule::ResourceId {
                        id,
                        raw: token.to_string(),
                    });
                }
            }
            debug!(token, "Resource rule without a numeric id, treating as literal");
        }

        if let Some(name) = token.strip_prefix(CATEGORY_PREFIX) {
            if !name.is_empty() {
                return Ok(ConditionRule::CategorySlug {
                    name: name.to_string(),
                    raw: token.to_string(),
                });
            }
            debug!(token, "Category rule without a name, treating as literal");
        }

        Ok(ConditionRule::Slug(token.to_string()))
    }
}

impl fmt::Display for ConditionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Slug equality, then the named page/post lookup (slug, title, or id).
fn literal_matches(token: &str, ctx: &RequestContext) -> bool {
    if ctx.is_singular() && ctx.resource_slug() == Some(token) {
        return true;
    }
    names_current_page_or_post(token, ctx)
}

fn names_current_page_or_post(token: &str, ctx: &RequestContext) -> bool {
    if !ctx.is_page_or_post() {
        return false;
    }
    if ctx.resource_slug() == Some(token) || ctx.resource_title() == Some(token) {
        return true;
    }
    match (token.parse::<ResourceId>(), ctx.resource_id()) {
        (Ok(named), Some(current)) => named == current,
        _ => false,
    }
}

/// Ordered sequence of rules parsed from one rule string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<ConditionRule>,
}

impl RuleSet {
    /// Split on commas, trim, drop empty tokens, classify the rest.
    pub fn parse(text: &str) -> Self {
        let rules = text
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| match token.parse::<ConditionRule>() {
                Ok(rule) => rule,
                Err(never) => match never {},
            })
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[ConditionRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// First rule satisfied by the request, if any. Admin requests never match.
    pub fn first_match(&self, ctx: &RequestContext) -> Option<&ConditionRule> {
        if ctx.is_admin() {
            return None;
        }
        self.rules.iter().find(|rule| rule.matches(ctx))
    }

    pub fn matches(&self, ctx: &RequestContext) -> bool {
        self.first_match(ctx).is_some()
    }
}

/// Rule gate for global fragments.
pub fn should_inject(rules_text: &str, ctx: &RequestContext) -> bool {
    if ctx.is_admin() {
        debug!("Admin request, skipping injection");
        return false;
    }
    let rules = RuleSet::parse(rules_text);
    match rules.first_match(ctx) {
        Some(rule) => {
            debug!(rule = %rule, "Condition rule matched");
            true
        }
        None => {
            debug!(rules = rules.len(), "No condition rule matched");
            false
        }
    }
}
