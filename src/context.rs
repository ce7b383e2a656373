//! Request context: the per-request facts the rule matcher and scripts see.
//!
//! Built fresh by the host for every request and never mutated afterwards.

use crate::types::ResourceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Content type of the current singular resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Page,
    Post,
    /// Any other singular content type, such as attachments.
    ///
    /// Rules match an `Other` resource by its slug only, never by title or
    /// bare id. Hosts that want custom post types looked up by title or id
    /// should report them as [`ResourceType::Post`].
    Other,
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "page" => Ok(ResourceType::Page),
            "post" => Ok(ResourceType::Post),
            "other" => Ok(ResourceType::Other),
            other => Err(format!(
                "Invalid resource type: {} (must be 'page', 'post', or 'other')",
                other
            )),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceType::Page => "page",
            ResourceType::Post => "post",
            ResourceType::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    is_admin: bool,
    is_singular: bool,
    resource_id: Option<ResourceId>,
    resource_slug: Option<String>,
    resource_title: Option<String>,
    resource_type: Option<ResourceType>,
    category_slugs: BTreeSet<String>,
}

impl RequestContext {
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// A front-end request that is not for a single resource (home, archives).
    pub fn front_end() -> Self {
        Self::default()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn is_singular(&self) -> bool {
        self.is_singular
    }

    pub fn resource_id(&self) -> Option<ResourceId> {
        self.resource_id
    }

    pub fn resource_slug(&self) -> Option<&str> {
        self.resource_slug.as_deref()
    }

    pub fn resource_title(&self) -> Option<&str> {
        self.resource_title.as_deref()
    }

    pub fn resource_type(&self) -> Option<ResourceType> {
        self.resource_type
    }

    pub fn category_slugs(&self) -> &BTreeSet<String> {
        &self.category_slugs
    }

    pub fn in_category(&self, slug: &str) -> bool {
        self.category_slugs.contains(slug)
    }

    /// Resource id of the current request, only when it is singular.
    pub fn singular_resource_id(&self) -> Option<ResourceId> {
        if self.is_singular {
            self.resource_id
        } else {
            None
        }
    }

    /// Whether the current resource is a page or post (the named-resource lookup target).
    pub fn is_page_or_post(&self) -> bool {
        self.is_singular
            && matches!(
                self.resource_type,
                Some(ResourceType::Page) | Some(ResourceType::Post)
            )
    }
}

/// Builder for [`RequestContext`]; the host fills in what its routing knows.
#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    ctx: RequestContext,
}

impl RequestContextBuilder {
    pub fn admin(mut self, is_admin: bool) -> Self {
        self.ctx.is_admin = is_admin;
        self
    }

    pub fn singular(mut self, is_singular: bool) -> Self {
        self.ctx.is_singular = is_singular;
        self
    }

    pub fn resource_id(mut self, id: ResourceId) -> Self {
        self.ctx.resource_id = Some(id);
        self
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.ctx.resource_slug = Some(slug.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.ctx.resource_title = Some(title.into());
        self
    }

    pub fn resource_type(mut self, resource_type: ResourceType) -> Self {
        self.ctx.resource_type = Some(resource_type);
        self
    }

    pub fn category(mut self, slug: impl Into<String>) -> Self {
        self.ctx.category_slugs.insert(slug.into());
        self
    }

    pub fn categories<I, S>(mut self, slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ctx
            .category_slugs
            .extend(slugs.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> RequestContext {
        self.ctx
    }
}
