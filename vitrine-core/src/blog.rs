//! Blog posts, taxonomy and threaded comments

use crate::content::{resolve_slug, trimmed};
use crate::enums::{CommentStatus, PublishStatus};
use crate::error::ValidationErrors;
use crate::query::{FilterField, ListConfig, SortOrder};
use crate::table::{Record, Table};
use crate::validation::{serialize_patch, HasUpdates, Validate, Validator};
use crate::{new_entity_id, EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

const WORDS_PER_MINUTE: usize = 200;

/// Estimated reading time, at least one minute.
pub fn reading_time_minutes(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).clamp(1, i32::MAX as usize) as i32
}

// ============================================================================
// POST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BlogPost {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub author_name: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub category_id: Option<EntityId>,
    /// Tag slugs.
    #[serde(default)]
    pub tags: Vec<String>,
    pub featured: bool,
    pub status: PublishStatus,
    pub view_count: i64,
    pub reading_time_minutes: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub published_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Record for BlogPost {
    const TABLE: Table = Table::BlogPosts;
    const ENTITY_NAME: &'static str = "Blog post";
}

impl BlogPost {
    /// `category` (a category slug) is resolved by the caller into `category_id`.
    pub const LIST: ListConfig = ListConfig {
        sortable: &["published_at", "created_at", "title", "view_count"],
        filters: &[
            FilterField::bool("featured", "featured"),
            FilterField::tag("tag", "tags"),
            FilterField::text("author", "author_name"),
            FilterField::uuid("category_id", "category_id"),
        ],
        searchable: &["title", "excerpt", "content"],
        paginate: true,
        default_sort: "published_at",
        default_order: SortOrder::Desc,
    };

    pub const ADMIN_LIST: ListConfig = ListConfig {
        filters: &[
            FilterField::bool("featured", "featured"),
            FilterField::tag("tag", "tags"),
            FilterField::text("author", "author_name"),
            FilterField::uuid("category_id", "category_id"),
            FilterField::text("status", "status"),
        ],
        ..Self::LIST
    };

    pub fn from_request(req: CreateBlogPostRequest, now: Timestamp) -> Self {
        let status = req.status.unwrap_or_default();
        let published_at = match status {
            PublishStatus::Published => req.published_at.or(Some(now)),
            _ => req.published_at,
        };
        let content = req.content.trim().to_string();
        Self {
            id: new_entity_id(),
            slug: resolve_slug(req.slug.as_deref(), &req.title),
            title: req.title.trim().to_string(),
            excerpt: trimmed(req.excerpt),
            reading_time_minutes: reading_time_minutes(&content),
            content,
            cover_image: trimmed(req.cover_image),
            author_name: req.author_name.trim().to_string(),
            category_id: req.category_id,
            tags: req.tags.iter().map(|t| t.trim().to_lowercase()).collect(),
            featured: req.featured,
            status,
            view_count: 0,
            published_at,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateBlogPostRequest {
    pub slug: Option<String>,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub author_name: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub category_id: Option<EntityId>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    pub status: Option<PublishStatus>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub published_at: Option<Timestamp>,
}

impl Validate for CreateBlogPostRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("title", "Title", &self.title, 2, 200)
            .text("content", "Content", &self.content, 1, 100_000)
            .text("author_name", "Author name", &self.author_name, 1, 100)
            .optional_slug("slug", self.slug.as_deref())
            .check(
                !resolve_slug(self.slug.as_deref(), &self.title).is_empty(),
                "slug",
                "Slug could not be derived from the title",
            )
            .optional_text("excerpt", "Excerpt", self.excerpt.as_deref(), 500)
            .optional_url("cover_image", "Cover image", self.cover_image.as_deref())
            .each_non_empty("tags", "Tag", &self.tags);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateBlogPostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PublishStatus>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
}

impl HasUpdates for UpdateBlogPostRequest {
    /// Content changes also refresh the stored reading time.
    fn to_patch(&self) -> Map<String, Value> {
        let mut patch = serialize_patch(self);
        if let Some(content) = &self.content {
            patch.insert(
                "reading_time_minutes".to_string(),
                Value::from(reading_time_minutes(content)),
            );
        }
        patch
    }
}

impl Validate for UpdateBlogPostRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        if let Some(title) = &self.title {
            v.text("title", "Title", title, 2, 200);
        }
        if let Some(content) = &self.content {
            v.text("content", "Content", content, 1, 100_000);
        }
        if let Some(author_name) = &self.author_name {
            v.text("author_name", "Author name", author_name, 1, 100);
        }
        if let Some(tags) = &self.tags {
            v.each_non_empty("tags", "Tag", tags);
        }
        v.optional_slug("slug", self.slug.as_deref())
            .optional_text("excerpt", "Excerpt", self.excerpt.as_deref(), 500)
            .optional_url("cover_image", "Cover image", self.cover_image.as_deref());
        v.finish()
    }
}

// ============================================================================
// TAXONOMY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Category {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Record for Category {
    const TABLE: Table = Table::BlogCategories;
    const ENTITY_NAME: &'static str = "Category";
}

impl Category {
    pub const LIST: ListConfig = ListConfig {
        sortable: &["name", "created_at"],
        filters: &[],
        searchable: &[],
        paginate: false,
        default_sort: "name",
        default_order: SortOrder::Asc,
    };

    pub fn from_request(req: CreateCategoryRequest, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            slug: resolve_slug(req.slug.as_deref(), &req.name),
            name: req.name.trim().to_string(),
            description: trimmed(req.description),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateCategoryRequest {
    pub slug: Option<String>,
    pub name: String,
    pub description: Option<String>,
}

impl Validate for CreateCategoryRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("name", "Name", &self.name, 1, 100)
            .optional_slug("slug", self.slug.as_deref())
            .check(
                !resolve_slug(self.slug.as_deref(), &self.name).is_empty(),
                "slug",
                "Slug could not be derived from the name",
            )
            .optional_text("description", "Description", self.description.as_deref(), 1_000);
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Tag {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub slug: String,
    pub name: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Record for Tag {
    const TABLE: Table = Table::BlogTags;
    const ENTITY_NAME: &'static str = "Tag";
}

impl Tag {
    pub const LIST: ListConfig = ListConfig {
        sortable: &["name", "created_at"],
        filters: &[],
        searchable: &[],
        paginate: false,
        default_sort: "name",
        default_order: SortOrder::Asc,
    };

    pub fn from_request(req: CreateTagRequest, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            slug: resolve_slug(req.slug.as_deref(), &req.name),
            name: req.name.trim().to_string(),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateTagRequest {
    pub slug: Option<String>,
    pub name: String,
}

impl Validate for CreateTagRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("name", "Name", &self.name, 1, 50)
            .optional_slug("slug", self.slug.as_deref())
            .check(
                !resolve_slug(self.slug.as_deref(), &self.name).is_empty(),
                "slug",
                "Slug could not be derived from the name",
            );
        v.finish()
    }
}

// ============================================================================
// COMMENTS
// ============================================================================

/// A reader comment. Replies point at their parent through `parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Comment {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub post_id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub parent_id: Option<EntityId>,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    pub status: CommentStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Record for Comment {
    const TABLE: Table = Table::Comments;
    const ENTITY_NAME: &'static str = "Comment";
}

impl Comment {
    pub const ADMIN_LIST: ListConfig = ListConfig {
        sortable: &["created_at"],
        filters: &[
            FilterField::text("status", "status"),
            FilterField::uuid("post", "post_id"),
        ],
        searchable: &["author_name", "author_email", "content"],
        paginate: true,
        default_sort: "created_at",
        default_order: SortOrder::Desc,
    };

    pub fn from_request(req: CreateCommentRequest, post_id: EntityId, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            post_id,
            parent_id: req.parent_id,
            author_name: req.author_name.trim().to_string(),
            author_email: req.author_email.trim().to_lowercase(),
            content: req.content.trim().to_string(),
            status: CommentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateCommentRequest {
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub parent_id: Option<EntityId>,
}

impl Validate for CreateCommentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("author_name", "Name", &self.author_name, 1, 100)
            .email("author_email", &self.author_email)
            .text("content", "Comment", &self.content, 2, 2_000);
        v.finish()
    }
}

/// Moderation update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateCommentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CommentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl HasUpdates for UpdateCommentRequest {}

impl Validate for UpdateCommentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        if let Some(content) = &self.content {
            v.text("content", "Comment", content, 2, 2_000);
        }
        v.finish()
    }
}

/// Public view of a comment with its replies nested beneath it. The author's
/// email is never exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CommentNode {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub parent_id: Option<EntityId>,
    pub author_name: String,
    pub content: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(no_recursion))]
    pub replies: Vec<CommentNode>,
}

/// Arrange comments into reply trees ordered oldest first.
///
/// A comment whose parent is absent from `comments` (for example, not yet
/// approved) becomes a root. Comments caught in a parent cycle are dropped.
pub fn build_thread(mut comments: Vec<Comment>) -> Vec<CommentNode> {
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let ids: HashSet<EntityId> = comments.iter().map(|c| c.id).collect();
    let mut children: HashMap<EntityId, Vec<&Comment>> = HashMap::new();
    let mut roots = Vec::new();
    for comment in &comments {
        match comment.parent_id {
            Some(parent) if parent != comment.id && ids.contains(&parent) => {
                children.entry(parent).or_default().push(comment);
            }
            _ => roots.push(comment),
        }
    }

    let mut visited = HashSet::new();
    roots
        .into_iter()
        .filter_map(|root| attach(root, &children, &mut visited))
        .collect()
}

fn attach(
    comment: &Comment,
    children: &HashMap<EntityId, Vec<&Comment>>,
    visited: &mut HashSet<EntityId>,
) -> Option<CommentNode> {
    if !visited.insert(comment.id) {
        return None;
    }
    let replies = children
        .get(&comment.id)
        .map(|kids| {
            kids.iter()
                .filter_map(|kid| attach(kid, children, visited))
                .collect()
        })
        .unwrap_or_default();
    Some(CommentNode {
        id: comment.id,
        parent_id: comment.parent_id,
        author_name: comment.author_name.clone(),
        content: comment.content.clone(),
        created_at: comment.created_at,
        replies,
    })
}
