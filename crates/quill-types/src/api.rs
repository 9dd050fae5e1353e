use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CommentStatus, PostStatus, Role};
use crate::patch::Patch;

// -- JWT Claims --

/// JWT claims shared between token issuance (auth handlers) and request
/// authentication (middleware). Canonical definition lives here in
/// quill-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub token: String,
}

// -- Populated references --

#[derive(Debug, Clone, Serialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostRef {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
}

// -- Categories --

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
}

// -- Posts --

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub slug: String,
    pub author: AuthorRef,
    pub category: CategoryRef,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub featured_image: String,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `tags` is a raw comma-delimited string, split and trimmed on write.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub category_id: Uuid,
    pub tags: Option<String>,
    pub status: Option<PostStatus>,
    pub featured_image: Option<String>,
}

/// Partial update: omitted fields are left untouched, supplied fields
/// overwrite. An explicit empty `featured_image`/`excerpt` clears the
/// field; an explicit empty `title`/`content` is a validation error.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub content: Patch<String>,
    #[serde(default)]
    pub excerpt: Patch<String>,
    #[serde(default)]
    pub category_id: Patch<Uuid>,
    #[serde(default)]
    pub tags: Patch<String>,
    #[serde(default)]
    pub status: Patch<PostStatus>,
    #[serde(default)]
    pub featured_image: Patch<String>,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

/// Category-scoped listing also returns the resolved category.
#[derive(Debug, Serialize)]
pub struct CategoryPostsResponse {
    pub posts: Vec<PostResponse>,
    pub category: CategoryResponse,
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

// -- Comments --

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub content: String,
    pub author: AuthorRef,
    pub post: PostRef,
    pub parent_comment_id: Option<Uuid>,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
    pub replies: Vec<CommentResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub content: String,
    pub post_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetCommentStatusRequest {
    pub status: CommentStatus,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentResponse>,
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u64,
}
