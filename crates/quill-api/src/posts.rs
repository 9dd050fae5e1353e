use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use quill_db::queries::{NewPost, PostFilter, PostSort, UpdatedPost};
use quill_types::api::{
    CategoryPostsResponse, CreatePostRequest, PostListResponse, UpdatePostRequest,
};
use quill_types::models::PostStatus;

use crate::auth::AppState;
use crate::convert::{category_response, post_response, split_tags};
use crate::error::{ApiError, field};
use crate::policy::{Action, Actor, Resource};
use crate::slug::slugify;

const TITLE_MAX: usize = 200;
const EXCERPT_MAX: usize = 300;
/// Prefix length used when the excerpt is derived from content.
const EXCERPT_DERIVE_LEN: usize = 150;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

pub(crate) fn default_page() -> u32 {
    1
}

pub(crate) fn default_limit() -> u32 {
    10
}

pub(crate) fn page_window(page: u32, limit: u32) -> (u32, u32, u32) {
    let page = page.max(1);
    let limit = limit.clamp(1, 100);
    (page, limit, (page - 1) * limit)
}

pub(crate) fn total_pages(total: u64, limit: u32) -> u64 {
    total.div_ceil(limit as u64)
}

fn derive_excerpt(content: &str) -> String {
    let prefix: String = content.chars().take(EXCERPT_DERIVE_LEN).collect();
    format!("{}...", prefix)
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let status_param = query
        .status
        .clone()
        .unwrap_or_else(|| "published".to_string());
    let status_filter = (status_param != "all").then_some(status_param);

    // A listing that exposes non-published posts is an admin read.
    if status_filter.as_deref() != Some("published") {
        actor.require(Action::Read, &Resource::Post { status: None })?;
    }

    let (page, limit, offset) = page_window(query.page, query.limit);
    let sort = query
        .sort_by
        .as_deref()
        .and_then(PostSort::parse)
        .unwrap_or(PostSort::CreatedAt);
    let descending = query.sort_order.as_deref() != Some("asc");

    let db = state.clone();
    let (rows, total) = tokio::task::spawn_blocking(move || {
        // Category filter resolves the slug to an id first; an unknown
        // slug matches nothing.
        let category_id = match &query.category {
            Some(slug) => match db.db.get_category_by_slug(slug).map_err(ApiError::from)? {
                Some(c) => Some(c.id),
                None => return Ok::<_, ApiError>((Vec::new(), 0)),
            },
            None => None,
        };

        db.db
            .list_posts(&PostFilter {
                search: query.search.as_deref(),
                category_id: category_id.as_deref(),
                status: status_filter.as_deref(),
                sort,
                descending,
                limit,
                offset,
            })
            .map_err(ApiError::from)
    })
    .await??;

    Ok(Json(PostListResponse {
        posts: rows.into_iter().map(post_response).collect(),
        total,
        total_pages: total_pages(total, limit),
        current_page: page as u64,
    }))
}

/// Fetch a single post by slug. The one read that counts: `views` is
/// bumped after the policy gate, and the response reflects the bump.
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        db.db.get_post_by_slug(&slug).map_err(ApiError::from)
    })
    .await??
    .ok_or(ApiError::NotFound("post"))?;

    let status = PostStatus::parse(&row.status).unwrap_or(PostStatus::Draft);
    actor.require(Action::Read, &Resource::Post { status: Some(status) })?;

    let db = state.clone();
    let id = row.id.clone();
    tokio::task::spawn_blocking(move || db.db.increment_views(&id).map_err(ApiError::from))
        .await??;

    let mut response = post_response(row);
    response.views += 1;
    Ok(Json(response))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    actor.require(Action::Create, &Resource::Post { status: None })?;
    let Some(author_id) = actor.id() else {
        return Err(ApiError::Forbidden);
    };

    let title = req.title.trim().to_string();
    let mut errors = Vec::new();
    if title.is_empty() {
        errors.push(field("title", "title is required"));
    } else if title.chars().count() > TITLE_MAX {
        errors.push(field("title", "title must be at most 200 characters"));
    }
    if req.content.is_empty() {
        errors.push(field("content", "content is required"));
    }
    if let Some(excerpt) = &req.excerpt {
        if excerpt.chars().count() > EXCERPT_MAX {
            errors.push(field("excerpt", "excerpt must be at most 300 characters"));
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let excerpt = match &req.excerpt {
        Some(e) if !e.trim().is_empty() => e.clone(),
        _ => derive_excerpt(&req.content),
    };
    let status = req.status.unwrap_or(PostStatus::Draft);
    let tags = split_tags(req.tags.as_deref().unwrap_or("")).join(",");
    let base_slug = slugify(&title);
    let featured_image = req.featured_image.unwrap_or_default();
    let content = req.content;
    let category_id = req.category_id.to_string();
    let author_id = author_id.to_string();
    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        if db
            .db
            .get_category_by_id(&category_id)
            .map_err(ApiError::from)?
            .is_none()
        {
            return Err(ApiError::Validation(vec![field(
                "category_id",
                "invalid category",
            )]));
        }

        // Duplicate titles surface from the unique index as Conflict; the
        // slug is suffix-resolved inside create_post.
        db.db
            .create_post(&NewPost {
                id: &id,
                title: &title,
                content: &content,
                excerpt: &excerpt,
                base_slug: &base_slug,
                author_id: &author_id,
                category_id: &category_id,
                tags: &tags,
                status,
                featured_image: &featured_image,
                created_at: &now,
            })
            .map_err(ApiError::from)?;

        db.db
            .get_post_by_id(&id)
            .map_err(ApiError::from)?
            .ok_or(ApiError::NotFound("post"))
    })
    .await??;

    Ok((StatusCode::CREATED, Json(post_response(row))))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    actor.require(Action::Update, &Resource::Post { status: None })?;

    let mut errors = Vec::new();
    if let Some(title) = req.title.value() {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            errors.push(field("title", "title cannot be empty"));
        } else if trimmed.chars().count() > TITLE_MAX {
            errors.push(field("title", "title must be at most 200 characters"));
        }
    }
    if let Some(content) = req.content.value() {
        if content.is_empty() {
            errors.push(field("content", "content cannot be empty"));
        }
    }
    if let Some(excerpt) = req.excerpt.value() {
        if excerpt.chars().count() > EXCERPT_MAX {
            errors.push(field("excerpt", "excerpt must be at most 300 characters"));
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let id_str = id.to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        let existing = db
            .db
            .get_post_by_id(&id_str)
            .map_err(ApiError::from)?
            .ok_or(ApiError::NotFound("post"))?;

        let category_id = match req.category_id.into_value() {
            Some(cid) => {
                let cid = cid.to_string();
                if db
                    .db
                    .get_category_by_id(&cid)
                    .map_err(ApiError::from)?
                    .is_none()
                {
                    return Err(ApiError::Validation(vec![field(
                        "category_id",
                        "invalid category",
                    )]));
                }
                cid
            }
            None => existing.category_id.clone(),
        };

        let title = match req.title.into_value() {
            Some(t) => t.trim().to_string(),
            None => existing.title.clone(),
        };
        let content = req
            .content
            .into_value()
            .unwrap_or_else(|| existing.content.clone());
        // An explicit empty excerpt clears it, which re-derives from the
        // (possibly new) content. Same when no excerpt was ever set.
        let excerpt = match req.excerpt.into_value() {
            Some(e) if !e.trim().is_empty() => e,
            Some(_) => derive_excerpt(&content),
            None if existing.excerpt.is_empty() => derive_excerpt(&content),
            None => existing.excerpt.clone(),
        };
        let tags = match req.tags.into_value() {
            Some(raw) => split_tags(&raw).join(","),
            None => existing.tags.clone(),
        };
        let status = req.status.into_value().unwrap_or_else(|| {
            PostStatus::parse(&existing.status).unwrap_or(PostStatus::Draft)
        });
        // Explicit empty string clears the featured image.
        let featured_image = req
            .featured_image
            .into_value()
            .unwrap_or_else(|| existing.featured_image.clone());

        // Re-slug only when the title actually changed.
        let base_slug = (title != existing.title).then(|| slugify(&title));

        let updated = db
            .db
            .update_post(&UpdatedPost {
                id: &id_str,
                title: &title,
                content: &content,
                excerpt: &excerpt,
                category_id: &category_id,
                tags: &tags,
                status,
                featured_image: &featured_image,
                reslug: base_slug.as_deref(),
                updated_at: &now,
            })
            .map_err(ApiError::from)?;
        if !updated {
            return Err(ApiError::NotFound("post"));
        }

        db.db
            .get_post_by_id(&id_str)
            .map_err(ApiError::from)?
            .ok_or(ApiError::NotFound("post"))
    })
    .await??;

    Ok(Json(post_response(row)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    actor.require(Action::Delete, &Resource::Post { status: None })?;

    let id_str = id.to_string();
    let db = state.clone();
    let deleted =
        tokio::task::spawn_blocking(move || db.db.delete_post(&id_str).map_err(ApiError::from))
            .await??;
    if !deleted {
        return Err(ApiError::NotFound("post"));
    }

    Ok(Json(serde_json::json!({ "message": "post deleted" })))
}

/// Category-scoped listing: published posts of the category plus the
/// resolved category itself.
pub async fn list_by_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit, offset) = page_window(query.page, query.limit);

    let db = state.clone();
    let (category, rows, total) = tokio::task::spawn_blocking(move || {
        let category = db
            .db
            .get_category_by_slug(&slug)
            .map_err(ApiError::from)?
            .ok_or(ApiError::NotFound("category"))?;

        let (rows, total) = db
            .db
            .list_posts(&PostFilter {
                search: None,
                category_id: Some(&category.id),
                status: Some("published"),
                sort: PostSort::CreatedAt,
                descending: true,
                limit,
                offset,
            })
            .map_err(ApiError::from)?;

        Ok::<_, ApiError>((category, rows, total))
    })
    .await??;

    Ok(Json(CategoryPostsResponse {
        posts: rows.into_iter().map(post_response).collect(),
        category: category_response(category),
        total,
        total_pages: total_pages(total, limit),
        current_page: page as u64,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_is_first_150_chars_plus_ellipsis() {
        let content = "x".repeat(500);
        let excerpt = derive_excerpt(&content);
        assert_eq!(excerpt.len(), 153);
        assert_eq!(&excerpt[..150], &content[..150]);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn excerpt_counts_characters_not_bytes() {
        let content = "é".repeat(200);
        let excerpt = derive_excerpt(&content);
        assert_eq!(excerpt.chars().count(), 153);
    }

    #[test]
    fn short_content_still_gets_ellipsis() {
        assert_eq!(derive_excerpt("brief"), "brief...");
    }

    #[test]
    fn page_window_clamps_inputs() {
        assert_eq!(page_window(0, 10), (1, 10, 0));
        assert_eq!(page_window(3, 10), (3, 10, 20));
        assert_eq!(page_window(1, 0), (1, 1, 0));
        assert_eq!(page_window(2, 500), (2, 100, 100));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }
}
