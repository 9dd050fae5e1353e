use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use quill_db::queries::NewComment;
use quill_types::api::{
    CommentListResponse, CommentResponse, CreateCommentRequest, SetCommentStatusRequest,
    UpdateCommentRequest,
};
use quill_types::models::CommentStatus;

use crate::auth::AppState;
use crate::convert::comment_response;
use crate::error::{ApiError, field};
use crate::policy::{Action, Actor, Resource};
use crate::posts::{PageQuery, default_page, page_window, total_pages};

const CONTENT_MAX: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_admin_limit")]
    pub limit: u32,
    pub status: Option<CommentStatus>,
}

fn default_admin_limit() -> u32 {
    20
}

fn validate_content(content: &str) -> Result<String, ApiError> {
    let content = content.trim().to_string();
    let mut errors = Vec::new();
    if content.is_empty() {
        errors.push(field("content", "comment content is required"));
    } else if content.chars().count() > CONTENT_MAX {
        errors.push(field("content", "comment must be at most 1000 characters"));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok(content)
}

/// Approved roots (newest first) carrying their approved replies (oldest
/// first).
pub async fn list_for_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit, offset) = page_window(query.page, query.limit);

    let db = state.clone();
    let pid = post_id.to_string();
    let (roots, replies, total) = tokio::task::spawn_blocking(move || {
        let (roots, total) = db
            .db
            .list_root_comments(&pid, limit, offset)
            .map_err(ApiError::from)?;

        let root_ids: Vec<String> = roots.iter().map(|r| r.id.clone()).collect();
        let replies = db.db.list_replies(&root_ids).map_err(ApiError::from)?;

        Ok::<_, ApiError>((roots, replies, total))
    })
    .await??;

    // Group replies under their roots (cheap in-memory work, fine on the
    // async thread).
    let mut reply_map: HashMap<String, Vec<CommentResponse>> = HashMap::new();
    for reply in replies {
        let parent = reply.parent_comment_id.clone().unwrap_or_default();
        reply_map
            .entry(parent)
            .or_default()
            .push(comment_response(reply, Vec::new()));
    }

    let comments: Vec<CommentResponse> = roots
        .into_iter()
        .map(|root| {
            let replies = reply_map.remove(&root.id).unwrap_or_default();
            comment_response(root, replies)
        })
        .collect();

    Ok(Json(CommentListResponse {
        comments,
        total,
        total_pages: total_pages(total, limit),
        current_page: page as u64,
    }))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    actor.require(
        Action::Create,
        &Resource::Comment {
            author_id: None,
            status: None,
        },
    )?;
    let Some(author_id) = actor.id() else {
        return Err(ApiError::Forbidden);
    };

    let content = validate_content(&req.content)?;

    let author_id = author_id.to_string();
    let post_id = req.post_id.to_string();
    let parent_id = req.parent_comment_id.map(|p| p.to_string());
    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        if db
            .db
            .get_post_by_id(&post_id)
            .map_err(ApiError::from)?
            .is_none()
        {
            return Err(ApiError::NotFound("post"));
        }

        // Exactly one nesting level is materialized: replying to a reply
        // threads under that reply's root.
        let parent_comment_id = match parent_id {
            Some(pid) => {
                let parent = db
                    .db
                    .get_comment(&pid)
                    .map_err(ApiError::from)?
                    .ok_or(ApiError::NotFound("parent comment"))?;
                Some(parent.parent_comment_id.unwrap_or(parent.id))
            }
            None => None,
        };

        // A duplicate (author, post, content) insert fails on the unique
        // index and surfaces as Conflict.
        db.db
            .create_comment(&NewComment {
                id: &id,
                content: &content,
                author_id: &author_id,
                post_id: &post_id,
                parent_comment_id: parent_comment_id.as_deref(),
                status: CommentStatus::Approved,
                created_at: &now,
            })
            .map_err(ApiError::from)?;

        db.db
            .get_comment(&id)
            .map_err(ApiError::from)?
            .ok_or(ApiError::NotFound("comment"))
    })
    .await??;

    Ok((StatusCode::CREATED, Json(comment_response(row, Vec::new()))))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = validate_content(&req.content)?;

    let id_str = id.to_string();
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        let existing = db
            .db
            .get_comment(&id_str)
            .map_err(ApiError::from)?
            .ok_or(ApiError::NotFound("comment"))?;

        actor.require(
            Action::Update,
            &Resource::Comment {
                author_id: existing.author_id.parse().ok(),
                status: CommentStatus::parse(&existing.status),
            },
        )?;

        let updated = db
            .db
            .update_comment_content(&id_str, &content)
            .map_err(ApiError::from)?;
        if !updated {
            return Err(ApiError::NotFound("comment"));
        }

        db.db
            .get_comment(&id_str)
            .map_err(ApiError::from)?
            .ok_or(ApiError::NotFound("comment"))
    })
    .await??;

    Ok(Json(comment_response(row, Vec::new())))
}

/// Deletes the comment and, through the storage cascade, every reply
/// threaded under it — an atomic, all-or-nothing removal.
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let id_str = id.to_string();
    let db = state.clone();
    tokio::task::spawn_blocking(move || {
        let existing = db
            .db
            .get_comment(&id_str)
            .map_err(ApiError::from)?
            .ok_or(ApiError::NotFound("comment"))?;

        actor.require(
            Action::Delete,
            &Resource::Comment {
                author_id: existing.author_id.parse().ok(),
                status: CommentStatus::parse(&existing.status),
            },
        )?;

        let deleted = db
            .db
            .delete_comment_cascade(&id_str)
            .map_err(ApiError::from)?;
        if !deleted {
            return Err(ApiError::NotFound("comment"));
        }
        Ok::<_, ApiError>(())
    })
    .await??;

    Ok(Json(serde_json::json!({ "message": "comment deleted" })))
}

/// The moderation queue: all statuses, optionally filtered, paginated.
pub async fn list_admin(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    actor.require(
        Action::Read,
        &Resource::Comment {
            author_id: None,
            status: None,
        },
    )?;

    let (page, limit, offset) = page_window(query.page, query.limit);

    let db = state.clone();
    let (rows, total) = tokio::task::spawn_blocking(move || {
        db.db
            .list_comments_admin(query.status, limit, offset)
            .map_err(ApiError::from)
    })
    .await??;

    Ok(Json(CommentListResponse {
        comments: rows
            .into_iter()
            .map(|row| comment_response(row, Vec::new()))
            .collect(),
        total,
        total_pages: total_pages(total, limit),
        current_page: page as u64,
    }))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<SetCommentStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Any status may move to any other; the gate is the only constraint.
    actor.require(
        Action::Moderate,
        &Resource::Comment {
            author_id: None,
            status: None,
        },
    )?;

    let id_str = id.to_string();
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        if !db
            .db
            .set_comment_status(&id_str, req.status)
            .map_err(ApiError::from)?
        {
            return Err(ApiError::NotFound("comment"));
        }

        db.db
            .get_comment(&id_str)
            .map_err(ApiError::from)?
            .ok_or(ApiError::NotFound("comment"))
    })
    .await??;

    Ok(Json(comment_response(row, Vec::new())))
}
