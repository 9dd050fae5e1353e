use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use quill_db::foreign_key_violation;
use quill_db::models::CategoryRow;
use quill_types::api::{CreateCategoryRequest, UpdateCategoryRequest};

use crate::auth::AppState;
use crate::convert::category_response;
use crate::error::{ApiError, field};
use crate::policy::{Action, Actor, Resource};
use crate::slug::slugify;

const NAME_MAX: usize = 50;
const DESCRIPTION_MAX: usize = 200;

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows =
        tokio::task::spawn_blocking(move || db.db.list_categories().map_err(ApiError::from))
            .await??;

    Ok(Json(
        rows.into_iter().map(category_response).collect::<Vec<_>>(),
    ))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        db.db.get_category_by_slug(&slug).map_err(ApiError::from)
    })
    .await??
    .ok_or(ApiError::NotFound("category"))?;

    Ok(Json(category_response(row)))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    actor.require(Action::Create, &Resource::Category)?;

    let name = req.name.trim().to_string();
    let description = req
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let mut errors = Vec::new();
    if name.is_empty() {
        errors.push(field("name", "name is required"));
    } else if name.chars().count() > NAME_MAX {
        errors.push(field("name", "name must be at most 50 characters"));
    }
    if let Some(d) = &description {
        if d.chars().count() > DESCRIPTION_MAX {
            errors.push(field("description", "description must be at most 200 characters"));
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // Category slugs are not suffix-resolved: a collision with another
    // category's slug (or name) is a Conflict.
    let row = CategoryRow {
        id: Uuid::new_v4().to_string(),
        slug: slugify(&name),
        name,
        description,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        db.db.create_category(&row).map_err(ApiError::from)?;
        Ok::<_, ApiError>(row)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(category_response(row))))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    actor.require(Action::Update, &Resource::Category)?;

    let mut errors = Vec::new();
    if let Some(name) = req.name.value() {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            errors.push(field("name", "name cannot be empty"));
        } else if trimmed.chars().count() > NAME_MAX {
            errors.push(field("name", "name must be at most 50 characters"));
        }
    }
    if let Some(description) = req.description.value() {
        if description.chars().count() > DESCRIPTION_MAX {
            errors.push(field("description", "description must be at most 200 characters"));
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let id_str = id.to_string();
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        let existing = db
            .db
            .get_category_by_id(&id_str)
            .map_err(ApiError::from)?
            .ok_or(ApiError::NotFound("category"))?;

        let name = match req.name.into_value() {
            Some(n) => n.trim().to_string(),
            None => existing.name.clone(),
        };
        // Explicit empty description clears it; absent keeps it.
        let description = match req.description.into_value() {
            Some(d) => {
                let d = d.trim().to_string();
                (!d.is_empty()).then_some(d)
            }
            None => existing.description.clone(),
        };
        // The slug follows the name; an unrelated update leaves it alone.
        let slug = if name != existing.name {
            slugify(&name)
        } else {
            existing.slug.clone()
        };

        let updated = db
            .db
            .update_category(&id_str, &name, description.as_deref(), &slug)
            .map_err(ApiError::from)?;
        if !updated {
            return Err(ApiError::NotFound("category"));
        }

        Ok::<_, ApiError>(CategoryRow {
            id: existing.id,
            name,
            description,
            slug,
            created_at: existing.created_at,
        })
    })
    .await??;

    Ok(Json(category_response(row)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    actor.require(Action::Delete, &Resource::Category)?;

    let id_str = id.to_string();
    let db = state.clone();
    let deleted = tokio::task::spawn_blocking(move || {
        db.db.delete_category(&id_str).map_err(|e| {
            if foreign_key_violation(&e) {
                ApiError::Conflict("category still has posts".to_string())
            } else {
                ApiError::from(e)
            }
        })
    })
    .await??;
    if !deleted {
        return Err(ApiError::NotFound("category"));
    }

    Ok(Json(serde_json::json!({ "message": "category deleted" })))
}
