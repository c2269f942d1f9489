use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, patch, post},
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{
        Principal, Role,
        authorize::{authorize, require_role},
        session::session_guard,
    },
    db::{
        content_repo,
        entities::{comment, photo, rating},
    },
    error::{AppError, AuthError},
    services::RatingService,
    state::AppState,
};

const MAX_TAGS: usize = 5;

#[derive(Debug, Deserialize)]
pub struct CreatePhotoRequest {
    pub description: String,
    pub image_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePhotoRequest {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct SetRateRequest {
    pub value: i32,
}

#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub description: String,
    pub image_url: String,
    pub tags: Vec<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl From<photo::Model> for PhotoResponse {
    fn from(model: photo::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            description: model.description,
            image_url: model.image_url,
            tags: model.tags.0,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub photo_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl From<comment::Model> for CommentResponse {
    fn from(model: comment::Model) -> Self {
        Self {
            id: model.id,
            photo_id: model.photo_id,
            author_id: model.author_id,
            body: model.body,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RateResponse {
    pub photo_id: Uuid,
    pub rater_id: Uuid,
    pub value: i32,
}

impl From<rating::Model> for RateResponse {
    fn from(model: rating::Model) -> Self {
        Self {
            photo_id: model.photo_id,
            rater_id: model.rater_id,
            value: model.value,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    // Reads (photo, comments, average) are open to everyone; only mutation
    // needs a session. The guard is layered per method router, before the
    // GET handlers are added, so it covers the mutating methods only.
    let guard = || middleware::from_fn_with_state(state.clone(), session_guard);

    Router::new()
        .route("/photos", post(create_photo).route_layer(guard()))
        .route(
            "/photos/{photo_id}",
            patch(update_photo)
                .delete(delete_photo)
                .route_layer(guard())
                .get(get_photo),
        )
        .route(
            "/photos/{photo_id}/comments",
            post(add_comment).route_layer(guard()).get(list_comments),
        )
        .route(
            "/photos/{photo_id}/comments/{comment_id}",
            patch(edit_comment).delete(delete_comment).route_layer(guard()),
        )
        .route(
            "/photos/{photo_id}/rating",
            post(set_rate).route_layer(guard()).get(show_average),
        )
        .route(
            "/photos/{photo_id}/rating/{account_id}",
            delete(delete_rate).route_layer(guard()),
        )
        .with_state(state)
}

async fn create_photo(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(body): Json<CreatePhotoRequest>,
) -> Result<(StatusCode, Json<PhotoResponse>), AppError> {
    if body.tags.len() > MAX_TAGS {
        return Err(AppError::bad_request("Maximum 5 tags allowed"));
    }

    let photo = content_repo::create_photo(
        &state.db,
        &principal.account_id,
        &body.description,
        &body.image_url,
        &body.tags,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(photo.into())))
}

async fn get_photo(
    State(state): State<Arc<AppState>>,
    Path(photo_id): Path<Uuid>,
) -> Result<Json<PhotoResponse>, AppError> {
    let photo = content_repo::get_photo(&state.db, &photo_id)
        .await?
        .ok_or(AuthError::NotFound("Photo"))?;
    Ok(Json(photo.into()))
}

async fn update_photo(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(photo_id): Path<Uuid>,
    Json(body): Json<UpdatePhotoRequest>,
) -> Result<Json<PhotoResponse>, AppError> {
    let photo = content_repo::get_photo(&state.db, &photo_id)
        .await?
        .ok_or(AuthError::NotFound("Photo"))?;

    authorize(&principal, photo.owner_id, Role::ELEVATED)?;

    let updated =
        content_repo::update_photo_description(&state.db, &photo_id, &body.description).await?;
    Ok(Json(updated.into()))
}

async fn delete_photo(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(photo_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let photo = content_repo::get_photo(&state.db, &photo_id)
        .await?
        .ok_or(AuthError::NotFound("Photo"))?;

    authorize(&principal, photo.owner_id, Role::ELEVATED)?;

    content_repo::delete_photo(&state.db, &photo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(photo_id): Path<Uuid>,
    Json(body): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    content_repo::get_photo(&state.db, &photo_id)
        .await?
        .ok_or(AuthError::NotFound("Photo"))?;

    let comment =
        content_repo::add_comment(&state.db, &photo_id, &principal.account_id, &body.body).await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(photo_id): Path<Uuid>,
) -> Result<Json<Vec<CommentResponse>>, AppError> {
    content_repo::get_photo(&state.db, &photo_id)
        .await?
        .ok_or(AuthError::NotFound("Photo"))?;

    let comments = content_repo::list_comments(&state.db, &photo_id).await?;
    Ok(Json(comments.into_iter().map(Into::into).collect()))
}

async fn edit_comment(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path((photo_id, comment_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<CommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let comment = content_repo::get_comment(&state.db, &photo_id, &comment_id)
        .await?
        .ok_or(AuthError::NotFound("Comment"))?;

    authorize(&principal, comment.author_id, Role::ELEVATED)?;

    let updated = content_repo::update_comment(&state.db, &comment_id, &body.body).await?;
    Ok(Json(updated.into()))
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path((photo_id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    require_role(&principal, Role::ELEVATED)?;

    content_repo::get_comment(&state.db, &photo_id, &comment_id)
        .await?
        .ok_or(AuthError::NotFound("Comment"))?;

    content_repo::delete_comment(&state.db, &comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_rate(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(photo_id): Path<Uuid>,
    Json(body): Json<SetRateRequest>,
) -> Result<(StatusCode, Json<RateResponse>), AppError> {
    if !(1..=5).contains(&body.value) {
        return Err(AppError::bad_request("Rating must be between 1 and 5"));
    }

    let rating = RatingService::new(&state.db)
        .set_rate(&principal.account_id, &photo_id, body.value)
        .await?;
    Ok((StatusCode::CREATED, Json(rating.into())))
}

async fn delete_rate(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path((photo_id, account_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    require_role(&principal, Role::ELEVATED)?;

    RatingService::new(&state.db)
        .delete_rate(&photo_id, &account_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn show_average(
    State(state): State<Arc<AppState>>,
    Path(photo_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let average = RatingService::new(&state.db).average(&photo_id).await?;
    match average {
        Some(value) => Ok(Json(serde_json::json!({ "average": value }))),
        None => Err(AppError::not_found("Rating not set")),
    }
}
