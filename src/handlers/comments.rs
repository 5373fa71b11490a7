use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::auth;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::models::{Comment, ContentRequest, LikeTarget, PageQuery};
use crate::ownership::ensure_owner;
use crate::pagination::{paginate, PageParams};
use crate::response;
use crate::views;
use crate::AppState;

#[get("/{video_id}")]
pub async fn get_video_comments(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let video_id = parse_id(&path.into_inner(), "video")?;
    let viewer = auth::authenticate_opt(&req, &state.auth).map(|c| c.sub);

    state
        .store
        .video_by_id(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("video not found"))?;

    let comments = state.store.comments_for_video(video_id).await?;
    let views = views::comment_views(state.store.as_ref(), comments, viewer).await?;
    let page = paginate(
        views,
        PageParams::from_raw(query.page.as_deref(), query.limit.as_deref()),
    );
    Ok(response::ok(page, "Comments fetched successfully"))
}

#[post("/{video_id}")]
pub async fn add_comment(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<ContentRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let video_id = parse_id(&path.into_inner(), "video")?;
    if body.content.trim().is_empty() {
        return Err(ApiError::bad_request("content is required"));
    }

    state
        .store
        .video_by_id(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("video not found"))?;

    let comment = Comment {
        id: Uuid::new_v4(),
        content: body.content.trim().to_string(),
        owner: claims.sub,
        video: video_id,
        created_at: Utc::now().naive_utc(),
    };
    state.store.insert_comment(&comment).await?;
    Ok(response::created(comment, "Comment added"))
}

#[patch("/{comment_id}")]
pub async fn update_comment(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<ContentRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let comment_id = parse_id(&path.into_inner(), "comment")?;
    if body.content.trim().is_empty() {
        return Err(ApiError::bad_request("content is required"));
    }

    let comment = state
        .store
        .comment_by_id(comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("comment not found"))?;
    ensure_owner(comment.owner, claims.sub, "comment")?;

    let mut updated = comment;
    updated.content = body.content.trim().to_string();
    state.store.update_comment(&updated).await?;
    Ok(response::ok(updated, "Comment updated successfully"))
}

#[delete("/{comment_id}")]
pub async fn delete_comment(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let comment_id = parse_id(&path.into_inner(), "comment")?;

    let comment = state
        .store
        .comment_by_id(comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("comment not found"))?;
    ensure_owner(comment.owner, claims.sub, "comment")?;

    state
        .store
        .delete_likes_for_target(LikeTarget::Comment(comment_id))
        .await?;
    state.store.delete_comment(comment_id).await?;
    Ok(response::ok(json!({}), "Comment deleted successfully"))
}
