use actix_web::{get, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::auth;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::models::{Like, LikeTarget};
use crate::response;
use crate::store::Store;
use crate::views;
use crate::AppState;

/// Toggle semantics: absent ⇒ insert ⇒ active; present ⇒ delete ⇒
/// inactive. Returns the new state. Two racing identical toggles are
/// bounded by the store's (liked_by, target) uniqueness.
async fn toggle(store: &dyn Store, actor: Uuid, target: LikeTarget) -> Result<bool, ApiError> {
    match store.find_like(actor, target).await? {
        Some(existing) => {
            store.delete_like(existing.id).await?;
            Ok(false)
        }
        None => {
            let like = Like {
                id: Uuid::new_v4(),
                liked_by: actor,
                target,
                created_at: Utc::now().naive_utc(),
            };
            store.insert_like(&like).await?;
            Ok(true)
        }
    }
}

fn toggle_response(is_liked: bool, what: &str) -> HttpResponse {
    let message = if is_liked {
        format!("{} liked", what)
    } else {
        format!("{} like removed", what)
    };
    response::ok(json!({ "isLiked": is_liked }), &message)
}

#[post("/toggle/video/{video_id}")]
pub async fn toggle_video_like(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let video_id = parse_id(&path.into_inner(), "video")?;
    state
        .store
        .video_by_id(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("video not found"))?;

    let is_liked = toggle(state.store.as_ref(), claims.sub, LikeTarget::Video(video_id)).await?;
    Ok(toggle_response(is_liked, "Video"))
}

#[post("/toggle/comment/{comment_id}")]
pub async fn toggle_comment_like(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let comment_id = parse_id(&path.into_inner(), "comment")?;
    state
        .store
        .comment_by_id(comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("comment not found"))?;

    let is_liked = toggle(
        state.store.as_ref(),
        claims.sub,
        LikeTarget::Comment(comment_id),
    )
    .await?;
    Ok(toggle_response(is_liked, "Comment"))
}

#[post("/toggle/tweet/{tweet_id}")]
pub async fn toggle_tweet_like(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let tweet_id = parse_id(&path.into_inner(), "tweet")?;
    state
        .store
        .tweet_by_id(tweet_id)
        .await?
        .ok_or_else(|| ApiError::not_found("tweet not found"))?;

    let is_liked = toggle(state.store.as_ref(), claims.sub, LikeTarget::Tweet(tweet_id)).await?;
    Ok(toggle_response(is_liked, "Tweet"))
}

#[get("/videos")]
pub async fn liked_videos(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let videos = views::liked_videos(state.store.as_ref(), claims.sub).await?;
    Ok(response::ok(videos, "Liked videos fetched"))
}
