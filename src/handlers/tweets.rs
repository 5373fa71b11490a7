use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::auth;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::models::{ContentRequest, LikeTarget, Tweet};
use crate::ownership::ensure_owner;
use crate::response;
use crate::views;
use crate::AppState;

#[post("")]
pub async fn create_tweet(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ContentRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    if body.content.trim().is_empty() {
        return Err(ApiError::bad_request("tweet cannot be empty"));
    }

    let tweet = Tweet {
        id: Uuid::new_v4(),
        content: body.content.trim().to_string(),
        owner: claims.sub,
        created_at: Utc::now().naive_utc(),
    };
    state.store.insert_tweet(&tweet).await?;
    Ok(response::created(tweet, "Tweet created successfully"))
}

#[get("/user/{user_id}")]
pub async fn user_tweets(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_id(&path.into_inner(), "user")?;
    let viewer = auth::authenticate_opt(&req, &state.auth).map(|c| c.sub);

    state
        .store
        .user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    let tweets = state.store.tweets_by_owner(user_id).await?;
    let views = views::tweet_views(state.store.as_ref(), tweets, viewer).await?;
    Ok(response::ok(views, "User tweets fetched"))
}

#[patch("/{tweet_id}")]
pub async fn update_tweet(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<ContentRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let tweet_id = parse_id(&path.into_inner(), "tweet")?;
    if body.content.trim().is_empty() {
        return Err(ApiError::bad_request("content is required"));
    }

    let tweet = state
        .store
        .tweet_by_id(tweet_id)
        .await?
        .ok_or_else(|| ApiError::not_found("tweet not found"))?;
    ensure_owner(tweet.owner, claims.sub, "tweet")?;

    let mut updated = tweet;
    updated.content = body.content.trim().to_string();
    state.store.update_tweet(&updated).await?;
    Ok(response::ok(updated, "Tweet updated successfully"))
}

#[delete("/{tweet_id}")]
pub async fn delete_tweet(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let tweet_id = parse_id(&path.into_inner(), "tweet")?;

    let tweet = state
        .store
        .tweet_by_id(tweet_id)
        .await?
        .ok_or_else(|| ApiError::not_found("tweet not found"))?;
    ensure_owner(tweet.owner, claims.sub, "tweet")?;

    state
        .store
        .delete_likes_for_target(LikeTarget::Tweet(tweet_id))
        .await?;
    state.store.delete_tweet(tweet_id).await?;
    Ok(response::ok(json!({}), "Tweet deleted"))
}
