use actix_web::{get, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::auth;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::models::{Subscription, UserCard};
use crate::response;
use crate::AppState;

#[post("/toggle/{channel_id}")]
pub async fn toggle_subscription(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let channel_id = parse_id(&path.into_inner(), "channel")?;

    state
        .store
        .user_by_id(channel_id)
        .await?
        .ok_or_else(|| ApiError::not_found("channel not found"))?;

    let is_subscribed = match state.store.find_subscription(claims.sub, channel_id).await? {
        Some(existing) => {
            state.store.delete_subscription(existing.id).await?;
            false
        }
        None => {
            let subscription = Subscription {
                id: Uuid::new_v4(),
                subscriber: claims.sub,
                channel: channel_id,
                created_at: Utc::now().naive_utc(),
            };
            state.store.insert_subscription(&subscription).await?;
            true
        }
    };

    let message = if is_subscribed {
        "Subscribed to channel"
    } else {
        "Unsubscribed from channel"
    };
    Ok(response::ok(json!({ "isSubscribed": is_subscribed }), message))
}

#[get("/channel/{channel_id}")]
pub async fn channel_subscribers(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let channel_id = parse_id(&path.into_inner(), "channel")?;

    state
        .store
        .user_by_id(channel_id)
        .await?
        .ok_or_else(|| ApiError::not_found("channel not found"))?;

    let subscriptions = state.store.subscribers_of(channel_id).await?;
    let mut subscribers = Vec::with_capacity(subscriptions.len());
    for subscription in subscriptions {
        if let Some(user) = state.store.user_by_id(subscription.subscriber).await? {
            subscribers.push(UserCard::from(&user));
        }
    }
    Ok(response::ok(subscribers, "Channel subscribers fetched"))
}

#[get("/user/{subscriber_id}")]
pub async fn subscribed_channels(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let subscriber_id = parse_id(&path.into_inner(), "subscriber")?;

    state
        .store
        .user_by_id(subscriber_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    let subscriptions = state.store.subscriptions_of(subscriber_id).await?;
    let mut channels = Vec::with_capacity(subscriptions.len());
    for subscription in subscriptions {
        if let Some(user) = state.store.user_by_id(subscription.channel).await? {
            channels.push(UserCard::from(&user));
        }
    }
    Ok(response::ok(channels, "Subscribed channels fetched"))
}
