use actix_web::{get, web, HttpRequest, HttpResponse};

use crate::auth;
use crate::error::ApiError;
use crate::response;
use crate::views;
use crate::AppState;

#[get("/stats")]
pub async fn channel_stats(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let stats = views::channel_stats(state.store.as_ref(), claims.sub).await?;
    Ok(response::ok(stats, "Channel stats fetched"))
}

#[get("/videos")]
pub async fn channel_videos(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let videos = state.store.videos_by_owner(claims.sub).await?;
    let items = views::video_list_items(state.store.as_ref(), videos, Some(claims.sub)).await?;
    Ok(response::ok(items, "Channel videos fetched"))
}
