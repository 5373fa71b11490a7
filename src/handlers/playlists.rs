use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::auth;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::models::{CreatePlaylistRequest, Playlist, UpdatePlaylistRequest};
use crate::ownership::ensure_owner;
use crate::response;
use crate::views;
use crate::AppState;

#[post("")]
pub async fn create_playlist(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreatePlaylistRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let body = body.into_inner();
    if body.name.trim().is_empty() {
        return Err(ApiError::bad_request("playlist name is required"));
    }

    let playlist = Playlist {
        id: Uuid::new_v4(),
        name: body.name.trim().to_string(),
        description: body.description.unwrap_or_default().trim().to_string(),
        owner: claims.sub,
        videos: Vec::new(),
        created_at: Utc::now().naive_utc(),
    };
    state.store.insert_playlist(&playlist).await?;
    Ok(response::created(playlist, "Playlist created successfully"))
}

#[get("/user/{user_id}")]
pub async fn user_playlists(
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

    let playlists = state.store.playlists_by_owner(user_id).await?;
    let mut details = Vec::with_capacity(playlists.len());
    for playlist in &playlists {
        details.push(views::playlist_detail(state.store.as_ref(), playlist, viewer).await?);
    }
    Ok(response::ok(details, "User playlists fetched"))
}

#[get("/{playlist_id}")]
pub async fn get_playlist(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let playlist_id = parse_id(&path.into_inner(), "playlist")?;
    let viewer = auth::authenticate_opt(&req, &state.auth).map(|c| c.sub);

    let playlist = state
        .store
        .playlist_by_id(playlist_id)
        .await?
        .ok_or_else(|| ApiError::not_found("playlist not found"))?;
    let detail = views::playlist_detail(state.store.as_ref(), &playlist, viewer).await?;
    Ok(response::ok(detail, "Playlist fetched successfully"))
}

#[patch("/add/{video_id}/{playlist_id}")]
pub async fn add_video(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let (raw_video, raw_playlist) = path.into_inner();
    let video_id = parse_id(&raw_video, "video")?;
    let playlist_id = parse_id(&raw_playlist, "playlist")?;

    let playlist = state
        .store
        .playlist_by_id(playlist_id)
        .await?
        .ok_or_else(|| ApiError::not_found("playlist not found"))?;
    ensure_owner(playlist.owner, claims.sub, "playlist")?;

    state
        .store
        .video_by_id(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("video not found"))?;

    let mut updated = playlist;
    updated.videos.push(video_id);
    state.store.update_playlist(&updated).await?;
    Ok(response::ok(updated, "Video added to playlist"))
}

#[patch("/remove/{video_id}/{playlist_id}")]
pub async fn remove_video(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let (raw_video, raw_playlist) = path.into_inner();
    let video_id = parse_id(&raw_video, "video")?;
    let playlist_id = parse_id(&raw_playlist, "playlist")?;

    let playlist = state
        .store
        .playlist_by_id(playlist_id)
        .await?
        .ok_or_else(|| ApiError::not_found("playlist not found"))?;
    ensure_owner(playlist.owner, claims.sub, "playlist")?;

    // Removes every occurrence of the video.
    let mut updated = playlist;
    updated.videos.retain(|v| *v != video_id);
    state.store.update_playlist(&updated).await?;
    Ok(response::ok(updated, "Video removed from playlist"))
}

#[patch("/{playlist_id}")]
pub async fn update_playlist(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdatePlaylistRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let playlist_id = parse_id(&path.into_inner(), "playlist")?;
    let body = body.into_inner();
    if body.name.is_none() && body.description.is_none() {
        return Err(ApiError::bad_request("nothing to update"));
    }

    let playlist = state
        .store
        .playlist_by_id(playlist_id)
        .await?
        .ok_or_else(|| ApiError::not_found("playlist not found"))?;
    ensure_owner(playlist.owner, claims.sub, "playlist")?;

    let mut updated = playlist;
    if let Some(name) = body.name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("playlist name cannot be blank"));
        }
        updated.name = name.trim().to_string();
    }
    if let Some(description) = body.description {
        updated.description = description.trim().to_string();
    }
    state.store.update_playlist(&updated).await?;
    Ok(response::ok(updated, "Playlist updated successfully"))
}

#[delete("/{playlist_id}")]
pub async fn delete_playlist(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let playlist_id = parse_id(&path.into_inner(), "playlist")?;

    let playlist = state
        .store
        .playlist_by_id(playlist_id)
        .await?
        .ok_or_else(|| ApiError::not_found("playlist not found"))?;
    ensure_owner(playlist.owner, claims.sub, "playlist")?;

    state.store.delete_playlist(playlist_id).await?;
    Ok(response::ok(json!({}), "Playlist deleted successfully"))
}
