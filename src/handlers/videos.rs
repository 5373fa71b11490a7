use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::info;
use serde_json::json;
use uuid::Uuid;

use crate::auth;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::models::{LikeTarget, PublishVideoRequest, UpdateVideoRequest, Video, VideoListQuery};
use crate::ownership::ensure_owner;
use crate::pagination::{paginate, PageParams};
use crate::response;
use crate::store::{SortDirection, VideoFilter, VideoSortKey};
use crate::views;
use crate::AppState;

#[get("")]
pub async fn list_videos(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<VideoListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let viewer = auth::authenticate_opt(&req, &state.auth).map(|c| c.sub);

    let owner = match &query.user_id {
        Some(raw) => Some(parse_id(raw, "user")?),
        None => None,
    };
    // Owners browsing their own channel see drafts too.
    let published_only = !(owner.is_some() && owner == viewer);
    let filter = VideoFilter {
        owner,
        search: query.query.clone().filter(|q| !q.trim().is_empty()),
        published_only,
        sort_key: VideoSortKey::parse(query.sort_by.as_deref()).unwrap_or(VideoSortKey::CreatedAt),
        sort_direction: match query.sort_type.as_deref() {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        },
    };

    let videos = state.store.list_videos(&filter).await?;
    let items = views::video_list_items(state.store.as_ref(), videos, viewer).await?;
    let page = paginate(
        items,
        PageParams::from_raw(query.page.as_deref(), query.limit.as_deref()),
    );
    Ok(response::ok(page, "Videos fetched successfully"))
}

#[post("")]
pub async fn publish_video(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<PublishVideoRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let body = body.into_inner();
    if body.title.trim().is_empty() || body.description.trim().is_empty() {
        return Err(ApiError::bad_request("title and description are required"));
    }
    if body.media_ref.trim().is_empty() {
        return Err(ApiError::bad_request("video file is required"));
    }
    if body.thumbnail_ref.trim().is_empty() {
        return Err(ApiError::bad_request("thumbnail is required"));
    }

    let video = Video {
        id: Uuid::new_v4(),
        title: body.title.trim().to_string(),
        description: body.description.trim().to_string(),
        media_ref: body.media_ref,
        thumbnail_ref: body.thumbnail_ref,
        duration: body.duration.unwrap_or(0),
        views: 0,
        is_published: true,
        owner: claims.sub,
        created_at: Utc::now().naive_utc(),
    };
    state.store.insert_video(&video).await?;
    info!("user {} published video {}", claims.sub, video.id);
    Ok(response::created(video, "Video published successfully"))
}

#[get("/{video_id}")]
pub async fn get_video(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let video_id = parse_id(&path.into_inner(), "video")?;
    let viewer = auth::authenticate_opt(&req, &state.auth).map(|c| c.sub);

    let video = state
        .store
        .video_by_id(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("video not found"))?;
    // Drafts are only visible to their owner, even by direct id.
    if !video.is_published && viewer != Some(video.owner) {
        return Err(ApiError::not_found("video not found"));
    }

    state.store.increment_views(video_id).await?;
    if let Some(viewer_id) = viewer {
        state.store.append_watch_history(viewer_id, video_id).await?;
    }

    let video = state
        .store
        .video_by_id(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("video not found"))?;
    let detail = views::video_detail(state.store.as_ref(), &video, viewer).await?;
    Ok(response::ok(detail, "Video fetched successfully"))
}

#[patch("/{video_id}")]
pub async fn update_video(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateVideoRequest>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let video_id = parse_id(&path.into_inner(), "video")?;
    let body = body.into_inner();
    if body.title.is_none() && body.description.is_none() && body.thumbnail_ref.is_none() {
        return Err(ApiError::bad_request("nothing to update"));
    }

    let video = state
        .store
        .video_by_id(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("video not found"))?;
    ensure_owner(video.owner, claims.sub, "video")?;

    // Each supplied field updates independently.
    let mut updated = video;
    if let Some(title) = body.title {
        if title.trim().is_empty() {
            return Err(ApiError::bad_request("title cannot be blank"));
        }
        updated.title = title.trim().to_string();
    }
    if let Some(description) = body.description {
        if description.trim().is_empty() {
            return Err(ApiError::bad_request("description cannot be blank"));
        }
        updated.description = description.trim().to_string();
    }
    if let Some(thumbnail_ref) = body.thumbnail_ref {
        if thumbnail_ref.trim().is_empty() {
            return Err(ApiError::bad_request("thumbnail cannot be blank"));
        }
        updated.thumbnail_ref = thumbnail_ref;
    }

    state.store.update_video(&updated).await?;
    Ok(response::ok(updated, "Video updated successfully"))
}

#[delete("/{video_id}")]
pub async fn delete_video(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let video_id = parse_id(&path.into_inner(), "video")?;

    let video = state
        .store
        .video_by_id(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("video not found"))?;
    ensure_owner(video.owner, claims.sub, "video")?;

    // Cascade: the video's likes, its comments, and those comments' likes.
    let store = state.store.as_ref();
    for comment in store.comments_for_video(video_id).await? {
        store
            .delete_likes_for_target(LikeTarget::Comment(comment.id))
            .await?;
    }
    store.delete_comments_for_video(video_id).await?;
    store
        .delete_likes_for_target(LikeTarget::Video(video_id))
        .await?;
    store.delete_video(video_id).await?;
    info!("user {} deleted video {}", claims.sub, video_id);

    Ok(response::ok(json!({}), "Video deleted successfully"))
}

#[post("/{video_id}/toggle-publish")]
pub async fn toggle_publish(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let claims = auth::authenticate(&req, &state.auth)?;
    let video_id = parse_id(&path.into_inner(), "video")?;

    let video = state
        .store
        .video_by_id(video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("video not found"))?;
    ensure_owner(video.owner, claims.sub, "video")?;

    let mut updated = video;
    updated.is_published = !updated.is_published;
    state.store.update_video(&updated).await?;
    Ok(response::ok(updated, "Publish status toggled successfully"))
}
