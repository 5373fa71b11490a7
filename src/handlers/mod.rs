use actix_web::{get, web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::response;

pub mod comments;
pub mod dashboard;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("invalid {} id", what)))
}

#[get("/healthcheck")]
async fn healthcheck() -> HttpResponse {
    response::ok(json!({}), "OK")
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(healthcheck)
            .service(
                web::scope("/users")
                    .service(users::register)
                    .service(users::login)
                    .service(users::logout)
                    .service(users::refresh_token)
                    .service(users::change_password)
                    .service(users::current_user)
                    .service(users::update_details)
                    .service(users::update_avatar)
                    .service(users::update_cover_image)
                    .service(users::user_channel)
                    .service(users::watch_history),
            )
            .service(
                web::scope("/videos")
                    .service(videos::list_videos)
                    .service(videos::publish_video)
                    .service(videos::get_video)
                    .service(videos::update_video)
                    .service(videos::delete_video)
                    .service(videos::toggle_publish),
            )
            .service(
                web::scope("/comments")
                    .service(comments::get_video_comments)
                    .service(comments::add_comment)
                    .service(comments::update_comment)
                    .service(comments::delete_comment),
            )
            .service(
                web::scope("/likes")
                    .service(likes::toggle_video_like)
                    .service(likes::toggle_comment_like)
                    .service(likes::toggle_tweet_like)
                    .service(likes::liked_videos),
            )
            .service(
                web::scope("/playlists")
                    .service(playlists::create_playlist)
                    .service(playlists::user_playlists)
                    .service(playlists::add_video)
                    .service(playlists::remove_video)
                    .service(playlists::get_playlist)
                    .service(playlists::update_playlist)
                    .service(playlists::delete_playlist),
            )
            .service(
                web::scope("/subscriptions")
                    .service(subscriptions::toggle_subscription)
                    .service(subscriptions::channel_subscribers)
                    .service(subscriptions::subscribed_channels),
            )
            .service(
                web::scope("/tweets")
                    .service(tweets::create_tweet)
                    .service(tweets::user_tweets)
                    .service(tweets::update_tweet)
                    .service(tweets::delete_tweet),
            )
            .service(
                web::scope("/dashboard")
                    .service(dashboard::channel_stats)
                    .service(dashboard::channel_videos),
            ),
    );
}
