use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Comment, Like, LikeTarget, Playlist, Subscription, Tweet, User, Video};

pub mod memory;
pub mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
    /// Unique-constraint violation; the offending entity kind is carried so
    /// the API layer can phrase the conflict.
    #[error("duplicate {0}")]
    Duplicate(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = e {
            if db.code().as_deref() == Some("23505") {
                return StoreError::Duplicate("record".to_string());
            }
        }
        StoreError::Database(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSortKey {
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSortKey {
    pub fn parse(raw: Option<&str>) -> Option<VideoSortKey> {
        match raw? {
            "createdAt" | "created_at" => Some(VideoSortKey::CreatedAt),
            "views" => Some(VideoSortKey::Views),
            "duration" => Some(VideoSortKey::Duration),
            "title" => Some(VideoSortKey::Title),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct VideoFilter {
    pub owner: Option<Uuid>,
    /// Substring match against title and description.
    pub search: Option<String>,
    pub published_only: bool,
    pub sort_key: VideoSortKey,
    pub sort_direction: SortDirection,
}

impl Default for VideoFilter {
    fn default() -> Self {
        VideoFilter {
            owner: None,
            search: None,
            published_only: true,
            sort_key: VideoSortKey::CreatedAt,
            sort_direction: SortDirection::Desc,
        }
    }
}

/// Entity store: per-entity reads and writes only. Join logic and derived
/// fields live in the view assembler, keeping this trait independent of any
/// particular backend's query language. Implementations return listings in
/// well-defined orders (newest first unless noted) and preserve the stored
/// order of watch-history and playlist id lists.
#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Full-row update of every mutable user column.
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;
    /// Append-if-absent; existing entries keep their position.
    async fn append_watch_history(&self, user_id: Uuid, video_id: Uuid) -> Result<(), StoreError>;

    // videos
    async fn insert_video(&self, video: &Video) -> Result<(), StoreError>;
    async fn video_by_id(&self, id: Uuid) -> Result<Option<Video>, StoreError>;
    async fn update_video(&self, video: &Video) -> Result<(), StoreError>;
    async fn delete_video(&self, id: Uuid) -> Result<(), StoreError>;
    async fn list_videos(&self, filter: &VideoFilter) -> Result<Vec<Video>, StoreError>;
    async fn videos_by_owner(&self, owner: Uuid) -> Result<Vec<Video>, StoreError>;
    async fn increment_views(&self, id: Uuid) -> Result<(), StoreError>;

    // comments
    async fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError>;
    async fn comment_by_id(&self, id: Uuid) -> Result<Option<Comment>, StoreError>;
    async fn update_comment(&self, comment: &Comment) -> Result<(), StoreError>;
    async fn delete_comment(&self, id: Uuid) -> Result<(), StoreError>;
    async fn comments_for_video(&self, video_id: Uuid) -> Result<Vec<Comment>, StoreError>;
    async fn delete_comments_for_video(&self, video_id: Uuid) -> Result<(), StoreError>;

    // likes
    async fn find_like(
        &self,
        liked_by: Uuid,
        target: LikeTarget,
    ) -> Result<Option<Like>, StoreError>;
    async fn insert_like(&self, like: &Like) -> Result<(), StoreError>;
    async fn delete_like(&self, id: Uuid) -> Result<(), StoreError>;
    async fn likes_for_target(&self, target: LikeTarget) -> Result<Vec<Like>, StoreError>;
    /// Video ids this user has liked, most recent like first.
    async fn liked_video_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError>;
    async fn delete_likes_for_target(&self, target: LikeTarget) -> Result<(), StoreError>;

    // tweets
    async fn insert_tweet(&self, tweet: &Tweet) -> Result<(), StoreError>;
    async fn tweet_by_id(&self, id: Uuid) -> Result<Option<Tweet>, StoreError>;
    async fn update_tweet(&self, tweet: &Tweet) -> Result<(), StoreError>;
    async fn delete_tweet(&self, id: Uuid) -> Result<(), StoreError>;
    async fn tweets_by_owner(&self, owner: Uuid) -> Result<Vec<Tweet>, StoreError>;

    // playlists
    async fn insert_playlist(&self, playlist: &Playlist) -> Result<(), StoreError>;
    async fn playlist_by_id(&self, id: Uuid) -> Result<Option<Playlist>, StoreError>;
    async fn update_playlist(&self, playlist: &Playlist) -> Result<(), StoreError>;
    async fn delete_playlist(&self, id: Uuid) -> Result<(), StoreError>;
    async fn playlists_by_owner(&self, owner: Uuid) -> Result<Vec<Playlist>, StoreError>;

    // subscriptions
    async fn find_subscription(
        &self,
        subscriber: Uuid,
        channel: Uuid,
    ) -> Result<Option<Subscription>, StoreError>;
    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), StoreError>;
    async fn delete_subscription(&self, id: Uuid) -> Result<(), StoreError>;
    async fn subscribers_of(&self, channel: Uuid) -> Result<Vec<Subscription>, StoreError>;
    async fn subscriptions_of(&self, subscriber: Uuid) -> Result<Vec<Subscription>, StoreError>;
}
