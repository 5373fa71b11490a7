use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::info;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{Comment, Like, LikeTarget, Playlist, Subscription, Tweet, User, Video};
use crate::store::{SortDirection, Store, StoreError, VideoFilter, VideoSortKey};

/// Postgres-backed store. Constructed once at startup and passed down as a
/// handle; runs the bundled migrations on connect.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        info!("connected to database and applied migrations");
        Ok(PgStore { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Flat row shape for likes; the tagged target union is rebuilt on read.
#[derive(sqlx::FromRow)]
struct LikeRow {
    id: Uuid,
    liked_by: Uuid,
    target_kind: String,
    target_id: Uuid,
    created_at: NaiveDateTime,
}

impl LikeRow {
    fn into_like(self) -> Result<Like, StoreError> {
        let target = LikeTarget::from_parts(&self.target_kind, self.target_id)
            .ok_or_else(|| StoreError::Database(format!("bad like target kind: {}", self.target_kind)))?;
        Ok(Like {
            id: self.id,
            liked_by: self.liked_by,
            target,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, username, email, full_name, avatar, cover_image, password, refresh_token, watch_history, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar)
        .bind(&user.cover_image)
        .bind(&user.password)
        .bind(&user.refresh_token)
        .bind(&user.watch_history)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(username) = lower($1)")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET username = $2, email = $3, full_name = $4, avatar = $5,
             cover_image = $6, password = $7, refresh_token = $8, watch_history = $9
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar)
        .bind(&user.cover_image)
        .bind(&user.password)
        .bind(&user.refresh_token)
        .bind(&user.watch_history)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_watch_history(&self, user_id: Uuid, video_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET watch_history = array_append(watch_history, $2)
             WHERE id = $1 AND NOT ($2 = ANY(watch_history))",
        )
        .bind(user_id)
        .bind(video_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_video(&self, video: &Video) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO videos (id, title, description, media_ref, thumbnail_ref, duration, views, is_published, owner, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.media_ref)
        .bind(&video.thumbnail_ref)
        .bind(video.duration)
        .bind(video.views)
        .bind(video.is_published)
        .bind(video.owner)
        .bind(video.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn video_by_id(&self, id: Uuid) -> Result<Option<Video>, StoreError> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    async fn update_video(&self, video: &Video) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE videos SET title = $2, description = $3, media_ref = $4, thumbnail_ref = $5,
             duration = $6, views = $7, is_published = $8 WHERE id = $1",
        )
        .bind(video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.media_ref)
        .bind(&video.thumbnail_ref)
        .bind(video.duration)
        .bind(video.views)
        .bind(video.is_published)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_video(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_videos(&self, filter: &VideoFilter) -> Result<Vec<Video>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM videos WHERE 1=1");
        if filter.published_only {
            qb.push(" AND is_published = TRUE");
        }
        if let Some(owner) = filter.owner {
            qb.push(" AND owner = ");
            qb.push_bind(owner);
        }
        if let Some(q) = &filter.search {
            let pattern = format!("%{}%", q);
            qb.push(" AND (title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR description ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
        let column = match filter.sort_key {
            VideoSortKey::CreatedAt => "created_at",
            VideoSortKey::Views => "views",
            VideoSortKey::Duration => "duration",
            VideoSortKey::Title => "title",
        };
        let direction = match filter.sort_direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        qb.push(format!(" ORDER BY {} {}, id {}", column, direction, direction));
        let videos = qb
            .build_query_as::<Video>()
            .fetch_all(&self.pool)
            .await?;
        Ok(videos)
    }

    async fn videos_by_owner(&self, owner: Uuid) -> Result<Vec<Video>, StoreError> {
        let videos = sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE owner = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    async fn increment_views(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO comments (id, content, owner, video, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(comment.id)
        .bind(&comment.content)
        .bind(comment.owner)
        .bind(comment.video)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn comment_by_id(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn update_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        sqlx::query("UPDATE comments SET content = $2 WHERE id = $1")
            .bind(comment.id)
            .bind(&comment.content)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn comments_for_video(&self, video_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE video = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(video_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn delete_comments_for_video(&self, video_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM comments WHERE video = $1")
            .bind(video_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_like(
        &self,
        liked_by: Uuid,
        target: LikeTarget,
    ) -> Result<Option<Like>, StoreError> {
        let row = sqlx::query_as::<_, LikeRow>(
            "SELECT * FROM likes WHERE liked_by = $1 AND target_kind = $2 AND target_id = $3",
        )
        .bind(liked_by)
        .bind(target.kind())
        .bind(target.id())
        .fetch_optional(&self.pool)
        .await?;
        row.map(LikeRow::into_like).transpose()
    }

    async fn insert_like(&self, like: &Like) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO likes (id, liked_by, target_kind, target_id, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(like.id)
        .bind(like.liked_by)
        .bind(like.target.kind())
        .bind(like.target.id())
        .bind(like.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Duplicate(_) => StoreError::Duplicate("like".to_string()),
            other => other,
        })?;
        Ok(())
    }

    async fn delete_like(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM likes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn likes_for_target(&self, target: LikeTarget) -> Result<Vec<Like>, StoreError> {
        let rows = sqlx::query_as::<_, LikeRow>(
            "SELECT * FROM likes WHERE target_kind = $1 AND target_id = $2",
        )
        .bind(target.kind())
        .bind(target.id())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LikeRow::into_like).collect()
    }

    async fn liked_video_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT target_id FROM likes WHERE liked_by = $1 AND target_kind = 'video'
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn delete_likes_for_target(&self, target: LikeTarget) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM likes WHERE target_kind = $1 AND target_id = $2")
            .bind(target.kind())
            .bind(target.id())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_tweet(&self, tweet: &Tweet) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO tweets (id, content, owner, created_at) VALUES ($1, $2, $3, $4)")
            .bind(tweet.id)
            .bind(&tweet.content)
            .bind(tweet.owner)
            .bind(tweet.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn tweet_by_id(&self, id: Uuid) -> Result<Option<Tweet>, StoreError> {
        let tweet = sqlx::query_as::<_, Tweet>("SELECT * FROM tweets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tweet)
    }

    async fn update_tweet(&self, tweet: &Tweet) -> Result<(), StoreError> {
        sqlx::query("UPDATE tweets SET content = $2 WHERE id = $1")
            .bind(tweet.id)
            .bind(&tweet.content)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_tweet(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM tweets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn tweets_by_owner(&self, owner: Uuid) -> Result<Vec<Tweet>, StoreError> {
        let tweets = sqlx::query_as::<_, Tweet>(
            "SELECT * FROM tweets WHERE owner = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(tweets)
    }

    async fn insert_playlist(&self, playlist: &Playlist) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO playlists (id, name, description, owner, videos, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(playlist.id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(playlist.owner)
        .bind(&playlist.videos)
        .bind(playlist.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn playlist_by_id(&self, id: Uuid) -> Result<Option<Playlist>, StoreError> {
        let playlist = sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(playlist)
    }

    async fn update_playlist(&self, playlist: &Playlist) -> Result<(), StoreError> {
        sqlx::query("UPDATE playlists SET name = $2, description = $3, videos = $4 WHERE id = $1")
            .bind(playlist.id)
            .bind(&playlist.name)
            .bind(&playlist.description)
            .bind(&playlist.videos)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_playlist(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM playlists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn playlists_by_owner(&self, owner: Uuid) -> Result<Vec<Playlist>, StoreError> {
        let playlists = sqlx::query_as::<_, Playlist>(
            "SELECT * FROM playlists WHERE owner = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(playlists)
    }

    async fn find_subscription(
        &self,
        subscriber: Uuid,
        channel: Uuid,
    ) -> Result<Option<Subscription>, StoreError> {
        let sub = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE subscriber = $1 AND channel = $2",
        )
        .bind(subscriber)
        .bind(channel)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sub)
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO subscriptions (id, subscriber, channel, created_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(subscription.id)
        .bind(subscription.subscriber)
        .bind(subscription.channel)
        .bind(subscription.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Duplicate(_) => StoreError::Duplicate("subscription".to_string()),
            other => other,
        })?;
        Ok(())
    }

    async fn delete_subscription(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn subscribers_of(&self, channel: Uuid) -> Result<Vec<Subscription>, StoreError> {
        let subs = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE channel = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(channel)
        .fetch_all(&self.pool)
        .await?;
        Ok(subs)
    }

    async fn subscriptions_of(&self, subscriber: Uuid) -> Result<Vec<Subscription>, StoreError> {
        let subs = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE subscriber = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(subscriber)
        .fetch_all(&self.pool)
        .await?;
        Ok(subs)
    }
}
