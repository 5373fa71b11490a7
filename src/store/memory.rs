use async_trait::async_trait;
use std::cmp::Ordering;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Comment, Like, LikeTarget, Playlist, Subscription, Tweet, User, Video};
use crate::store::{SortDirection, Store, StoreError, VideoFilter, VideoSortKey};

/// In-memory store. Used by the integration tests and handy for local
/// development without a database. Collections are plain vectors so
/// insertion order is preserved; a single write lock per operation gives
/// each store call the same atomicity a single-document database write has.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    videos: Vec<Video>,
    comments: Vec<Comment>,
    likes: Vec<Like>,
    tweets: Vec<Tweet>,
    playlists: Vec<Playlist>,
    subscriptions: Vec<Subscription>,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore::default()
    }
}

fn sort_videos(mut videos: Vec<(usize, Video)>, filter: &VideoFilter) -> Vec<Video> {
    videos.sort_by(|(ia, a), (ib, b)| {
        let key = match filter.sort_key {
            VideoSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            VideoSortKey::Views => a.views.cmp(&b.views),
            VideoSortKey::Duration => a.duration.cmp(&b.duration),
            VideoSortKey::Title => a.title.cmp(&b.title),
        };
        let ordered = match filter.sort_direction {
            SortDirection::Asc => key,
            SortDirection::Desc => key.reverse(),
        };
        if ordered != Ordering::Equal {
            return ordered;
        }
        // Tie-break on insertion order so pagination sees a stable sequence.
        match filter.sort_direction {
            SortDirection::Asc => ia.cmp(ib),
            SortDirection::Desc => ib.cmp(ia),
        }
    });
    videos.into_iter().map(|(_, v)| v).collect()
}

#[async_trait]
impl Store for MemStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let clash = inner.users.iter().any(|u| {
            u.username.eq_ignore_ascii_case(&user.username) || u.email == user.email
        });
        if clash {
            return Err(StoreError::Duplicate("user".to_string()));
        }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.users.iter_mut().find(|u| u.id == user.id) {
            *existing = user.clone();
        }
        Ok(())
    }

    async fn append_watch_history(&self, user_id: Uuid, video_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == user_id) {
            if !user.watch_history.contains(&video_id) {
                user.watch_history.push(video_id);
            }
        }
        Ok(())
    }

    async fn insert_video(&self, video: &Video) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.videos.push(video.clone());
        Ok(())
    }

    async fn video_by_id(&self, id: Uuid) -> Result<Option<Video>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.videos.iter().find(|v| v.id == id).cloned())
    }

    async fn update_video(&self, video: &Video) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.videos.iter_mut().find(|v| v.id == video.id) {
            *existing = video.clone();
        }
        Ok(())
    }

    async fn delete_video(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.videos.retain(|v| v.id != id);
        Ok(())
    }

    async fn list_videos(&self, filter: &VideoFilter) -> Result<Vec<Video>, StoreError> {
        let inner = self.inner.read().await;
        let needle = filter.search.as_ref().map(|q| q.to_lowercase());
        let matching: Vec<(usize, Video)> = inner
            .videos
            .iter()
            .enumerate()
            .filter(|(_, v)| {
                if filter.published_only && !v.is_published {
                    return false;
                }
                if let Some(owner) = filter.owner {
                    if v.owner != owner {
                        return false;
                    }
                }
                if let Some(q) = &needle {
                    if !v.title.to_lowercase().contains(q)
                        && !v.description.to_lowercase().contains(q)
                    {
                        return false;
                    }
                }
                true
            })
            .map(|(i, v)| (i, v.clone()))
            .collect();
        Ok(sort_videos(matching, filter))
    }

    async fn videos_by_owner(&self, owner: Uuid) -> Result<Vec<Video>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .videos
            .iter()
            .rev()
            .filter(|v| v.owner == owner)
            .cloned()
            .collect())
    }

    async fn increment_views(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(video) = inner.videos.iter_mut().find(|v| v.id == id) {
            video.views += 1;
        }
        Ok(())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.comments.push(comment.clone());
        Ok(())
    }

    async fn comment_by_id(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn update_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.comments.iter_mut().find(|c| c.id == comment.id) {
            *existing = comment.clone();
        }
        Ok(())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.comments.retain(|c| c.id != id);
        Ok(())
    }

    async fn comments_for_video(&self, video_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .comments
            .iter()
            .rev()
            .filter(|c| c.video == video_id)
            .cloned()
            .collect())
    }

    async fn delete_comments_for_video(&self, video_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.comments.retain(|c| c.video != video_id);
        Ok(())
    }

    async fn find_like(
        &self,
        liked_by: Uuid,
        target: LikeTarget,
    ) -> Result<Option<Like>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .likes
            .iter()
            .find(|l| l.liked_by == liked_by && l.target == target)
            .cloned())
    }

    async fn insert_like(&self, like: &Like) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let clash = inner
            .likes
            .iter()
            .any(|l| l.liked_by == like.liked_by && l.target == like.target);
        if clash {
            return Err(StoreError::Duplicate("like".to_string()));
        }
        inner.likes.push(like.clone());
        Ok(())
    }

    async fn delete_like(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.likes.retain(|l| l.id != id);
        Ok(())
    }

    async fn likes_for_target(&self, target: LikeTarget) -> Result<Vec<Like>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .likes
            .iter()
            .filter(|l| l.target == target)
            .cloned()
            .collect())
    }

    async fn liked_video_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .likes
            .iter()
            .rev()
            .filter(|l| l.liked_by == user_id)
            .filter_map(|l| match l.target {
                LikeTarget::Video(id) => Some(id),
                _ => None,
            })
            .collect())
    }

    async fn delete_likes_for_target(&self, target: LikeTarget) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.likes.retain(|l| l.target != target);
        Ok(())
    }

    async fn insert_tweet(&self, tweet: &Tweet) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.tweets.push(tweet.clone());
        Ok(())
    }

    async fn tweet_by_id(&self, id: Uuid) -> Result<Option<Tweet>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.tweets.iter().find(|t| t.id == id).cloned())
    }

    async fn update_tweet(&self, tweet: &Tweet) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.tweets.iter_mut().find(|t| t.id == tweet.id) {
            *existing = tweet.clone();
        }
        Ok(())
    }

    async fn delete_tweet(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.tweets.retain(|t| t.id != id);
        Ok(())
    }

    async fn tweets_by_owner(&self, owner: Uuid) -> Result<Vec<Tweet>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tweets
            .iter()
            .rev()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect())
    }

    async fn insert_playlist(&self, playlist: &Playlist) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.playlists.push(playlist.clone());
        Ok(())
    }

    async fn playlist_by_id(&self, id: Uuid) -> Result<Option<Playlist>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.playlists.iter().find(|p| p.id == id).cloned())
    }

    async fn update_playlist(&self, playlist: &Playlist) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.playlists.iter_mut().find(|p| p.id == playlist.id) {
            *existing = playlist.clone();
        }
        Ok(())
    }

    async fn delete_playlist(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.playlists.retain(|p| p.id != id);
        Ok(())
    }

    async fn playlists_by_owner(&self, owner: Uuid) -> Result<Vec<Playlist>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .playlists
            .iter()
            .rev()
            .filter(|p| p.owner == owner)
            .cloned()
            .collect())
    }

    async fn find_subscription(
        &self,
        subscriber: Uuid,
        channel: Uuid,
    ) -> Result<Option<Subscription>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .subscriptions
            .iter()
            .find(|s| s.subscriber == subscriber && s.channel == channel)
            .cloned())
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let clash = inner
            .subscriptions
            .iter()
            .any(|s| s.subscriber == subscription.subscriber && s.channel == subscription.channel);
        if clash {
            return Err(StoreError::Duplicate("subscription".to_string()));
        }
        inner.subscriptions.push(subscription.clone());
        Ok(())
    }

    async fn delete_subscription(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.subscriptions.retain(|s| s.id != id);
        Ok(())
    }

    async fn subscribers_of(&self, channel: Uuid) -> Result<Vec<Subscription>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .subscriptions
            .iter()
            .rev()
            .filter(|s| s.channel == channel)
            .cloned()
            .collect())
    }

    async fn subscriptions_of(&self, subscriber: Uuid) -> Result<Vec<Subscription>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .subscriptions
            .iter()
            .rev()
            .filter(|s| s.subscriber == subscriber)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: name.to_string(),
            email: format!("{}@example.com", name),
            full_name: name.to_string(),
            avatar: "a.png".to_string(),
            cover_image: None,
            password: "hash".to_string(),
            refresh_token: None,
            watch_history: Vec::new(),
            created_at: Utc::now().naive_utc(),
        }
    }

    fn video(owner: Uuid, title: &str, published: bool) -> Video {
        Video {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            media_ref: "m".to_string(),
            thumbnail_ref: "t".to_string(),
            duration: 60,
            views: 0,
            is_published: published,
            owner,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected_case_insensitively() {
        let store = MemStore::new();
        store.insert_user(&user("alice")).await.unwrap();
        let mut dup = user("ALICE");
        dup.email = "other@example.com".to_string();
        assert!(matches!(
            store.insert_user(&dup).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn listing_filters_unpublished_videos() {
        let store = MemStore::new();
        let owner = Uuid::new_v4();
        store.insert_video(&video(owner, "public", true)).await.unwrap();
        store.insert_video(&video(owner, "draft", false)).await.unwrap();

        let published = store.list_videos(&VideoFilter::default()).await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].title, "public");

        let all = store
            .list_videos(&VideoFilter {
                published_only: false,
                ..VideoFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn second_identical_like_insert_fails_cleanly() {
        let store = MemStore::new();
        let like = Like {
            id: Uuid::new_v4(),
            liked_by: Uuid::new_v4(),
            target: LikeTarget::Video(Uuid::new_v4()),
            created_at: Utc::now().naive_utc(),
        };
        store.insert_like(&like).await.unwrap();
        let again = Like {
            id: Uuid::new_v4(),
            ..like.clone()
        };
        assert!(matches!(
            store.insert_like(&again).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn watch_history_appends_once_and_keeps_order() {
        let store = MemStore::new();
        let u = user("bob");
        store.insert_user(&u).await.unwrap();
        let (v1, v2) = (Uuid::new_v4(), Uuid::new_v4());
        store.append_watch_history(u.id, v1).await.unwrap();
        store.append_watch_history(u.id, v2).await.unwrap();
        store.append_watch_history(u.id, v1).await.unwrap();
        let stored = store.user_by_id(u.id).await.unwrap().unwrap();
        assert_eq!(stored.watch_history, vec![v1, v2]);
    }
}
