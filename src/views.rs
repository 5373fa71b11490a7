use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    ChannelProfile, ChannelStats, Comment, CommentView, Like, LikeTarget, Playlist,
    PlaylistDetail, Tweet, TweetView, User, UserCard, Video, VideoDetail, VideoListItem,
    VideoOwner,
};
use crate::store::Store;

/// Derived like fields for one document. An empty set yields (0, false);
/// an anonymous viewer is simply not a member of any liked-by set.
pub fn like_flags(likes: &[Like], viewer: Option<Uuid>) -> (i64, bool) {
    let count = likes.len() as i64;
    let is_liked = match viewer {
        Some(v) => likes.iter().any(|l| l.liked_by == v),
        None => false,
    };
    (count, is_liked)
}

fn is_member(subscriber_ids: &[Uuid], viewer: Option<Uuid>) -> bool {
    match viewer {
        Some(v) => subscriber_ids.contains(&v),
        None => false,
    }
}

/// Fetch videos by id preserving the order (and duplicates) of the id
/// list; ids that no longer resolve are skipped. Watch history and
/// playlist contents rely on this.
async fn videos_in_order(store: &dyn Store, ids: &[Uuid]) -> Result<Vec<Video>, ApiError> {
    let mut videos = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(video) = store.video_by_id(*id).await? {
            videos.push(video);
        }
    }
    Ok(videos)
}

/// Video listing items: owner projection plus like fields per item. Items
/// whose owner record is gone are dropped, matching an inner join.
pub async fn video_list_items(
    store: &dyn Store,
    videos: Vec<Video>,
    viewer: Option<Uuid>,
) -> Result<Vec<VideoListItem>, ApiError> {
    let mut items = Vec::with_capacity(videos.len());
    for video in videos {
        let owner = match store.user_by_id(video.owner).await? {
            Some(user) => UserCard::from(&user),
            None => continue,
        };
        let likes = store.likes_for_target(LikeTarget::Video(video.id)).await?;
        let (likes_count, is_liked) = like_flags(&likes, viewer);
        items.push(VideoListItem {
            id: video.id,
            title: video.title,
            description: video.description,
            media_ref: video.media_ref,
            thumbnail_ref: video.thumbnail_ref,
            duration: video.duration,
            views: video.views,
            created_at: video.created_at,
            owner,
            likes_count,
            is_liked,
        });
    }
    Ok(items)
}

/// Single-video view: owner with channel fields (subscriber count and the
/// viewer's subscription flag) plus like fields.
pub async fn video_detail(
    store: &dyn Store,
    video: &Video,
    viewer: Option<Uuid>,
) -> Result<VideoDetail, ApiError> {
    let owner_user = store
        .user_by_id(video.owner)
        .await?
        .ok_or_else(|| ApiError::not_found("video owner not found"))?;
    let subscriptions = store.subscribers_of(owner_user.id).await?;
    let subscriber_ids: Vec<Uuid> = subscriptions.iter().map(|s| s.subscriber).collect();
    let owner = VideoOwner {
        id: owner_user.id,
        username: owner_user.username.clone(),
        full_name: owner_user.full_name.clone(),
        avatar: owner_user.avatar.clone(),
        subscriber_count: subscriber_ids.len() as i64,
        is_subscribed: is_member(&subscriber_ids, viewer),
    };
    let likes = store.likes_for_target(LikeTarget::Video(video.id)).await?;
    let (likes_count, is_liked) = like_flags(&likes, viewer);
    Ok(VideoDetail {
        id: video.id,
        title: video.title.clone(),
        description: video.description.clone(),
        media_ref: video.media_ref.clone(),
        thumbnail_ref: video.thumbnail_ref.clone(),
        duration: video.duration,
        views: video.views,
        is_published: video.is_published,
        created_at: video.created_at,
        owner,
        likes_count,
        is_liked,
    })
}

pub async fn comment_views(
    store: &dyn Store,
    comments: Vec<Comment>,
    viewer: Option<Uuid>,
) -> Result<Vec<CommentView>, ApiError> {
    let mut views = Vec::with_capacity(comments.len());
    for comment in comments {
        let owner = match store.user_by_id(comment.owner).await? {
            Some(user) => UserCard::from(&user),
            None => continue,
        };
        let likes = store
            .likes_for_target(LikeTarget::Comment(comment.id))
            .await?;
        let (likes_count, is_liked) = like_flags(&likes, viewer);
        views.push(CommentView {
            id: comment.id,
            content: comment.content,
            created_at: comment.created_at,
            owner,
            likes_count,
            is_liked,
        });
    }
    Ok(views)
}

pub async fn tweet_views(
    store: &dyn Store,
    tweets: Vec<Tweet>,
    viewer: Option<Uuid>,
) -> Result<Vec<TweetView>, ApiError> {
    let mut views = Vec::with_capacity(tweets.len());
    for tweet in tweets {
        let owner = match store.user_by_id(tweet.owner).await? {
            Some(user) => UserCard::from(&user),
            None => continue,
        };
        let likes = store.likes_for_target(LikeTarget::Tweet(tweet.id)).await?;
        let (likes_count, is_liked) = like_flags(&likes, viewer);
        views.push(TweetView {
            id: tweet.id,
            content: tweet.content,
            created_at: tweet.created_at,
            owner,
            likes_count,
            is_liked,
        });
    }
    Ok(views)
}

/// Channel header: both sides of the subscription relation plus the
/// viewer's membership flag.
pub async fn channel_profile(
    store: &dyn Store,
    channel: &User,
    viewer: Option<Uuid>,
) -> Result<ChannelProfile, ApiError> {
    let subscribers = store.subscribers_of(channel.id).await?;
    let subscribed_to = store.subscriptions_of(channel.id).await?;
    let subscriber_ids: Vec<Uuid> = subscribers.iter().map(|s| s.subscriber).collect();
    Ok(ChannelProfile {
        id: channel.id,
        username: channel.username.clone(),
        full_name: channel.full_name.clone(),
        avatar: channel.avatar.clone(),
        cover_image: channel.cover_image.clone(),
        subscriber_count: subscriber_ids.len() as i64,
        subscribed_to_count: subscribed_to.len() as i64,
        is_subscribed: is_member(&subscriber_ids, viewer),
    })
}

pub async fn watch_history(store: &dyn Store, user: &User) -> Result<Vec<VideoListItem>, ApiError> {
    let videos = videos_in_order(store, &user.watch_history).await?;
    video_list_items(store, videos, Some(user.id)).await
}

pub async fn liked_videos(store: &dyn Store, user_id: Uuid) -> Result<Vec<VideoListItem>, ApiError> {
    let ids = store.liked_video_ids(user_id).await?;
    let videos = videos_in_order(store, &ids).await?;
    video_list_items(store, videos, Some(user_id)).await
}

pub async fn playlist_detail(
    store: &dyn Store,
    playlist: &Playlist,
    viewer: Option<Uuid>,
) -> Result<PlaylistDetail, ApiError> {
    let videos = videos_in_order(store, &playlist.videos).await?;
    let videos = video_list_items(store, videos, viewer).await?;
    Ok(PlaylistDetail {
        id: playlist.id,
        name: playlist.name.clone(),
        description: playlist.description.clone(),
        owner: playlist.owner,
        created_at: playlist.created_at,
        videos,
    })
}

/// Dashboard aggregates over the channel's own videos and subscribers.
pub async fn channel_stats(store: &dyn Store, channel: Uuid) -> Result<ChannelStats, ApiError> {
    let videos = store.videos_by_owner(channel).await?;
    let mut total_views = 0i64;
    let mut total_likes = 0i64;
    for video in &videos {
        total_views += video.views;
        total_likes += store.likes_for_target(LikeTarget::Video(video.id)).await?.len() as i64;
    }
    let subscribers = store.subscribers_of(channel).await?;
    Ok(ChannelStats {
        total_views,
        total_likes,
        total_videos: videos.len() as i64,
        subscribers_count: subscribers.len() as i64,
    })
}
