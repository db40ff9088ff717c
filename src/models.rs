use std::time::SystemTime;

use serde::Serialize;

use crate::schema::channels;
use crate::schema::comments;
use crate::schema::subscriptions;
use crate::schema::users;
use crate::schema::video_reactions;
use crate::schema::videos;
use crate::schema::watch_history;
use crate::schema::watch_later;

#[derive(Queryable)]
pub struct User {
    pub id: i32,
    pub login: String,
    pub password: String,
    pub created_at: SystemTime,
}

#[derive(Insertable)]
#[table_name = "users"]
pub struct NewUser<'a> {
    pub login: &'a str,
    pub password: &'a str,
}

#[derive(Queryable, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub description: String,
    pub avatar_url: String,
    pub banner_url: String,
    pub created_at: SystemTime,
}

#[derive(Insertable)]
#[table_name = "channels"]
pub struct NewChannel<'a> {
    pub user_id: i32,
    pub name: &'a str,
    pub description: &'a str,
    pub avatar_url: &'a str,
    pub banner_url: &'a str,
}

/// Channel row plus the two scalar-subquery counts used by the channel page.
#[derive(Queryable, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelWithCounts {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub description: String,
    pub avatar_url: String,
    pub banner_url: String,
    pub created_at: SystemTime,
    pub subscribers_count: i64,
    pub videos_count: i64,
}

/// The slice of a channel embedded in video and comment payloads.
#[derive(Queryable, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSummary {
    pub id: i32,
    pub name: String,
    pub avatar_url: String,
}

pub fn channel_summary_fields() -> (channels::id, channels::name, channels::avatar_url) {
    (channels::id, channels::name, channels::avatar_url)
}

#[derive(Queryable, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i32,
    pub channel_id: i32,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub preview_url: String,
    pub duration: i32,
    pub views: i32,
    pub visibility: String,
    pub created_at: SystemTime,
}

#[derive(Insertable)]
#[table_name = "videos"]
pub struct NewVideo<'a> {
    pub channel_id: i32,
    pub title: &'a str,
    pub description: &'a str,
    pub video_url: &'a str,
    pub preview_url: &'a str,
    pub duration: i32,
}

/// One row of any video listing (feed, channel uploads, watch later,
/// history, liked). The owning channel rides along as a nested struct,
/// selected through `channel_summary_fields()`.
#[derive(Queryable, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListing {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub preview_url: String,
    pub duration: i32,
    pub views: i32,
    pub visibility: String,
    pub created_at: SystemTime,
    pub channel: ChannelSummary,
}

#[derive(Queryable, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryVideoListing {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub preview_url: String,
    pub duration: i32,
    pub views: i32,
    pub visibility: String,
    pub created_at: SystemTime,
    pub channel: ChannelSummary,
    pub watched_at: SystemTime,
}

/// `GET /channels/{id}/videos/{id}` payload: the full video row plus the
/// engagement flags scoped to the viewing channel.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub preview_url: String,
    pub duration: i32,
    pub views: i32,
    pub visibility: String,
    pub created_at: SystemTime,
    pub channel: VideoDetailChannel,
    pub is_liked: bool,
    pub is_disliked: bool,
    pub is_saved: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetailChannel {
    pub id: i32,
    pub name: String,
    pub avatar_url: String,
    pub subscribers_count: i64,
    pub is_subscribed: bool,
}

#[derive(Queryable, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i32,
    pub video_id: i32,
    pub channel_id: i32,
    pub text: String,
    pub parent_comment_id: Option<i32>,
    pub created_at: SystemTime,
}

#[derive(Insertable)]
#[table_name = "comments"]
pub struct NewComment<'a> {
    pub video_id: i32,
    pub channel_id: i32,
    pub text: &'a str,
    pub parent_comment_id: Option<i32>,
}

/// Top-level comment with its authoring channel and a reply count.
#[derive(Queryable, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListing {
    pub id: i32,
    pub video_id: i32,
    pub text: String,
    pub created_at: SystemTime,
    pub channel: ChannelSummary,
    pub replies_count: i64,
}

#[derive(Queryable, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: i32,
    pub subscriber_channel_id: i32,
    pub subscribed_to_channel_id: i32,
    pub created_at: SystemTime,
}

#[derive(Insertable)]
#[table_name = "subscriptions"]
pub struct NewSubscription {
    pub subscriber_channel_id: i32,
    pub subscribed_to_channel_id: i32,
}

#[derive(Queryable, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoReaction {
    pub id: i32,
    pub channel_id: i32,
    pub video_id: i32,
    pub reaction_type: String,
    pub created_at: SystemTime,
}

#[derive(Insertable)]
#[table_name = "video_reactions"]
pub struct NewVideoReaction<'a> {
    pub channel_id: i32,
    pub video_id: i32,
    pub reaction_type: &'a str,
}

#[derive(Insertable)]
#[table_name = "watch_later"]
pub struct NewWatchLaterEntry {
    pub channel_id: i32,
    pub video_id: i32,
}

#[derive(Insertable)]
#[table_name = "watch_history"]
pub struct NewWatchHistoryEntry {
    pub channel_id: i32,
    pub video_id: i32,
}
