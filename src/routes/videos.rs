use actix_multipart::Multipart;
use actix_web::{delete, get, post, web, HttpResponse};
use diesel::dsl::exists;
use diesel::pg::upsert::on_constraint;
use diesel::{BoolExpressionMethods, ExpressionMethods, QueryDsl, RunQueryDsl};
use futures::try_join;
use serde::Serialize;

use crate::db::DbPool;
use crate::errors::ApiError;
use crate::helpers::auth::AuthedUser;
use crate::helpers::media::probe_upload_duration;
use crate::helpers::multipart_parsing::parse_multipart;
use crate::helpers::storage::{object_key, Storage};
use crate::models::{
    channel_summary_fields, ChannelSummary, HistoryVideoListing, NewVideo, NewVideoReaction,
    NewWatchHistoryEntry, NewWatchLaterEntry, Video, VideoDetail, VideoDetailChannel,
    VideoListing, VideoReaction,
};
use crate::pagination::{paginate, PageParams, PageQuery};
use crate::schema::{channels, subscriptions, video_reactions, videos, watch_history, watch_later};

type ListingFields = (
    videos::id,
    videos::title,
    videos::description,
    videos::preview_url,
    videos::duration,
    videos::views,
    videos::visibility,
    videos::created_at,
    (channels::id, channels::name, channels::avatar_url),
);

fn listing_fields() -> ListingFields {
    (
        videos::id,
        videos::title,
        videos::description,
        videos::preview_url,
        videos::duration,
        videos::views,
        videos::visibility,
        videos::created_at,
        channel_summary_fields(),
    )
}

#[derive(Serialize)]
struct MessageBody {
    message: &'static str,
}

/// Public feed, newest first.
#[get("/videos")]
pub async fn get_videos(
    pool: web::Data<DbPool>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let params = PageParams::from_query(&query)?;
    let conn = pool.get()?;
    let conn = &*conn;

    let page = paginate(
        params,
        || {
            videos::table
                .filter(videos::visibility.eq("public"))
                .count()
                .get_result(conn)
        },
        |limit, offset| {
            videos::table
                .inner_join(channels::table)
                .filter(videos::visibility.eq("public"))
                .order((videos::created_at.desc(), videos::id.desc()))
                .select(listing_fields())
                .limit(limit)
                .offset(offset)
                .load::<VideoListing>(conn)
        },
    )?;

    Ok(HttpResponse::Ok().json(page))
}

/// Single video with the engagement flags scoped to the requesting
/// viewer's channel (the `channel_id` path segment).
#[get("/channels/{channel_id}/videos/{video_id}")]
pub async fn get_video(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, ApiError> {
    let (viewer_channel_id, video_id) = path.into_inner();
    let conn = pool.get()?;
    let conn = &*conn;

    let video: Video = videos::table
        .find(video_id)
        .first(conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => ApiError::not_found("Video not found"),
            other => other.into(),
        })?;

    let channel: ChannelSummary = channels::table
        .find(video.channel_id)
        .select(channel_summary_fields())
        .first(conn)?;

    let subscribers_count: i64 = subscriptions::table
        .filter(subscriptions::subscribed_to_channel_id.eq(video.channel_id))
        .count()
        .get_result(conn)?;

    let is_liked = diesel::select(exists(
        video_reactions::table.filter(
            video_reactions::channel_id
                .eq(viewer_channel_id)
                .and(video_reactions::video_id.eq(video_id))
                .and(video_reactions::reaction_type.eq("like")),
        ),
    ))
    .get_result(conn)?;

    let is_disliked = diesel::select(exists(
        video_reactions::table.filter(
            video_reactions::channel_id
                .eq(viewer_channel_id)
                .and(video_reactions::video_id.eq(video_id))
                .and(video_reactions::reaction_type.eq("dislike")),
        ),
    ))
    .get_result(conn)?;

    let is_saved = diesel::select(exists(
        watch_later::table.filter(
            watch_later::channel_id
                .eq(viewer_channel_id)
                .and(watch_later::video_id.eq(video_id)),
        ),
    ))
    .get_result(conn)?;

    let is_subscribed = diesel::select(exists(
        subscriptions::table.filter(
            subscriptions::subscriber_channel_id
                .eq(viewer_channel_id)
                .and(subscriptions::subscribed_to_channel_id.eq(video.channel_id)),
        ),
    ))
    .get_result(conn)?;

    Ok(HttpResponse::Ok().json(VideoDetail {
        id: video.id,
        title: video.title,
        description: video.description,
        video_url: video.video_url,
        preview_url: video.preview_url,
        duration: video.duration,
        views: video.views,
        visibility: video.visibility,
        created_at: video.created_at,
        channel: VideoDetailChannel {
            id: channel.id,
            name: channel.name,
            avatar_url: channel.avatar_url,
            subscribers_count,
            is_subscribed,
        },
        is_liked,
        is_disliked,
        is_saved,
    }))
}

#[get("/channels/{channel_id}/videos")]
pub async fn get_channel_videos(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let channel_id = path.into_inner();
    let params = PageParams::from_query(&query)?;
    let conn = pool.get()?;
    let conn = &*conn;

    let page = paginate(
        params,
        || {
            videos::table
                .filter(videos::channel_id.eq(channel_id))
                .count()
                .get_result(conn)
        },
        |limit, offset| {
            videos::table
                .inner_join(channels::table)
                .filter(videos::channel_id.eq(channel_id))
                .order((videos::created_at.desc(), videos::id.desc()))
                .select(listing_fields())
                .limit(limit)
                .offset(offset)
                .load::<VideoListing>(conn)
        },
    )?;

    Ok(HttpResponse::Ok().json(page))
}

#[get("/channels/{channel_id}/watch_later")]
pub async fn get_watch_later(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let channel_id = path.into_inner();
    let params = PageParams::from_query(&query)?;
    let conn = pool.get()?;
    let conn = &*conn;

    let page = paginate(
        params,
        || {
            watch_later::table
                .filter(watch_later::channel_id.eq(channel_id))
                .count()
                .get_result(conn)
        },
        |limit, offset| {
            watch_later::table
                .inner_join(videos::table.inner_join(channels::table))
                .filter(watch_later::channel_id.eq(channel_id))
                .order((watch_later::created_at.desc(), watch_later::id.desc()))
                .select(listing_fields())
                .limit(limit)
                .offset(offset)
                .load::<VideoListing>(conn)
        },
    )?;

    Ok(HttpResponse::Ok().json(page))
}

/// Duplicate saves are a no-op, unlike watch history.
#[post("/channels/{channel_id}/watch_later/{video_id}")]
pub async fn add_to_watch_later(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let (channel_id, video_id) = path.into_inner();
    let conn = pool.get()?;
    let conn = &*conn;

    let entry = NewWatchLaterEntry {
        channel_id,
        video_id,
    };

    diesel::insert_into(watch_later::table)
        .values(&entry)
        .on_conflict_do_nothing()
        .execute(conn)?;

    Ok(HttpResponse::Ok().json(MessageBody {
        message: "Video saved for later",
    }))
}

#[delete("/channels/{channel_id}/watch_later/{video_id}")]
pub async fn remove_from_watch_later(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let (channel_id, video_id) = path.into_inner();
    let conn = pool.get()?;
    let conn = &*conn;

    diesel::delete(
        watch_later::table.filter(
            watch_later::channel_id
                .eq(channel_id)
                .and(watch_later::video_id.eq(video_id)),
        ),
    )
    .execute(conn)?;

    Ok(HttpResponse::Ok().json(MessageBody {
        message: "Video removed from watch later successfully",
    }))
}

#[get("/channels/{channel_id}/history")]
pub async fn get_history(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let channel_id = path.into_inner();
    let params = PageParams::from_query(&query)?;
    let conn = pool.get()?;
    let conn = &*conn;

    let page = paginate(
        params,
        || {
            watch_history::table
                .filter(watch_history::channel_id.eq(channel_id))
                .count()
                .get_result(conn)
        },
        |limit, offset| {
            watch_history::table
                .inner_join(videos::table.inner_join(channels::table))
                .filter(watch_history::channel_id.eq(channel_id))
                .order((watch_history::watched_at.desc(), watch_history::id.desc()))
                .select((
                    videos::id,
                    videos::title,
                    videos::description,
                    videos::preview_url,
                    videos::duration,
                    videos::views,
                    videos::visibility,
                    videos::created_at,
                    channel_summary_fields(),
                    watch_history::watched_at,
                ))
                .limit(limit)
                .offset(offset)
                .load::<HistoryVideoListing>(conn)
        },
    )?;

    Ok(HttpResponse::Ok().json(page))
}

fn duplicate_history_to_invalid(err: diesel::result::Error) -> ApiError {
    match ApiError::from(err) {
        ApiError::Conflict(_) => ApiError::invalid("Video already in history"),
        other => other,
    }
}

/// Re-adding a watched video is a client error; the history keeps the
/// first watch timestamp.
#[post("/channels/{channel_id}/history/{video_id}")]
pub async fn add_to_history(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let (channel_id, video_id) = path.into_inner();
    let conn = pool.get()?;
    let conn = &*conn;

    let already_watched: bool = diesel::select(exists(
        watch_history::table.filter(
            watch_history::channel_id
                .eq(channel_id)
                .and(watch_history::video_id.eq(video_id)),
        ),
    ))
    .get_result(conn)?;

    if already_watched {
        return Err(ApiError::invalid("Video already in history"));
    }

    let entry = NewWatchHistoryEntry {
        channel_id,
        video_id,
    };

    // A racing duplicate can slip past the probe; the pair constraint
    // still answers with the same client error.
    diesel::insert_into(watch_history::table)
        .values(&entry)
        .execute(conn)
        .map_err(duplicate_history_to_invalid)?;

    Ok(HttpResponse::Created().json(MessageBody {
        message: "Video added to history",
    }))
}

#[delete("/channels/{channel_id}/history/{video_id}")]
pub async fn remove_from_history(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let (channel_id, video_id) = path.into_inner();
    let conn = pool.get()?;
    let conn = &*conn;

    diesel::delete(
        watch_history::table.filter(
            watch_history::channel_id
                .eq(channel_id)
                .and(watch_history::video_id.eq(video_id)),
        ),
    )
    .execute(conn)?;

    Ok(HttpResponse::Ok().json(MessageBody {
        message: "Video removed from history successfully",
    }))
}

#[get("/channels/{channel_id}/liked")]
pub async fn get_liked_videos(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let channel_id = path.into_inner();
    let params = PageParams::from_query(&query)?;
    let conn = pool.get()?;
    let conn = &*conn;

    let page = paginate(
        params,
        || {
            video_reactions::table
                .filter(
                    video_reactions::channel_id
                        .eq(channel_id)
                        .and(video_reactions::reaction_type.eq("like")),
                )
                .count()
                .get_result(conn)
        },
        |limit, offset| {
            video_reactions::table
                .inner_join(videos::table.inner_join(channels::table))
                .filter(
                    video_reactions::channel_id
                        .eq(channel_id)
                        .and(video_reactions::reaction_type.eq("like")),
                )
                .order((video_reactions::created_at.desc(), video_reactions::id.desc()))
                .select(listing_fields())
                .limit(limit)
                .offset(offset)
                .load::<VideoListing>(conn)
        },
    )?;

    Ok(HttpResponse::Ok().json(page))
}

fn upsert_reaction(
    conn: &diesel::PgConnection,
    channel_id: i32,
    video_id: i32,
    reaction_type: &str,
) -> Result<VideoReaction, ApiError> {
    let new_reaction = NewVideoReaction {
        channel_id,
        video_id,
        reaction_type,
    };

    // Last write wins: a second reaction from the same channel replaces
    // the stored type instead of failing the unique pair.
    let reaction = diesel::insert_into(video_reactions::table)
        .values(&new_reaction)
        .on_conflict(on_constraint("video_reactions_pair_key"))
        .do_update()
        .set(video_reactions::reaction_type.eq(reaction_type))
        .get_result(conn)?;

    Ok(reaction)
}

fn remove_reaction(
    conn: &diesel::PgConnection,
    channel_id: i32,
    video_id: i32,
) -> Result<usize, ApiError> {
    let deleted = diesel::delete(
        video_reactions::table.filter(
            video_reactions::channel_id
                .eq(channel_id)
                .and(video_reactions::video_id.eq(video_id)),
        ),
    )
    .execute(conn)?;

    Ok(deleted)
}

#[post("/channels/{channel_id}/videos/{video_id}/like")]
pub async fn like_video(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let (channel_id, video_id) = path.into_inner();
    let conn = pool.get()?;
    let conn = &*conn;

    let reaction = upsert_reaction(conn, channel_id, video_id, "like")?;

    Ok(HttpResponse::Ok().json(reaction))
}

#[delete("/channels/{channel_id}/videos/{video_id}/like")]
pub async fn unlike_video(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let (channel_id, video_id) = path.into_inner();
    let conn = pool.get()?;
    let conn = &*conn;

    remove_reaction(conn, channel_id, video_id)?;

    Ok(HttpResponse::Ok().json(MessageBody {
        message: "Video unliked successfully",
    }))
}

#[post("/channels/{channel_id}/videos/{video_id}/dislike")]
pub async fn dislike_video(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let (channel_id, video_id) = path.into_inner();
    let conn = pool.get()?;
    let conn = &*conn;

    let reaction = upsert_reaction(conn, channel_id, video_id, "dislike")?;

    Ok(HttpResponse::Ok().json(reaction))
}

#[delete("/channels/{channel_id}/videos/{video_id}/dislike")]
pub async fn undislike_video(
    pool: web::Data<DbPool>,
    path: web::Path<(i32, i32)>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let (channel_id, video_id) = path.into_inner();
    let conn = pool.get()?;
    let conn = &*conn;

    remove_reaction(conn, channel_id, video_id)?;

    Ok(HttpResponse::Ok().json(MessageBody {
        message: "Video undisliked successfully",
    }))
}

/// Multipart upload: probe the duration off a transient copy, push both
/// payloads to the object store in parallel, and only then insert the
/// row. A failed upload leaves no partial video behind.
#[post("/channels/{channel_id}/videos/upload")]
pub async fn upload_video(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    path: web::Path<i32>,
    payload: Multipart,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let channel_id = path.into_inner();

    let parsed = parse_multipart(payload).await?;

    let title = parsed
        .text("title")
        .ok_or_else(|| ApiError::invalid("Title is required"))?;
    let description = parsed
        .text("description")
        .ok_or_else(|| ApiError::invalid("Description is required"))?;
    let video_file = parsed
        .file("videoFile")
        .ok_or_else(|| ApiError::invalid("Video file is required"))?;
    let preview_file = parsed
        .file("previewFile")
        .ok_or_else(|| ApiError::invalid("Preview file is required"))?;

    let duration = probe_upload_duration(&video_file.data, &video_file.filename)?;

    let video_key = object_key("videos", channel_id, &video_file.filename);
    let preview_key = object_key("previews", channel_id, &preview_file.filename);

    let (video_url, preview_url) = try_join!(
        storage.put(&video_key, &video_file.data, &video_file.content_type),
        storage.put(&preview_key, &preview_file.data, &preview_file.content_type),
    )?;

    let conn = pool.get()?;
    let conn = &*conn;

    let new_video = NewVideo {
        channel_id,
        title,
        description,
        video_url: &video_url,
        preview_url: &preview_url,
        duration,
    };

    let video: Video = diesel::insert_into(videos::table)
        .values(&new_video)
        .get_result(conn)?;

    Ok(HttpResponse::Created().json(video))
}

#[cfg(test)]
mod tests {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    use super::*;

    #[test]
    fn racing_duplicate_history_insert_is_a_client_error() {
        let err = duplicate_history_to_invalid(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(String::from("duplicate key value")),
        ));
        assert!(matches!(err, ApiError::InvalidParameter(_)));
    }

    #[test]
    fn other_history_insert_errors_pass_through() {
        let err = duplicate_history_to_invalid(DieselError::NotFound);
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
