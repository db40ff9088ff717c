use actix_multipart::Multipart;
use actix_web::{delete, get, post, web, HttpResponse};
use diesel::dsl::sql;
use diesel::sql_types::BigInt;
use diesel::{QueryDsl, RunQueryDsl};
use futures::try_join;
use serde::Serialize;

use crate::db::DbPool;
use crate::errors::ApiError;
use crate::helpers::auth::{assert_channel_owner, AuthedUser};
use crate::helpers::multipart_parsing::parse_multipart;
use crate::helpers::storage::{object_key, Storage};
use crate::models::{Channel, ChannelWithCounts, NewChannel};
use crate::schema::channels;

#[derive(Serialize)]
struct MessageBody {
    message: &'static str,
}

/// Creates a channel from a multipart form. Both image uploads run in
/// parallel and the row is only inserted once both have landed.
#[post("/channels")]
pub async fn create_channel(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    payload: Multipart,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let parsed = parse_multipart(payload).await?;

    let user_id: i32 = parsed
        .text("userId")
        .ok_or_else(|| ApiError::invalid("User ID is required"))?
        .parse()
        .map_err(|_| ApiError::invalid("User ID must be a number"))?;
    let name = parsed
        .text("name")
        .ok_or_else(|| ApiError::invalid("Name is required"))?;
    let description = parsed
        .text("description")
        .ok_or_else(|| ApiError::invalid("Description is required"))?;
    let avatar_file = parsed
        .file("avatarFile")
        .ok_or_else(|| ApiError::invalid("Avatar file is required"))?;
    let banner_file = parsed
        .file("bannerFile")
        .ok_or_else(|| ApiError::invalid("Banner file is required"))?;

    let avatar_key = object_key("avatars", user_id, &avatar_file.filename);
    let banner_key = object_key("banners", user_id, &banner_file.filename);

    let (avatar_url, banner_url) = try_join!(
        storage.put(&avatar_key, &avatar_file.data, &avatar_file.content_type),
        storage.put(&banner_key, &banner_file.data, &banner_file.content_type),
    )?;

    let conn = pool.get()?;
    let conn = &*conn;

    let new_channel = NewChannel {
        user_id,
        name,
        description,
        avatar_url: &avatar_url,
        banner_url: &banner_url,
    };

    let channel: Channel = diesel::insert_into(channels::table)
        .values(&new_channel)
        .get_result(conn)?;

    Ok(HttpResponse::Created().json(channel))
}

#[get("/channels/{channel_id}")]
pub async fn get_channel(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let channel_id = path.into_inner();
    let conn = pool.get()?;
    let conn = &*conn;

    let channel: ChannelWithCounts = channels::table
        .find(channel_id)
        .select((
            channels::id,
            channels::user_id,
            channels::name,
            channels::description,
            channels::avatar_url,
            channels::banner_url,
            channels::created_at,
            sql::<BigInt>(
                "(SELECT COUNT(*) FROM subscriptions \
                 WHERE subscriptions.subscribed_to_channel_id = channels.id)",
            ),
            sql::<BigInt>(
                "(SELECT COUNT(*) FROM videos WHERE videos.channel_id = channels.id)",
            ),
        ))
        .first(conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => ApiError::not_found("Channel not found"),
            other => other.into(),
        })?;

    Ok(HttpResponse::Ok().json(channel))
}

/// Only the owning user may delete a channel; anyone else gets 403.
#[delete("/channels/{channel_id}")]
pub async fn delete_channel(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let channel_id = path.into_inner();
    let conn = pool.get()?;
    let conn = &*conn;

    assert_channel_owner(conn, channel_id, user.0.id)?;

    diesel::delete(channels::table.find(channel_id)).execute(conn)?;

    Ok(HttpResponse::Ok().json(MessageBody {
        message: "Channel deleted successfully",
    }))
}
