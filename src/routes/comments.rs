use actix_web::{get, post, web, HttpResponse};
use diesel::dsl::sql;
use diesel::sql_types::BigInt;
use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl};
use serde::Deserialize;
use validator::Validate;

use crate::db::DbPool;
use crate::errors::ApiError;
use crate::helpers::auth::AuthedUser;
use crate::models::{channel_summary_fields, Comment, CommentListing, NewComment};
use crate::pagination::{paginate, PageParams, PageQuery};
use crate::schema::{channels, comments};

const REPLIES_COUNT_SQL: &str =
    "(SELECT COUNT(*) FROM comments AS replies WHERE replies.parent_comment_id = comments.id)";

/// Top-level comments of a video, oldest first, each carrying its reply
/// count. Replies themselves are fetched per-thread.
#[get("/videos/{video_id}/comments")]
pub async fn get_comments(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let video_id = path.into_inner();
    let params = PageParams::from_query(&query)?;
    let conn = pool.get()?;
    let conn = &*conn;

    let page = paginate(
        params,
        || {
            comments::table
                .filter(comments::video_id.eq(video_id))
                .filter(comments::parent_comment_id.is_null())
                .count()
                .get_result(conn)
        },
        |limit, offset| {
            comments::table
                .inner_join(channels::table)
                .filter(comments::video_id.eq(video_id))
                .filter(comments::parent_comment_id.is_null())
                .order((comments::created_at.asc(), comments::id.asc()))
                .select((
                    comments::id,
                    comments::video_id,
                    comments::text,
                    comments::created_at,
                    channel_summary_fields(),
                    sql::<BigInt>(REPLIES_COUNT_SQL),
                ))
                .limit(limit)
                .offset(offset)
                .load::<CommentListing>(conn)
        },
    )?;

    Ok(HttpResponse::Ok().json(page))
}

#[get("/comments/{comment_id}/replies")]
pub async fn get_replies(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let comment_id = path.into_inner();
    let conn = pool.get()?;
    let conn = &*conn;

    let replies: Vec<Comment> = comments::table
        .filter(comments::parent_comment_id.eq(comment_id))
        .order((comments::created_at.asc(), comments::id.asc()))
        .load(conn)?;

    Ok(HttpResponse::Ok().json(replies))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentBody {
    pub video_id: i32,
    pub channel_id: i32,
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    pub parent_comment_id: Option<i32>,
}

#[post("/comments")]
pub async fn create_comment(
    pool: web::Data<DbPool>,
    data: web::Json<CreateCommentBody>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    data.validate()
        .map_err(|_| ApiError::invalid("Comment text must be between 1 and 1000 characters"))?;

    let conn = pool.get()?;
    let conn = &*conn;

    let new_comment = NewComment {
        video_id: data.video_id,
        channel_id: data.channel_id,
        text: &data.text,
        parent_comment_id: data.parent_comment_id,
    };

    let comment: Comment = diesel::insert_into(comments::table)
        .values(&new_comment)
        .get_result(conn)?;

    Ok(HttpResponse::Created().json(comment))
}
