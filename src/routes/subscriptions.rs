use actix_web::{delete, get, post, web, HttpResponse};
use diesel::{BoolExpressionMethods, ExpressionMethods, QueryDsl, RunQueryDsl};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::errors::ApiError;
use crate::helpers::auth::AuthedUser;
use crate::models::{NewSubscription, Subscription};
use crate::schema::subscriptions;

#[derive(Serialize)]
struct MessageBody {
    message: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPair {
    pub subscriber_channel_id: i32,
    pub subscribe_to_channel_id: i32,
}

/// A channel can never subscribe to itself, whether or not either side
/// exists. Checked before any query runs.
fn validate_pair(pair: &SubscriptionPair) -> Result<(), ApiError> {
    if pair.subscriber_channel_id == pair.subscribe_to_channel_id {
        return Err(ApiError::invalid("A channel cannot subscribe to itself"));
    }

    Ok(())
}

#[get("/subscriptions/{channel_id}")]
pub async fn get_subscriptions(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ApiError> {
    let channel_id = path.into_inner();
    let conn = pool.get()?;
    let conn = &*conn;

    let subs: Vec<Subscription> = subscriptions::table
        .filter(subscriptions::subscriber_channel_id.eq(channel_id))
        .order(subscriptions::created_at.desc())
        .load(conn)?;

    Ok(HttpResponse::Ok().json(subs))
}

#[post("/subscriptions")]
pub async fn create_subscription(
    pool: web::Data<DbPool>,
    data: web::Json<SubscriptionPair>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    validate_pair(&data)?;

    let conn = pool.get()?;
    let conn = &*conn;

    let new_subscription = NewSubscription {
        subscriber_channel_id: data.subscriber_channel_id,
        subscribed_to_channel_id: data.subscribe_to_channel_id,
    };

    // A duplicate pair trips the unique constraint and surfaces as 409.
    let subscription: Subscription = diesel::insert_into(subscriptions::table)
        .values(&new_subscription)
        .get_result(conn)?;

    Ok(HttpResponse::Created().json(subscription))
}

#[delete("/subscriptions")]
pub async fn delete_subscription(
    pool: web::Data<DbPool>,
    data: web::Json<SubscriptionPair>,
    _user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    validate_pair(&data)?;

    let conn = pool.get()?;
    let conn = &*conn;

    diesel::delete(
        subscriptions::table.filter(
            subscriptions::subscriber_channel_id
                .eq(data.subscriber_channel_id)
                .and(subscriptions::subscribed_to_channel_id.eq(data.subscribe_to_channel_id)),
        ),
    )
    .execute(conn)?;

    Ok(HttpResponse::Ok().json(MessageBody {
        message: "Unsubscribed successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_subscription_is_rejected() {
        let pair = SubscriptionPair {
            subscriber_channel_id: 3,
            subscribe_to_channel_id: 3,
        };

        let err = validate_pair(&pair).unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter(_)));
    }

    #[test]
    fn distinct_channels_pass_validation() {
        let pair = SubscriptionPair {
            subscriber_channel_id: 3,
            subscribe_to_channel_id: 5,
        };

        assert!(validate_pair(&pair).is_ok());
    }
}
