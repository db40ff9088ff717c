use std::time::{SystemTime, UNIX_EPOCH};

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest};
use diesel::pg::PgConnection;
use diesel::{QueryDsl, RunQueryDsl};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::user::UserClaim;
use crate::config::Config;
use crate::errors::ApiError;
use crate::schema::channels;

pub const AUTH_COOKIE: &str = "authToken";

/// 7 days, matching the cookie's max-age.
pub const TOKEN_TTL_SECS: i64 = 60 * 60 * 24 * 7;

pub fn sign_token(secret: &str, user_id: i32, login: &str) -> Result<String, ApiError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| ApiError::internal("System clock is before the epoch"))?;

    let claim = UserClaim {
        id: user_id,
        login: login.to_string(),
        exp: now.as_secs() as i64 + TOKEN_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| ApiError::Internal(format!("Couldn't sign a token: {}", err)))
}

pub fn verify_token(secret: &str, token: &str) -> Result<UserClaim, ApiError> {
    decode::<UserClaim>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthenticated(String::from("Invalid or expired token")))
}

/// The acting user, resolved from the `authToken` cookie. Handlers that
/// take this as an argument reject unauthenticated requests with 401
/// before running.
#[derive(Debug)]
pub struct AuthedUser(pub UserClaim);

fn authenticate(req: &HttpRequest) -> Result<AuthedUser, ApiError> {
    let config = req
        .app_data::<web::Data<Config>>()
        .ok_or_else(|| ApiError::internal("Config is not registered on the app"))?;

    let cookie = req
        .cookie(AUTH_COOKIE)
        .ok_or_else(|| ApiError::Unauthenticated(String::from("Authentication required")))?;

    verify_token(&config.jwt_secret, cookie.value()).map(AuthedUser)
}

impl FromRequest for AuthedUser {
    type Error = ApiError;
    type Future = Ready<Result<AuthedUser, ApiError>>;
    type Config = ();

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

/// Authorization on top of authentication: the destructive channel
/// operations require the token's user to own the referenced channel.
pub fn assert_channel_owner(
    conn: &PgConnection,
    channel_id: i32,
    user_id: i32,
) -> Result<(), ApiError> {
    let owner: i32 = channels::table
        .find(channel_id)
        .select(channels::user_id)
        .first(conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => ApiError::not_found("Channel not found"),
            other => other.into(),
        })?;

    if owner != user_id {
        return Err(ApiError::Unauthorized(String::from(
            "You do not own this channel",
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;

    use super::*;

    fn test_config() -> Config {
        Config {
            bind_addr: String::from("127.0.0.1:0"),
            database_url: String::new(),
            jwt_secret: String::from("sekrit"),
            s3_endpoint: String::new(),
            s3_region: String::new(),
            s3_bucket: String::new(),
            s3_access_key: String::new(),
            s3_secret_key: String::new(),
            s3_public_base: String::new(),
        }
    }

    #[test]
    fn extractor_resolves_the_cookie_claim() {
        let token = sign_token("sekrit", 7, "bob").unwrap();
        let req = TestRequest::default()
            .data(test_config())
            .cookie(Cookie::new(AUTH_COOKIE, token))
            .to_http_request();

        let user = authenticate(&req).unwrap();
        assert_eq!(user.0.id, 7);
        assert_eq!(user.0.login, "bob");
    }

    #[test]
    fn missing_cookie_is_unauthenticated() {
        let req = TestRequest::default().data(test_config()).to_http_request();

        let err = authenticate(&req).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[test]
    fn sign_then_verify_round_trips_the_claim() {
        let token = sign_token("sekrit", 42, "alice").unwrap();
        let claim = verify_token("sekrit", &token).unwrap();

        assert_eq!(claim.id, 42);
        assert_eq!(claim.login, "alice");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign_token("sekrit", 42, "alice").unwrap();
        assert!(verify_token("other", &token).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = sign_token("sekrit", 42, "alice").unwrap();
        let tampered = format!("{}x", token);
        assert!(verify_token("sekrit", &tampered).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claim = UserClaim {
            id: 42,
            login: String::from("alice"),
            exp: 1_000, // long past
        };
        let token = encode(
            &Header::default(),
            &claim,
            &EncodingKey::from_secret(b"sekrit"),
        )
        .unwrap();

        let err = verify_token("sekrit", &token).unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }
}
