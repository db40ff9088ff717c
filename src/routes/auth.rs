use actix_web::cookie::Cookie;
use actix_web::{get, post, web, HttpMessage, HttpRequest, HttpResponse};
use bcrypt::{hash, verify};
use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::config::Config;
use crate::db::DbPool;
use crate::errors::ApiError;
use crate::helpers::auth::{sign_token, verify_token, AUTH_COOKIE, TOKEN_TTL_SECS};
use crate::models::{NewUser, User};
use crate::schema::users;

const BCRYPT_COST: u32 = 8;

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, token)
        .path("/")
        .http_only(true)
        .max_age(Duration::seconds(TOKEN_TTL_SECS))
        .finish()
}

fn cleared_session_cookie() -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, "")
        .path("/")
        .http_only(true)
        .max_age(Duration::seconds(0))
        .finish()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpBody {
    login: String,
    password: String,
    password_confirmation: String,
}

#[derive(Serialize)]
struct MessageBody {
    message: &'static str,
}

#[post("/sign_up")]
pub async fn sign_up(
    pool: web::Data<DbPool>,
    data: web::Json<SignUpBody>,
) -> Result<HttpResponse, ApiError> {
    if data.login.is_empty() || data.password.is_empty() {
        return Err(ApiError::invalid("Missing required fields"));
    }

    if data.password != data.password_confirmation {
        return Err(ApiError::invalid("Passwords do not match"));
    }

    let conn = pool.get()?;
    let conn = &*conn;

    let existing: i64 = users::table
        .filter(users::login.eq(&data.login))
        .count()
        .get_result(conn)?;

    if existing > 0 {
        return Err(ApiError::Conflict(String::from("Login already exists")));
    }

    let hashed_password = hash(&data.password, BCRYPT_COST)?;

    let new_user = NewUser {
        login: &data.login,
        password: &hashed_password,
    };

    diesel::insert_into(users::table)
        .values(&new_user)
        .execute(conn)?;

    Ok(HttpResponse::Created().json(MessageBody {
        message: "User created successfully",
    }))
}

#[derive(Deserialize)]
pub struct SignInBody {
    login: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    message: &'static str,
    user_id: i32,
    login: String,
}

#[post("/sign_in")]
pub async fn sign_in(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    data: web::Json<SignInBody>,
) -> Result<HttpResponse, ApiError> {
    if data.login.is_empty() || data.password.is_empty() {
        return Err(ApiError::invalid("Login and password are required"));
    }

    let conn = pool.get()?;
    let conn = &*conn;

    let user: User = users::table
        .filter(users::login.eq(&data.login))
        .first(conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => {
                ApiError::Unauthenticated(format!("User with login {} does not exist", data.login))
            }
            other => other.into(),
        })?;

    let password_match = verify(&data.password, &user.password)?;

    if !password_match {
        return Err(ApiError::Unauthenticated(String::from("Wrong password")));
    }

    let token = sign_token(&config.jwt_secret, user.id, &user.login)?;

    let cookie = session_cookie(token);

    Ok(HttpResponse::Ok().cookie(cookie).json(SignInResponse {
        message: "Sign in successful",
        user_id: user.id,
        login: user.login,
    }))
}

#[post("/sign_out")]
pub async fn sign_out(
    req: HttpRequest,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let cookie = req
        .cookie(AUTH_COOKIE)
        .ok_or_else(|| ApiError::Unauthenticated(String::from("Authentication required")))?;

    verify_token(&config.jwt_secret, cookie.value())?;

    let cleared = cleared_session_cookie();

    Ok(HttpResponse::Ok().cookie(cleared).json(MessageBody {
        message: "Sign out successful",
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckTokenResponse {
    is_auth: bool,
}

#[get("/check_token")]
pub async fn check_token(
    req: HttpRequest,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let valid = req
        .cookie(AUTH_COOKIE)
        .map(|cookie| verify_token(&config.jwt_secret, cookie.value()).is_ok())
        .unwrap_or(false);

    if valid {
        Ok(HttpResponse::Ok().json(CheckTokenResponse { is_auth: true }))
    } else {
        Ok(HttpResponse::Unauthorized().json(CheckTokenResponse { is_auth: false }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_scoped_to_the_site_root() {
        let cookie = session_cookie(String::from("tok"));

        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(TOKEN_TTL_SECS)));
    }

    #[test]
    fn sign_out_cookie_expires_immediately() {
        let cookie = cleared_session_cookie();

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::seconds(0)));
    }
}
