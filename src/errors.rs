use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;
use thiserror::Error;

/// Error taxonomy for the whole API surface. Every handler returns
/// `Result<HttpResponse, ApiError>` and the mapping to HTTP status codes
/// lives here and nowhere else.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidParameter(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid(msg: &str) -> ApiError {
        ApiError::InvalidParameter(msg.to_string())
    }

    pub fn not_found(msg: &str) -> ApiError {
        ApiError::NotFound(msg.to_string())
    }

    pub fn internal(msg: &str) -> ApiError {
        ApiError::Internal(msg.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(msg) = self {
            log::error!("internal error: {}", msg);
        }

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> ApiError {
        match err {
            DieselError::NotFound => ApiError::NotFound(String::from("Not found")),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ApiError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                ApiError::InvalidParameter(info.message().to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for ApiError {
    fn from(err: diesel::r2d2::PoolError) -> ApiError {
        ApiError::Internal(format!("Couldn't get a database connection: {}", err))
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> ApiError {
        ApiError::Internal(format!("Password hashing failed: {}", err))
    }
}

impl From<s3::S3Error> for ApiError {
    fn from(err: s3::S3Error) -> ApiError {
        ApiError::Internal(format!("Object storage request failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::ResponseError;

    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_status_codes() {
        let cases = vec![
            (ApiError::invalid("bad page"), 400),
            (ApiError::Unauthenticated(String::from("no token")), 401),
            (ApiError::Unauthorized(String::from("not the owner")), 403),
            (ApiError::not_found("no such video"), 404),
            (ApiError::Conflict(String::from("duplicate pair")), 409),
            (ApiError::internal("storage down"), 500),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code().as_u16(), expected);
        }
    }

    #[test]
    fn missing_row_becomes_not_found() {
        let err: ApiError = DieselError::NotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let err: ApiError = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(String::from("duplicate key value")),
        )
        .into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn error_body_is_the_message_only() {
        let err = ApiError::invalid("Page and limit must be positive numbers");
        assert_eq!(
            err.to_string(),
            "Page and limit must be positive numbers"
        );
    }
}
