use actix_web::{error::ResponseError, HttpResponse};
use derive_more::Display;
use diesel::result::{DatabaseErrorKind, Error as DBError};
use std::convert::From;

#[derive(Debug, Display, PartialEq)]
pub enum ServiceError {
    #[display(fmt = "Internal Server Error")]
    InternalServerError,

    #[display(fmt = "BadRequest: {}", _0)]
    BadRequest(String),

    #[display(fmt = "Conflict: {}", _0)]
    Conflict(String),

    #[display(fmt = "Forbidden: {}", _0)]
    Forbidden(String),

    #[display(fmt = "Unauthorized")]
    Unauthorized,

    #[display(fmt = "Not Found")]
    NotFound,
}

impl std::error::Error for ServiceError {}

// impl ResponseError trait allows to convert our errors into http responses with appropriate data
impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::InternalServerError => {
                HttpResponse::InternalServerError().json("Internal Server Error, Please try later")
            }
            ServiceError::BadRequest(ref message) => HttpResponse::BadRequest().json(message),
            ServiceError::Conflict(ref message) => HttpResponse::Conflict().json(message),
            ServiceError::Forbidden(ref message) => HttpResponse::Forbidden().json(message),
            ServiceError::Unauthorized => HttpResponse::Unauthorized().json("Unauthorized"),
            ServiceError::NotFound => HttpResponse::NotFound().json("Not Found"),
        }
    }
}

impl From<DBError> for ServiceError {
    fn from(error: DBError) -> ServiceError {
        match error {
            DBError::NotFound => ServiceError::NotFound,
            DBError::DatabaseError(kind, info) => {
                if let DatabaseErrorKind::UniqueViolation = kind {
                    let message = info.details().unwrap_or_else(|| info.message()).to_string();
                    return ServiceError::Conflict(message);
                }
                error!("db error: {:?} {:?}", kind, info);
                ServiceError::InternalServerError
            }
            _ => {
                error!("db error: {}", error);
                ServiceError::InternalServerError
            }
        }
    }
}

impl From<r2d2::Error> for ServiceError {
    fn from(error: r2d2::Error) -> ServiceError {
        error!("r2d2 connection pool error: {}", error);
        ServiceError::InternalServerError
    }
}

impl From<argon2::Error> for ServiceError {
    fn from(error: argon2::Error) -> ServiceError {
        error!("argon2 hashing error: {}", error);
        ServiceError::InternalServerError
    }
}

// `web::block` wraps our errors; unpack them so business rejections keep
// their status code instead of collapsing into a 500
impl From<actix_threadpool::BlockingError<ServiceError>> for ServiceError {
    fn from(error: actix_threadpool::BlockingError<ServiceError>) -> ServiceError {
        match error {
            actix_threadpool::BlockingError::Error(e) => e,
            actix_threadpool::BlockingError::Canceled => {
                error!("actix threadpool canceled a blocking operation");
                ServiceError::InternalServerError
            }
        }
    }
}
