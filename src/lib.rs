use actix_web::{
    http::{header, StatusCode},
    HttpResponse, ResponseError,
};
use serde::Serialize;
use std::sync::Mutex;
use thiserror::Error;

pub mod activities;
pub mod authentication;
pub mod config;
pub mod handlers;
pub mod users;

use activities::ActivityRegistry;
use users::UserStore;

#[derive(Error, Debug)]
pub enum Error {
    /// The user file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The user file is not a valid user list.
    #[error("serde error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AlreadySignedUp(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("shared state lock poisoned")]
    LockPoisoned,
    #[error("internal error: {0}")]
    Internal(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// JSON body returned for every failed request.
#[derive(Serialize)]
struct ErrorDetail<'a> {
    detail: &'a str,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadySignedUp(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Io(_)
            | Error::Parse(_)
            | Error::LockPoisoned
            | Error::Internal(_)
            | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            Error::Unauthorized(s)
            | Error::NotFound(s)
            | Error::AlreadySignedUp(s)
            | Error::BadRequest(s)
            | Error::Forbidden(s) => s.clone(),
            _ => {
                log::error!("request failed: {}", self);
                "Internal server error".to_string()
            }
        };

        let mut response = HttpResponse::build(self.status_code());
        if let Error::Unauthorized(_) = self {
            response.insert_header((header::WWW_AUTHENTICATE, "Basic"));
        }
        response.json(ErrorDetail { detail: &detail })
    }
}

/// State shared by every worker of the HTTP server.
pub struct AppData {
    pub users: UserStore,
    pub activities: Mutex<ActivityRegistry>,
}

impl AppData {
    pub fn new(users: UserStore, activities: ActivityRegistry) -> Self {
        Self {
            users,
            activities: Mutex::new(activities),
        }
    }
}
