use super::{AppData, Error};
use crate::users::{User, UserStore};
use actix_web::{dev::Payload, http::header, web::Data, FromRequest, HttpRequest};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::future::{ready, Ready};
use subtle::ConstantTimeEq;

const NOT_AUTHENTICATED: &str = "Not authenticated";
const MALFORMED_CREDENTIALS: &str = "Invalid authentication credentials";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Credentials as supplied by the client.
#[derive(Debug, Clone)]
pub struct Login {
    pub username: String,
    pub password: String,
}

/// Parses the value of an `Authorization: Basic ...` header.
///
/// # Errors
/// * `Error::Unauthorized` - If the scheme is not `Basic`, the payload is not
///   base64 encoded UTF-8, or it has no `:` separator.
pub fn parse_basic_header(value: &str) -> Result<Login, Error> {
    let (scheme, encoded) = match value.trim().split_once(' ') {
        Some(v) => v,
        None => return Err(Error::Unauthorized(NOT_AUTHENTICATED.to_string())),
    };
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(Error::Unauthorized(NOT_AUTHENTICATED.to_string()));
    }

    let decoded = match STANDARD.decode(encoded.trim()) {
        Ok(v) => v,
        Err(_) => return Err(Error::Unauthorized(MALFORMED_CREDENTIALS.to_string())),
    };
    let decoded = match String::from_utf8(decoded) {
        Ok(v) => v,
        Err(_) => return Err(Error::Unauthorized(MALFORMED_CREDENTIALS.to_string())),
    };

    // Passwords may contain ':', usernames may not.
    match decoded.split_once(':') {
        Some((username, password)) => Ok(Login {
            username: username.to_string(),
            password: password.to_string(),
        }),
        None => Err(Error::Unauthorized(MALFORMED_CREDENTIALS.to_string())),
    }
}

/// Checks a login against the user store.
///
/// The password comparison runs in constant time with respect to the
/// password contents.
///
/// # Errors
/// * `Error::Unauthorized` - If the user is unknown or the password differs.
/// * `Error::Io` / `Error::Parse` - If the user file had to be re-read and failed.
pub fn verify_user(store: &UserStore, login: &Login) -> Result<User, Error> {
    let user = match store.find_by_username(&login.username)? {
        Some(v) => v,
        None => {
            log::debug!("login attempt for unknown user {}", login.username);
            return Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    if bool::from(user.password.as_bytes().ct_eq(login.password.as_bytes())) {
        Ok(user)
    } else {
        log::debug!("wrong password for user {}", login.username);
        Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()))
    }
}

/// The user behind a request's Basic credentials.
///
/// Using this as a handler argument makes the route require authentication.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, Error> {
    let data = match req.app_data::<Data<AppData>>() {
        Some(v) => v,
        None => return Err(Error::Internal("application state not configured".to_string())),
    };

    let value = match req.headers().get(header::AUTHORIZATION) {
        Some(v) => v,
        None => return Err(Error::Unauthorized(NOT_AUTHENTICATED.to_string())),
    };
    let value = match value.to_str() {
        Ok(v) => v,
        Err(_) => return Err(Error::Unauthorized(MALFORMED_CREDENTIALS.to_string())),
    };

    let login = parse_basic_header(value)?;
    verify_user(&data.users, &login).map(AuthenticatedUser)
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
