use super::{AppData, Error};
use crate::authentication::AuthenticatedUser;
use actix_web::{
    http::header,
    web::{self, delete, get, post, Data, Path, Query},
    HttpResponse,
};
use serde::{Deserialize, Serialize};

/// Where `GET /` sends browsers.
pub const INDEX_PAGE: &str = "/static/index.html";

#[derive(Serialize, Deserialize, Debug)]
pub struct Message {
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct UnregisterQuery {
    pub target_email: Option<String>,
}

/// Registers every route on an actix `App`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", get().to(root))
        .route("/activities", get().to(list_activities))
        .route("/activities/{activity_name}/signup", post().to(signup))
        .route("/activities/{activity_name}/unregister", delete().to(unregister));
}

async fn root() -> HttpResponse {
    HttpResponse::TemporaryRedirect()
        .insert_header((header::LOCATION, INDEX_PAGE))
        .finish()
}

async fn list_activities(data: Data<AppData>) -> Result<HttpResponse, Error> {
    let activities = data
        .activities
        .lock()
        .map_err(|_| Error::LockPoisoned)?
        .list_all();
    Ok(HttpResponse::Ok().json(activities))
}

async fn signup(
    user: AuthenticatedUser,
    activity_name: Path<String>,
    data: Data<AppData>,
) -> Result<HttpResponse, Error> {
    let activity_name = activity_name.into_inner();
    let email = user.0.email();

    data.activities
        .lock()
        .map_err(|_| Error::LockPoisoned)?
        .signup(&activity_name, &email)?;

    log::info!("{} signed up for {}", email, activity_name);
    Ok(HttpResponse::Ok().json(Message {
        message: format!("Signed up {} for {}", email, activity_name),
    }))
}

async fn unregister(
    user: AuthenticatedUser,
    activity_name: Path<String>,
    query: Query<UnregisterQuery>,
    data: Data<AppData>,
) -> Result<HttpResponse, Error> {
    let activity_name = activity_name.into_inner();
    let user = user.0;

    let removed = data
        .activities
        .lock()
        .map_err(|_| Error::LockPoisoned)?
        .unregister(
            &activity_name,
            &user.email(),
            user.role,
            query.target_email.as_deref(),
        )?;

    log::info!(
        "{} unregistered {} from {}",
        user.username,
        removed,
        activity_name
    );
    Ok(HttpResponse::Ok().json(Message {
        message: format!("Unregistered {} from {}", removed, activity_name),
    }))
}
