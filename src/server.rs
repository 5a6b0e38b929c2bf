use crate::contact::{ContactLog, ContactMessage};
use crate::error::{ContactError, StatsError};
use crate::stats::StatsSummary;
use crate::view::StatsView;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Build, Request, Rocket, State, catch, catchers, get, post, routes};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, warn};

pub struct ServerState {
    pub view: StatsView,
    pub contacts: ContactLog,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (Status, Json<ErrorBody>);

fn api_error(status: Status, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

impl From<StatsError> for ApiError {
    fn from(e: StatsError) -> Self {
        let status = match e {
            StatsError::InvalidInput(_) => Status::BadRequest,
            _ => Status::InternalServerError,
        };
        api_error(status, e.to_string())
    }
}

#[get("/github?<username>&<refresh>")]
pub async fn github_stats(
    username: Option<&str>,
    refresh: Option<bool>,
    state: &State<ServerState>,
) -> Result<Json<StatsSummary>, ApiError> {
    let result = match username {
        Some(u) if refresh.unwrap_or(false) && !u.trim().is_empty() => {
            Some(state.view.retry(u).await)
        }
        u => state.view.load(u).await,
    };

    match result {
        None => Err(api_error(Status::BadRequest, "Username parameter is required")),
        Some(Ok(summary)) => Ok(Json(StatsSummary::clone(&summary))),
        Some(Err(e)) => Err(e.into()),
    }
}

#[post("/contact", format = "json", data = "<message>")]
pub async fn submit_contact(
    message: Json<ContactMessage>,
    state: &State<ServerState>,
) -> Result<Json<Value>, ApiError> {
    match state.contacts.submit(message.into_inner()).await {
        Ok(_) => Ok(Json(json!({ "message": "Contact form submitted successfully." }))),
        Err(ContactError::InvalidInput(msg)) => Err(api_error(Status::BadRequest, msg)),
        Err(e) => {
            error!("Error processing contact form: {e}");
            Err(api_error(
                Status::InternalServerError,
                "Internal Server Error! Please try again later.",
            ))
        }
    }
}

#[get("/health")]
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "portfolio-stats"
    }))
}

/// Body that failed to parse as JSON.
#[catch(400)]
pub fn bad_request(req: &Request<'_>) -> Json<ErrorBody> {
    error_body(req, "Request body is not valid JSON")
}

#[catch(413)]
pub fn payload_too_large(req: &Request<'_>) -> Json<ErrorBody> {
    error_body(req, "Request body is too large")
}

/// Well-formed JSON of the wrong shape.
#[catch(422)]
pub fn unprocessable(req: &Request<'_>) -> Json<ErrorBody> {
    error_body(req, "Request body has invalid fields")
}

fn error_body(req: &Request<'_>, message: &str) -> Json<ErrorBody> {
    warn!("Rejected {} {}: {message}", req.method(), req.uri());
    Json(ErrorBody {
        error: message.to_string(),
    })
}

pub fn build_rocket(state: ServerState) -> Rocket<Build> {
    rocket::build()
        .manage(state)
        .mount("/api", routes![github_stats, submit_contact, health_check])
        .register("/api", catchers![bad_request, payload_too_large, unprocessable])
}
