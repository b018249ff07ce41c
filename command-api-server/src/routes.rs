use std::sync::{Arc, Mutex};

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use command_api::api::{
    Command, CommandBody, CommandId, ErrorResponse, InfoResponse, StoreKind, VERSION,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::controller::{CommandsController, Outcome};
use crate::store::{RecordStore, StoreError};

/// Shared by all requests, the mutex serializes access to the store.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<dyn RecordStore>>,
    kind: StoreKind,
}

impl AppState {
    pub fn new<S: RecordStore + 'static>(store: S) -> Self {
        let kind = store.kind();
        Self {
            store: Arc::new(Mutex::new(store)),
            kind,
        }
    }

    /// Runs `op` against the store on the blocking pool, holding the lock for its whole duration.
    async fn run<T, F>(&self, op: F) -> Result<T, ApiFailure>
    where
        T: Send + 'static,
        F: FnOnce(&mut CommandsController<'_>) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let joined = tokio::task::spawn_blocking(move || -> Result<T, StoreError> {
            let mut guard = store.lock()?;
            let mut controller = CommandsController::new(&mut *guard);
            op(&mut controller)
        })
        .await;

        match joined {
            Ok(result) => result.map_err(ApiFailure::Store),
            Err(e) => Err(ApiFailure::Join(e.to_string())),
        }
    }
}

/// The whole application, including the health check and request tracing.
pub fn app(state: AppState) -> Router {
    log::info!(path = "/api"; "nesting sub-routes");
    Router::new()
        .nest("/api", routes())
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes under `/api`.
fn routes() -> Router<AppState> {
    Router::new()
        .route("/info", get(info))
        .route("/commands", get(list_commands).post(create_command))
        .route(
            "/commands/:id",
            get(get_command).put(update_command).delete(delete_command),
        )
}

/// Any failure that is not one of the controller outcomes.
#[derive(Debug)]
pub enum ApiFailure {
    /// The request could not be extracted, e.g. malformed json or a non-integer id.
    Rejected { status: StatusCode, message: String },
    Store(StoreError),
    Join(String),
}

impl From<JsonRejection> for ApiFailure {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiFailure {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiFailure::Rejected { status, message } => {
                log::debug!(status = status.as_u16(); "rejected request: {message}");
                (status, "invalid_request", message)
            }
            ApiFailure::Store(e) => {
                log::error!(e:debug; "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_failure",
                    e.to_string(),
                )
            }
            ApiFailure::Join(message) => {
                log::error!("store task failed: {message}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        error_response(status, code, message)
    }
}

impl<T: Serialize> IntoResponse for Outcome<T> {
    fn into_response(self) -> Response {
        match self {
            Outcome::Ok(value) => Json(value).into_response(),
            Outcome::Created { location, value } => {
                (StatusCode::CREATED, [(header::LOCATION, location)], Json(value)).into_response()
            }
            Outcome::NoContent => StatusCode::NO_CONTENT.into_response(),
            Outcome::Deleted => StatusCode::OK.into_response(),
            Outcome::NotFound => StatusCode::NOT_FOUND.into_response(),
            Outcome::BadRequest(reason) => {
                error_response(StatusCode::BAD_REQUEST, "id_mismatch", reason)
            }
        }
    }
}

fn error_response(status: StatusCode, code: &str, message: String) -> Response {
    let body = ErrorResponse {
        code: String::from(code),
        message,
    };
    (status, Json(body)).into_response()
}

async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    log::debug!("sending info");
    Json(InfoResponse {
        api_version: String::from(VERSION),
        store: state.kind,
    })
}

async fn list_commands(State(state): State<AppState>) -> Result<Json<Vec<Command>>, ApiFailure> {
    let commands = state.run(|controller| controller.list()).await?;
    log::debug!(count = commands.len(); "listing commands");
    Ok(Json(commands))
}

async fn get_command(
    State(state): State<AppState>,
    id: Result<Path<CommandId>, PathRejection>,
) -> Result<Outcome<Command>, ApiFailure> {
    let Path(id) = id?;
    log::debug!(id:display; "fetching command");
    state.run(move |controller| controller.get(id)).await
}

async fn create_command(
    State(state): State<AppState>,
    body: Result<Json<CommandBody>, JsonRejection>,
) -> Result<Outcome<Command>, ApiFailure> {
    let Json(body) = body?;
    log::debug!("creating command: {:?}", body.fields);
    state.run(move |controller| controller.create(body)).await
}

async fn update_command(
    State(state): State<AppState>,
    id: Result<Path<CommandId>, PathRejection>,
    body: Result<Json<CommandBody>, JsonRejection>,
) -> Result<Outcome<()>, ApiFailure> {
    let Path(id) = id?;
    let Json(body) = body?;
    log::debug!(id:display; "updating command: {:?}", body.fields);
    state.run(move |controller| controller.update(id, body)).await
}

async fn delete_command(
    State(state): State<AppState>,
    id: Result<Path<CommandId>, PathRejection>,
) -> Result<Outcome<()>, ApiFailure> {
    let Path(id) = id?;
    log::debug!(id:display; "deleting command");
    state.run(move |controller| controller.delete(id)).await
}
