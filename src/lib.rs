use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod store;

// Route groups by access tier (public, authenticated, admin).
pub mod routes;
use routes::{admin, authenticated, public};

use auth::AuthUser;
use models::Role;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use store::Store;

/// ApiDoc
///
/// OpenAPI document for every handler and schema, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::authenticate,
        handlers::get_users, handlers::get_user, handlers::post_user,
        handlers::put_user, handlers::delete_user, handlers::set_user_role,
        handlers::get_hotels, handlers::get_hotel, handlers::get_hotel_rooms,
        handlers::post_hotel, handlers::put_hotel,
        handlers::get_rooms, handlers::post_room, handlers::reconcile_rooms,
        handlers::book_room, handlers::get_my_bookings, handlers::get_booking,
        handlers::cancel_booking, handlers::get_bookings, handlers::confirm_booking
    ),
    components(
        schemas(
            models::User, models::Role, models::Hotel, models::Room, models::RoomSize,
            models::Booking, models::BookingStatus, models::AuthRequest, models::AuthResponse,
            models::CreateUserRequest, models::UpdateUserRequest, models::UpdateRoleRequest,
            models::CreateHotelRequest, models::UpdateHotelRequest, models::CreateRoomRequest,
            models::BookRoomRequest, models::ResourceResponse, models::ReconcileReport,
            error::ErrorBody,
        )
    ),
    tags(
        (name = "hotel-booking", description = "Hotel Reservation API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared by every request: the store bundle and the immutable configuration.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: Store, config: AppConfig) -> Self {
        Self { store, config }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for Store {
    fn from_ref(app_state: &AppState) -> Store {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Runs the `AuthUser` pipeline once for the whole `/api/v1` group. A failure
/// rejects the request with the generic 401 before any handler runs; a success
/// stores the identity in the request extensions for the handlers to reuse.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// admin_middleware
///
/// Role gate for the `/api/v1/admin` group. Layered inside `auth_middleware`,
/// so the identity is already resolved.
async fn admin_middleware(
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    auth::authorize(&auth_user, Role::Admin)?;
    Ok(next.run(request).await)
}

/// deadline_middleware
///
/// Bounds every request by the configured timeout. An expired request is answered
/// with 504 and its handler future is dropped.
async fn deadline_middleware(
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let uri = request.uri().clone();
    tokio::time::timeout(config.request_timeout, next.run(request))
        .await
        .map_err(|_| {
            tracing::warn!(%uri, timeout_ms = config.request_timeout.as_millis() as u64, "request deadline exceeded");
            AppError::Timeout
        })
}

/// create_router
///
/// Assembles the route groups, their auth layers, the documentation, and the
/// observability stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // /api/v1: every route needs an identity; /api/v1/admin additionally needs the admin role.
    let api_v1 = authenticated::authenticated_routes()
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                admin_middleware,
            )),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .nest("/api/v1", api_v1)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            deadline_middleware,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request, tagged with its `x-request-id` so every log line of the
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
