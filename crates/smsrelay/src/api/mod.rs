//! HTTP API under `/api`.

mod email;
mod error;
mod filters;
mod health;
mod sms;

use std::future::Future;

use axum::Router;
use axum::extract::Request;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use tokio::net::TcpListener;
use tracing::info;

use smsrelay_core::ForwardService;

pub use error::{ApiError, ApiJson, ApiQuery, ApiResult};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    service: ForwardService,
}

impl AppState {
    /// Wraps the forwarding service.
    #[must_use]
    pub const fn new(service: ForwardService) -> Self {
        Self { service }
    }

    /// The forwarding service.
    #[must_use]
    pub const fn service(&self) -> &ForwardService {
        &self.service
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &smsrelay_core::Store {
        self.service.store()
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api", get(health::root))
        .route("/api/", get(health::root))
        .route("/api/health", get(health::health))
        .route("/api/sms/forward", post(sms::forward))
        .route("/api/sms/messages", get(sms::messages))
        .route("/api/sms/stats", get(sms::stats))
        .route(
            "/api/email/config",
            get(email::get_config).post(email::save_config),
        )
        .route("/api/email/test", post(email::send_test))
        .route("/api/filters", get(filters::list).post(filters::create))
        .route("/api/filters/{id}", put(filters::update).delete(filters::delete))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Serves the API on `listener` until `shutdown` resolves, then drains
/// in-flight requests.
///
/// # Errors
///
/// Returns an I/O error if the server fails.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

const ALLOWED_METHODS: &str = "DELETE, GET, HEAD, OPTIONS, PATCH, POST, PUT";

/// Permissive CORS: every origin, method and header is allowed.
async fn cors(request: Request, next: Next) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();
    let preflight = request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);

    let mut response = if preflight {
        let requested_headers = request
            .headers()
            .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
            .cloned();
        let mut response = StatusCode::NO_CONTENT.into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        if let Some(requested) = requested_headers {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested);
        }
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("600"));
        response
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    match origin {
        Some(origin) => {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
            headers.append(header::VARY, HeaderValue::from_static("Origin"));
        }
        None => {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
        }
    }
    response
}
