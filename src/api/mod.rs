//! HTTP surface: router, middleware stack and server loop.

use anyhow::{Context, Result, anyhow};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Method, Request, header::CONTENT_TYPE},
    routing::{get, options},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use url::Url;
use utoipa_axum::router::OpenApiRouter;

use crate::delivery::CodeSenders;
use crate::verification::{FlowRegistry, LookupService};

pub mod handlers;
mod openapi;

pub use openapi::openapi;

use handlers::{health, root};

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Shared state handed to every handler as an `Extension`.
#[derive(Clone)]
pub struct Services {
    pub registry: Arc<FlowRegistry>,
    pub lookup: Arc<LookupService>,
    pub senders: Arc<CodeSenders>,
}

impl Services {
    #[must_use]
    pub fn new(registry: FlowRegistry, lookup: LookupService, senders: CodeSenders) -> Self {
        Self {
            registry: Arc::new(registry),
            lookup: Arc::new(lookup),
            senders: Arc::new(senders),
        }
    }
}

/// Assemble the application with its middleware stack.
///
/// Without an allowed origin, CORS accepts any origin.
///
/// # Errors
/// Returns an error if the allowed origin is not a valid URL.
pub fn app(services: &Services, allowed_origin: Option<&str>) -> Result<Router> {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);
    let cors = match allowed_origin {
        Some(origin) => cors.allow_origin(AllowOrigin::exact(frontend_origin(origin)?)),
        None => cors.allow_origin(Any),
    };

    let (router, _openapi) = router().split_for_parts();
    let app = router
        .route("/", get(root::root))
        .route("/health", options(health::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(services.registry.clone()))
                .layer(Extension(services.lookup.clone()))
                .layer(Extension(services.senders.clone())),
        );

    Ok(app)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, services: Services, allowed_origin: Option<String>) -> Result<()> {
    let app = app(&services, allowed_origin.as_deref())?;

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn frontend_origin(frontend_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_url)
        .with_context(|| format!("Invalid allowed origin: {frontend_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Allowed origin must include a valid host: {frontend_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build allowed origin header")
}
