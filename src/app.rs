//! The axum application.
//!
//! # Examples
//!
//! Create an item, then fetch it.
//!
//! ```rust
//! # use axum::body::Body;
//! # use http::{Request, StatusCode};
//! # use inventory_manager::{
//! #     app::app,
//! #     domain::item::item_repository::InMemoryItemRepository,
//! #     infra::{config::{InventoryConfig, ServerConfig}, state::AppState},
//! # };
//! # use tower::ServiceExt;
//! # tokio_test::block_on(async {
//! let state = AppState::new(InMemoryItemRepository::new(), InventoryConfig::default());
//! let server = ServerConfig {
//!     http_address: "127.0.0.1".to_string(),
//!     http_port: 0,
//!     request_timeout_secs: 10,
//!     cors_allowed_origins: vec![],
//! };
//! let app = app(state, &server);
//!
//! let req = Request::post("/api/items")
//!     .header("Content-Type", "application/json")
//!     .body(Body::from(r#"{"name": "Widget", "quantity": 3, "price": 2.5}"#))
//!     .unwrap();
//! let res = app.clone().oneshot(req).await.unwrap();
//! assert_eq!(StatusCode::CREATED, res.status());
//!
//! let req = Request::get("/api/items/1").body(Body::empty()).unwrap();
//! let res = app.oneshot(req).await.unwrap();
//! assert_eq!(StatusCode::OK, res.status());
//! # });
//! ```

use crate::infra::{
    config::ServerConfig,
    error::{InternalError, PanicHandler},
    middleware::{log_request_response, MakeRequestIdSpan},
    openapi::ApiDoc,
    shutdown::shutdown_signal,
    state::AppState,
};
use axum::{
    error_handling::HandleErrorLayer, response::IntoResponse, response::Redirect, routing::get,
    Router,
};
use http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method, StatusCode,
};
use std::{iter, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
    timeout::TimeoutLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

/// The maximum number of requests handled at once.
const CONCURRENCY_LIMIT: usize = 500;

/// Constructs the full axum application.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    // Fallible middleware from tower, mapped to infallible response with [`HandleErrorLayer`].
    let tower_middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|e| async move {
            InternalError::Other(format!("Tower middleware failed: {e}")).into_response()
        }))
        .concurrency_limit(CONCURRENCY_LIMIT);

    Router::new()
        .route("/", get(|| async { Redirect::permanent("/api/swagger-ui") }))
        .merge(SwaggerUi::new("/api/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .merge(Redoc::with_url("/api/redoc", ApiDoc::openapi()))
        .merge(RapiDoc::new("/api/openapi.json").path("/api/rapidoc"))
        .nest("/api", crate::api::api(state))
        // Layers
        .layer(timeout(Duration::from_secs(config.request_timeout_secs)))
        .layer(axum::middleware::from_fn(log_request_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(MakeRequestIdSpan)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(()),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(SetSensitiveRequestHeadersLayer::new(iter::once(
            AUTHORIZATION,
        )))
        .layer(tower_middleware)
        .layer(CatchPanicLayer::custom(PanicHandler))
        .layer(cors(&config.cors_allowed_origins))
}

/// Aborts requests that take longer than `limit`.
fn timeout(limit: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, limit)
}

/// Allows browsers on the given origins to call the API.
fn cors(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(origin) => Some(origin),
            Err(e) => {
                tracing::warn!("Ignoring CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
}

/// Starts the axum server.
pub async fn run_app(
    listener: TcpListener,
    state: AppState,
    config: ServerConfig,
) -> std::io::Result<()> {
    let app = app(state, &config);

    tracing::info!("Starting axum on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Successfully shut down");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::info::info_api::AppInfo,
        domain::item::{item_model::ItemResponse, item_repository::InMemoryItemRepository},
        infra::{config::InventoryConfig, error::ErrorBody},
    };
    use axum::body::Body;
    use http::{Request, Response};
    use http_body_util::BodyExt;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let state = AppState::new(InMemoryItemRepository::new(), InventoryConfig::default());
        let config = ServerConfig {
            http_address: "127.0.0.1".to_string(),
            http_port: 0,
            request_timeout_secs: 10,
            cors_allowed_origins: vec!["http://localhost:4200".to_string()],
        };
        app(state, &config)
    }

    async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
        app.clone().oneshot(req).await.unwrap()
    }

    async fn json<T: DeserializeOwned>(res: Response<Body>) -> T {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn put(uri: &str, body: &str) -> Request<Body> {
        Request::put(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    async fn create(app: &Router, name: &str, quantity: i32, price: f64) -> ItemResponse {
        let body = serde_json::json!({ "name": name, "quantity": quantity, "price": price });
        let res = send(app, post("/api/items", &body.to_string())).await;
        assert_eq!(StatusCode::CREATED, res.status());
        json(res).await
    }

    fn names(items: &[ItemResponse]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[tokio::test]
    async fn create_then_get_returns_same_item() {
        let app = test_app();
        let res = send(
            &app,
            post(
                "/api/items",
                r#"{"name": "Widget", "description": "Blue", "quantity": 3, "price": 2.5}"#,
            ),
        )
        .await;
        assert_eq!(StatusCode::CREATED, res.status());
        assert!(res.headers().contains_key("x-request-id"));
        let created: ItemResponse = json(res).await;
        assert_eq!(
            ItemResponse {
                id: 1,
                name: "Widget".to_string(),
                description: Some("Blue".to_string()),
                quantity: 3,
                price: 2.5,
            },
            created
        );

        let res = send(&app, get("/api/items/1")).await;
        assert_eq!(StatusCode::OK, res.status());
        assert_eq!(created, json::<ItemResponse>(res).await);
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let app = test_app();
        create(&app, "Cheap", 1, 10.0).await;
        create(&app, "Pricey", 1, 50.0).await;
        create(&app, "Middle", 1, 30.0).await;

        let res = send(&app, get("/api/items?minPrice=20&sortBy=price&order=asc")).await;
        assert_eq!(StatusCode::OK, res.status());
        let items: Vec<ItemResponse> = json(res).await;
        assert_eq!(vec!["Middle", "Pricey"], names(&items));

        let res = send(&app, get("/api/items?maxPrice=30&sortBy=price&order=DESC")).await;
        let items: Vec<ItemResponse> = json(res).await;
        assert_eq!(vec!["Middle", "Cheap"], names(&items));

        let res = send(&app, get("/api/items?sortBy=colour&order=desc")).await;
        let items: Vec<ItemResponse> = json(res).await;
        assert_eq!(vec!["Middle", "Pricey", "Cheap"], names(&items));

        let res = send(&app, get("/api/items")).await;
        let items: Vec<ItemResponse> = json(res).await;
        assert_eq!(vec!["Cheap", "Pricey", "Middle"], names(&items));
    }

    #[tokio::test]
    async fn list_with_bad_price_is_bad_request() {
        let app = test_app();
        let res = send(&app, get("/api/items?minPrice=cheap")).await;
        assert_eq!(StatusCode::BAD_REQUEST, res.status());
    }

    #[tokio::test]
    async fn low_stock_uses_configured_default_threshold() {
        let app = test_app();
        create(&app, "Five", 5, 1.0).await;
        create(&app, "Six", 6, 1.0).await;
        create(&app, "Zero", 0, 1.0).await;

        let res = send(&app, get("/api/items/low-stock")).await;
        assert_eq!(StatusCode::OK, res.status());
        let items: Vec<ItemResponse> = json(res).await;
        assert_eq!(vec!["Five", "Zero"], names(&items));

        let res = send(&app, get("/api/items/low-stock?threshold=6")).await;
        let items: Vec<ItemResponse> = json(res).await;
        assert_eq!(3, items.len());

        let res = send(&app, get("/api/items/low-stock?threshold=-1")).await;
        let items: Vec<ItemResponse> = json(res).await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn missing_item_is_not_found() {
        let app = test_app();
        let res = send(&app, get("/api/items/999")).await;
        assert_eq!(StatusCode::NOT_FOUND, res.status());
        let body: ErrorBody = json(res).await;
        assert_eq!(404, body.status());
        assert_eq!("Item not found with id 999", body.message());
    }

    #[tokio::test]
    async fn update_replaces_every_field() {
        let app = test_app();
        let created = create(&app, "Widget", 3, 2.5).await;

        let res = send(
            &app,
            put(
                &format!("/api/items/{}", created.id),
                r#"{"name": "Gadget", "quantity": 0, "price": 4.0}"#,
            ),
        )
        .await;
        assert_eq!(StatusCode::OK, res.status());
        let updated: ItemResponse = json(res).await;
        let expected = ItemResponse {
            id: created.id,
            name: "Gadget".to_string(),
            description: None,
            quantity: 0,
            price: 4.0,
        };
        assert_eq!(expected, updated);

        let res = send(&app, get(&format!("/api/items/{}", created.id))).await;
        assert_eq!(expected, json::<ItemResponse>(res).await);
    }

    #[tokio::test]
    async fn update_missing_item_is_not_found() {
        let app = test_app();
        let res = send(
            &app,
            put("/api/items/999", r#"{"name": "Gadget", "quantity": 0, "price": 4.0}"#),
        )
        .await;
        assert_eq!(StatusCode::NOT_FOUND, res.status());
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let app = test_app();
        let created = create(&app, "Widget", 3, 2.5).await;
        let uri = format!("/api/items/{}", created.id);

        let req = Request::delete(uri.as_str()).body(Body::empty()).unwrap();
        let res = send(&app, req).await;
        assert_eq!(StatusCode::NO_CONTENT, res.status());

        let res = send(&app, get(&uri)).await;
        assert_eq!(StatusCode::NOT_FOUND, res.status());

        let req = Request::delete(uri.as_str()).body(Body::empty()).unwrap();
        let res = send(&app, req).await;
        assert_eq!(StatusCode::NOT_FOUND, res.status());
    }

    #[tokio::test]
    async fn invalid_fields_are_bad_request() {
        let app = test_app();
        let res = send(
            &app,
            post("/api/items", r#"{"name": " ", "quantity": -1, "price": 1.0}"#),
        )
        .await;
        assert_eq!(StatusCode::BAD_REQUEST, res.status());
        let body: ErrorBody = json(res).await;
        assert_eq!(
            "name: Name is required; quantity: Quantity must be >= 0",
            body.message()
        );
    }

    #[tokio::test]
    async fn missing_or_null_required_field_is_bad_request() {
        let app = test_app();
        let bodies = [
            (r#"{"name": "Widget", "price": 1.0}"#, "quantity"),
            (r#"{"quantity": 1, "price": 1.0}"#, "name"),
            (r#"{"name": "Widget", "quantity": 1, "price": null}"#, "price"),
        ];
        for (body, field) in bodies {
            let res = send(&app, post("/api/items", body)).await;
            assert_eq!(StatusCode::BAD_REQUEST, res.status(), "{body}");
            let error: ErrorBody = json(res).await;
            assert_eq!(400, error.status());
            assert!(error.message().contains(field), "{}", error.message());
        }

        let created = create(&app, "Widget", 1, 1.0).await;
        let res = send(
            &app,
            put(&format!("/api/items/{}", created.id), r#"{"name": "Widget"}"#),
        )
        .await;
        assert_eq!(StatusCode::BAD_REQUEST, res.status());
    }

    #[tokio::test]
    async fn malformed_json_is_still_bad_request() {
        let app = test_app();
        let res = send(&app, post("/api/items", r#"{"name": "#)).await;
        assert_eq!(StatusCode::BAD_REQUEST, res.status());
    }

    #[tokio::test]
    async fn slow_requests_time_out() {
        let app = Router::new()
            .route(
                "/slow",
                axum::routing::get(|| async { tokio::time::sleep(Duration::from_secs(5)).await }),
            )
            .layer(timeout(Duration::from_millis(10)));
        let res = send(&app, get("/slow")).await;
        assert_eq!(StatusCode::REQUEST_TIMEOUT, res.status());
    }

    #[tokio::test]
    async fn non_numeric_id_is_bad_request() {
        let app = test_app();
        let res = send(&app, get("/api/items/abc")).await;
        assert_eq!(StatusCode::BAD_REQUEST, res.status());
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let app = test_app();
        let req = Request::get("/api/items")
            .header("Origin", "http://localhost:4200")
            .body(Body::empty())
            .unwrap();
        let res = send(&app, req).await;
        assert_eq!(
            "http://localhost:4200",
            res.headers()["access-control-allow-origin"]
        );

        let req = Request::get("/api/items")
            .header("Origin", "http://evil.example")
            .body(Body::empty())
            .unwrap();
        let res = send(&app, req).await;
        assert!(!res.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn info_reports_package() {
        let app = test_app();
        let res = send(&app, get("/api/info")).await;
        assert_eq!(StatusCode::OK, res.status());
        let info: AppInfo = json(res).await;
        assert_eq!(env!("CARGO_PKG_NAME"), info.name);
    }

    #[tokio::test]
    async fn api_docs_are_served() {
        let app = test_app();
        for uri in ["/api/openapi.json", "/api/swagger-ui/", "/api/redoc", "/api/rapidoc"] {
            let res = send(&app, get(uri)).await;
            assert_eq!(StatusCode::OK, res.status(), "{uri}");
        }

        let res = send(&app, get("/")).await;
        assert_eq!(StatusCode::PERMANENT_REDIRECT, res.status());
    }
}
