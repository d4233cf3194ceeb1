use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::handlers;
use crate::system::app_state::AppState;
use crate::system::middleware::request_logger::request_logger;

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // A001 Cartridge handlers
        .route(
            "/api/cartridge",
            get(handlers::a001_cartridge::list_all).post(handlers::a001_cartridge::create),
        )
        .route(
            "/api/cartridge/summary",
            get(handlers::a001_cartridge::summary),
        )
        .route(
            "/api/cartridge/export",
            get(handlers::a001_cartridge::export_csv),
        )
        .route(
            "/api/cartridge/eligible/:workflow",
            get(handlers::a001_cartridge::list_eligible),
        )
        .route(
            "/api/cartridge/by-number/:number",
            get(handlers::a001_cartridge::get_by_number),
        )
        .route(
            "/api/cartridge/testdata",
            post(handlers::a001_cartridge::insert_test_data),
        )
        .route(
            "/api/cartridge/:id",
            get(handlers::a001_cartridge::get_by_id),
        )
        .route(
            "/api/cartridge/:id/status",
            put(handlers::a001_cartridge::set_status),
        )
        .route(
            "/api/cartridge/:id/history",
            get(handlers::a001_cartridge::history),
        )
        // A002 Cartridge replacement handlers
        .route(
            "/api/cartridge_replacement",
            get(handlers::a002_cartridge_replacement::list_all)
                .post(handlers::a002_cartridge_replacement::create),
        )
        // A003 Service batch handlers
        .route(
            "/api/service_batch",
            get(handlers::a003_service_batch::list).post(handlers::a003_service_batch::create),
        )
        .route(
            "/api/service_batch/summary",
            get(handlers::a003_service_batch::summary),
        )
        .route(
            "/api/service_batch/:id",
            get(handlers::a003_service_batch::get_by_id),
        )
        .route(
            "/api/service_batch/:id/pending",
            get(handlers::a003_service_batch::pending),
        )
        .route(
            "/api/service_batch/:id/receive",
            post(handlers::a003_service_batch::receive),
        )
        .route(
            "/api/service_batch/:id/manifest",
            get(handlers::a003_service_batch::manifest),
        )
        .layer(middleware::from_fn(request_logger))
        .layer(cors_layer())
        .with_state(state)
}
