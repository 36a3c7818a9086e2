use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::MatchedPath;
use dotenvy::dotenv;
use http::{HeaderName, HeaderValue};
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use api::application::ports::storage_port::StoragePort;
use api::bootstrap::app_context::{AppContext, AppServices};
use api::bootstrap::config::{Config, StorageBackend};
use api::infrastructure::addressing::RouteAddressBuilder;
use api::infrastructure::db::repositories::book_repository_sqlx::SqlxBookRepository;
use api::infrastructure::db::repositories::document_repository_sqlx::SqlxDocumentRepository;
use api::infrastructure::db::repositories::history_repository_sqlx::SqlxHistoryRepository;
use api::presentation::http::member::MEMBER_HEADER;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const UPLOADS_ROUTE: &str = "/api/uploads";

#[derive(OpenApi)]
#[openapi(
        paths(
            api::presentation::http::documents::list_documents,
            api::presentation::http::documents::create_document,
            api::presentation::http::documents::create_many,
            api::presentation::http::documents::delete_document,
            api::presentation::http::documents::get_document_content,
            api::presentation::http::documents::save_document_content,
            api::presentation::http::books::reconcile_outline,
            api::presentation::http::books::export_sequence,
            api::presentation::http::books::export_bundle,
            api::presentation::http::books::export_location,
            api::presentation::http::history::list_history,
            api::presentation::http::history::delete_history,
            api::presentation::http::history::compare_history,
            api::presentation::http::history::restore_history,
            api::presentation::http::health::health,
        ),
        components(schemas(
            api::presentation::http::error::ErrorBody,
            api::presentation::http::documents::Document,
            api::presentation::http::documents::DocumentListResponse,
            api::presentation::http::documents::CreateDocumentRequest,
            api::presentation::http::documents::CreateManyRequest,
            api::presentation::http::documents::CreateManyResponse,
            api::presentation::http::documents::DeleteDocumentResponse,
            api::presentation::http::documents::DocumentContentResponse,
            api::presentation::http::documents::SaveContentRequest,
            api::presentation::http::documents::SaveContentResponse,
            api::presentation::http::books::ReconcileRequest,
            api::presentation::http::books::ReconcileFailureItem,
            api::presentation::http::books::ReconcileResponse,
            api::presentation::http::books::ExportItem,
            api::presentation::http::books::ExportResponse,
            api::presentation::http::books::ExportBundleResponse,
            api::presentation::http::books::ExportLocationResponse,
            api::presentation::http::history::HistoryItem,
            api::presentation::http::history::HistoryListResponse,
            api::presentation::http::history::HistoryDiffLineType,
            api::presentation::http::history::HistoryDiffLine,
            api::presentation::http::history::HistoryCompareResponse,
            api::presentation::http::history::RestoreResponse,
            api::presentation::http::health::HealthResp,
        )),
        tags(
            (name = "Documents", description = "Document tree and content"),
            (name = "Books", description = "Outline reconciliation and export"),
            (name = "History", description = "Document revision history"),
            (name = "Health", description = "System health checks")
        )
    )]
struct ApiDoc;

fn cors_layer(cfg: &Config) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers([
            http::header::CONTENT_TYPE,
            http::header::AUTHORIZATION,
            HeaderName::from_static(MEMBER_HEADER),
        ]);
    match cfg.frontend_url.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => base.allow_origin(origin).allow_credentials(true),
        // Config::from_env already refuses production without a usable FRONTEND_URL
        _ if cfg.is_production => base.allow_origin(AllowOrigin::exact(
            HeaderValue::from_static("http://invalid"),
        )),
        _ => base
            .allow_origin(AllowOrigin::mirror_request())
            .allow_credentials(true),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "api=debug,axum=info,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(?cfg, "Starting bookwiki backend");

    // Database
    let pool =
        api::infrastructure::db::connect_pool(&cfg.database_url, cfg.database_max_connections)
            .await?;
    api::infrastructure::db::migrate(&pool).await?;

    let storage_port: Arc<dyn StoragePort> = match cfg.storage_backend {
        StorageBackend::Filesystem => {
            if let Err(e) = tokio::fs::create_dir_all(&cfg.storage_root).await {
                tracing::warn!(error = ?e, dir = %cfg.storage_root, "Failed to create uploads dir");
            }
            let public_base = format!(
                "{}{}",
                cfg.public_base_url.as_deref().unwrap_or_default(),
                UPLOADS_ROUTE
            );
            Arc::new(api::infrastructure::storage::port_impl::FsStoragePort::new(
                &cfg.storage_root,
                public_base,
            ))
        }
        StorageBackend::S3 => {
            Arc::new(api::infrastructure::storage::s3::S3StoragePort::new(&cfg).await?)
        }
    };

    let services = AppServices::new(
        Arc::new(SqlxDocumentRepository::new(pool.clone())),
        Arc::new(SqlxBookRepository::new(pool.clone())),
        Arc::new(SqlxHistoryRepository::new(pool.clone())),
        storage_port,
        Arc::new(RouteAddressBuilder::new(
            cfg.public_base_url.clone(),
            &cfg.document_route_prefix,
        )),
    );
    let ctx = AppContext::new(cfg.clone(), services);

    let mut api_router = Router::new()
        .nest(
            "/api",
            api::presentation::http::health::routes(pool.clone()),
        )
        .nest(
            "/api",
            api::presentation::http::documents::routes(ctx.clone()),
        )
        .nest("/api", api::presentation::http::books::routes(ctx.clone()))
        .nest(
            "/api",
            api::presentation::http::history::routes(ctx.clone()),
        )
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()));

    if matches!(cfg.storage_backend, StorageBackend::Filesystem) {
        api_router = api_router.nest_service(UPLOADS_ROUTE, ServeDir::new(&cfg.storage_root));
    }

    let app = api_router.layer(cors_layer(&cfg)).layer(
        TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
            let method = req.method().clone();
            let uri = req.uri().clone();
            let matched = req
                .extensions()
                .get::<MatchedPath>()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default();
            tracing::info_span!("http", %method, %uri, matched_path = %matched)
        }),
    );

    let api_addr = SocketAddr::from(([0, 0, 0, 0], cfg.api_port));
    info!(%api_addr, "HTTP API listening");
    let listener = tokio::net::TcpListener::bind(api_addr).await?;

    let api_handle: JoinHandle<anyhow::Result<()>> = tokio::spawn(async move {
        axum::serve(listener, app).await?;
        Ok(())
    });

    match api_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(?e, "API server task failed"),
        Err(e) => error!(?e, "API server task panicked"),
    }
    Ok(())
}
