use afterlife_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::auth::require_bearer_auth,
    routes,
    services::scheduler,
    AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    if config.scheduler_enabled {
        let delivery = app_state.delivery_service.clone();
        tokio::spawn(async move {
            scheduler::run(delivery).await;
        });
    } else {
        info!("Message delivery scheduler is disabled");
    }

    let public_api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login));

    let user_api = Router::new()
        .route(
            "/api/users/me",
            get(routes::users::me).put(routes::users::update_me),
        )
        .route(
            "/api/users/me/personality",
            post(routes::users::generate_personality),
        )
        .route(
            "/api/messages",
            get(routes::messages::list_messages).post(routes::messages::create_message),
        )
        .route(
            "/api/messages/upload",
            post(routes::messages::upload_media),
        )
        .route(
            "/api/messages/:id",
            get(routes::messages::get_message)
                .put(routes::messages::update_message)
                .delete(routes::messages::delete_message),
        )
        .layer(axum::middleware::from_fn(require_bearer_auth));

    let admin_api = Router::new()
        .route("/api/admin/deliver-pending", post(routes::admin::deliver_pending))
        .route("/api/admin/test-email", post(routes::admin::send_test_email));

    info!("Serving uploads from: {}", config.uploads_dir);

    let app = public_api
        .merge(user_api)
        .merge(admin_api)
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir))
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
