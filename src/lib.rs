pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::AppConfig;
pub use db::{create_pool, DbPool};
pub use handlers::{ApiDoc, AppState};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

/// Registers every route under `/api`. Shared by the server and the HTTP
/// tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    use handlers::{items, members, orders};

    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/orders")
                    .route("", web::get().to(orders::list_orders))
                    .route("", web::post().to(orders::create_order))
                    .route("/{id}", web::get().to(orders::get_order))
                    .route("/{id}/cancel", web::post().to(orders::cancel_order)),
            )
            .route("/simple-orders", web::get().to(orders::list_simple_orders))
            .service(
                web::scope("/members")
                    .route("", web::get().to(members::list_members))
                    .route("", web::post().to(members::create_member))
                    .route("/{id}", web::get().to(members::get_member))
                    .route("/{id}", web::put().to(members::update_member)),
            )
            .service(
                web::scope("/items")
                    .route("", web::get().to(items::list_items))
                    .route("", web::post().to(items::create_item))
                    .route("/{id}", web::get().to(items::get_item))
                    .route("/{id}", web::put().to(items::update_item)),
            ),
    );
}

/// Build and return an actix-web `Server` bound to the configured address.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(pool: DbPool, config: &AppConfig) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(AppState::new(pool, config));
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((config.host.clone(), config.port))?
    .run())
}
