use dotenvy::dotenv;
use order_graph_service::{build_server, create_pool, run_migrations, AppConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().expect("Invalid configuration");
    let pool = create_pool(&config.database_url).expect("Failed to create database connection pool");
    run_migrations(&pool);

    log::info!(
        "Starting server at http://{}:{} (default strategy {}, batch size {})",
        config.host,
        config.port,
        config.default_strategy,
        config.batch_fetch_size
    );

    build_server(pool, &config)?.await
}
