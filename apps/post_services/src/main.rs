use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use config_libs::libs_config;
use env_logger::Env;
use log::info;
use pgsql_libs::{create_db_pool, DbPool};

use post_services::{
    app_config,
    config_type::PostAppConfig,
    modules::{
        post::query::PgPostStore, upload::storage::UploadStorage, user::query::PgUserStore,
    },
    AppState,
};

const DEFAULT_CONFIG_PATH: &str = "config/default";

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config_path =
        std::env::var("POST_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let config: PostAppConfig = match libs_config(&config_path, "POST") {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ Failed to load config {}: {}", config_path, err);
            std::process::exit(1);
        }
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(config.logger.log.as_str()))
        .init();

    let db_pool: DbPool = match create_db_pool(
        config.database.url.clone(),
        config.database.min_pool_connection,
        config.database.max_pool_connection,
    )
    .await
    {
        Ok(pool) => {
            info!("✅ Database connection success");
            pool
        }
        Err(err) => {
            eprintln!("❌ Database connection failed: {}", err);
            std::process::exit(1);
        }
    };

    let post_store = PgPostStore::new(db_pool.clone());
    if config.database.run_migrations {
        if let Err(err) = post_store.migrate().await {
            eprintln!("❌ Database migration failed: {}", err);
            std::process::exit(1);
        }
        info!("✅ Database migrations applied");
    }

    let uploads = UploadStorage::new(&config.apps.upload_dir);
    uploads.ensure_dir().await?;

    let state = Data::new(AppState {
        posts: Arc::new(post_store),
        users: Arc::new(PgUserStore::new(db_pool)),
        uploads,
        jwt_secret: config.jwt.secret.clone(),
        max_upload_bytes: config.apps.max_upload_bytes,
    });

    let allowed_origin = config.cors.allowed_origin.clone();
    info!(
        "🚀 Starting server on http://{}:{}",
        config.apps.address, config.apps.port
    );

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&allowed_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH"])
            .allow_any_header()
            .supports_credentials();

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(app_config)
    })
    .bind((config.apps.address.as_str(), config.apps.port))?
    .run()
    .await
}
