use std::io;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::middleware::{DefaultHeaders, Logger, NormalizePath};
use actix_web::{web, App, HttpServer};
use log::info;

use catalog_admin::auth::{ensure_bootstrap_admin, CSRF_HEADER};
use catalog_admin::config::Settings;
use catalog_admin::db::connection::{init_pool, run_migrations};
use catalog_admin::db::{MemoryStore, PgStore, StoreError};
use catalog_admin::state::AppState;
use catalog_admin::{mock_data, routes, AppError};

fn store_failure(error: StoreError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, error)
}

fn startup_failure(error: AppError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, error.to_string())
}

fn build_state(settings: Settings) -> io::Result<AppState> {
    let Some(url) = settings.database.url.clone() else {
        info!("no database configured, using the in-memory demo catalog");
        let store = MemoryStore::new();
        mock_data::seed(&store).map_err(store_failure)?;
        return Ok(AppState::with_memory(store, settings));
    };

    let pool = init_pool(&url, &settings.database).map_err(store_failure)?;
    if settings.database.run_migrations {
        for version in run_migrations(&pool).map_err(store_failure)? {
            info!("applied migration {}", version);
        }
    }
    Ok(AppState::with_postgres(PgStore::new(pool), settings))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    let settings = Settings::load().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&settings.log.level)).init();

    let state = build_state(settings)?;
    ensure_bootstrap_admin(state.accounts.as_ref(), &state.settings.admin).map_err(startup_failure)?;

    let address = state.settings.bind_address();
    let data = web::Data::new(state);
    info!("admin panel listening on http://{}/admin", address);

    HttpServer::new(move || {
        let server = &data.settings.server;
        let cors = server
            .allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec!["content-type", "accept"])
            .allowed_header(CSRF_HEADER)
            .supports_credentials()
            .max_age(3600);
        let storage = &data.settings.storage;

        App::new()
            .wrap(cors)
            .wrap(NormalizePath::trim())
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .app_data(data.clone())
            .service(Files::new(&storage.public_prefix, &storage.root))
            .configure(routes::configure)
    })
    .bind(address)?
    .run()
    .await
}
