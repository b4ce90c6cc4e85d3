use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use taskforge::{
    auth::{AuthMiddleware, SessionManager, TokenBlacklist, TokenSigner},
    config::Config,
    directory::{InMemoryUserDirectory, PgUserDirectory, UserDirectory},
    notification::Notifier,
    routes,
    tasks::TaskStore,
};

fn startup_error<E: std::fmt::Display>(error: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, error.to_string())
}

async fn user_directory(config: &Config) -> io::Result<Arc<dyn UserDirectory>> {
    match &config.database_url {
        Some(url) => {
            let directory = PgUserDirectory::connect(url).await.map_err(startup_error)?;
            directory.migrate().await.map_err(startup_error)?;
            log::info!("Using PostgreSQL user directory");
            Ok(Arc::new(directory))
        }
        None => {
            log::warn!("DATABASE_URL not set, users are kept in memory");
            Ok(Arc::new(InMemoryUserDirectory::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(startup_error)?;
    let directory = user_directory(&config).await?;

    // The blacklist lives exactly as long as this server.
    let blacklist = TokenBlacklist::new();
    let signer = TokenSigner::new(
        &config.jwt_secret,
        chrono::Duration::seconds(config.token_ttl_secs),
    );
    let sessions = web::Data::new(
        SessionManager::new(directory, signer, blacklist, config.bcrypt_cost)
            .map_err(startup_error)?,
    );
    let store = web::Data::new(TaskStore::new());
    let notifier = web::Data::new(Notifier::new());

    let sweeper = {
        let sessions = sessions.clone();
        let period = std::time::Duration::from_secs(config.blacklist_sweep_secs.max(1));
        actix_web::rt::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = sessions.purge_expired().await;
                if purged > 0 {
                    log::debug!("Purged {} expired entries from the token blacklist", purged);
                }
            }
        })
    };

    log::info!("Starting TaskForge server at {}", config.server_url());
    let app_sessions = sessions.clone();
    let result = HttpServer::new(move || {
        App::new()
            .app_data(app_sessions.clone())
            .app_data(store.clone())
            .app_data(notifier.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await;

    sweeper.abort();
    sessions.shutdown().await;
    result
}
