//! Uses actix to serve the route search endpoints over the known direct routes, optionally
//! serving the map frontend's static files alongside them.

use actix_web::{middleware::Logger, web, App, HttpServer};
use log::info;
use route_finder::config::ServerConfig;
use route_finder::web_app::{self, AppState};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    info!("Serving routes from {:?}", config.route_source);

    let state = web::Data::new(AppState {
        store: config
            .build_store()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?,
    });
    let static_dir = config.static_dir.clone();

    info!("Listening on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        let app = App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(web_app::configure);

        match &static_dir {
            Some(dir) => app.service(actix_files::Files::new("/", dir).index_file("index.html")),
            None => app,
        }
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
