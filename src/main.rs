use actix_web::{
    middleware,
    web::{self, Data},
    App, HttpServer,
};
use log::info;

use item_announcer::{config::Config, routes, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("FATAL: {}", e);
        e
    })?;

    let state = AppState::bootstrap(&config).await.map_err(|e| {
        log::error!("FATAL: startup failed: {}", e);
        e
    })?;

    let static_dir = config.static_dir.clone();
    let cors_origins = config.cors_origins.clone();
    info!("CORS allowed origins: {}", cors_origins.join(", "));
    match &static_dir {
        Some(dir) => info!("Serving frontend from {}", dir.display()),
        None => info!("STATIC_DIR not set, serving the API only"),
    }

    info!("Starting HTTP server on http://{}:{}/", config.host, config.port);

    HttpServer::new(move || {
        let static_dir = static_dir.clone();
        App::new()
            // enable automatic response compression - usually register this first
            .wrap(middleware::Compress::default())
            .wrap(routes::cors(&cors_origins))
            // enable logger - always register Actix Web Logger middleware last
            .wrap(middleware::Logger::default())
            .app_data(Data::new(state.clone()))
            .configure(routes::configure)
            .configure(move |cfg| {
                if let Some(dir) = &static_dir {
                    routes::configure_static(cfg, dir);
                }
            })
            .default_service(web::to(routes::default_handler))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
