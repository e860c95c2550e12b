use std::io;

use actix_web::{App, HttpServer, middleware::Logger, web};
use log::info;
use machine_learning::ModelArtifact;
use server::{AppState, ServerConfig, ServerErr, routes};

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let config = ServerConfig::from_env()?;
    let model = ModelArtifact::load(&config.model_path).map_err(ServerErr::from)?;

    let state = web::Data::new(AppState::new(model));

    info!("listening on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
