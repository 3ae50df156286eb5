use actix_web::{middleware::Logger, web::Data, App};
use color_eyre::eyre::WrapErr;
use mergington_activities::{
    activities::ActivityRegistry, config::Config, handlers, users::UserStore, AppData,
};

#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Read .env before the logger so RUST_LOG can come from it.
    let config = Config::from_env().wrap_err("failed to read configuration")?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let users = UserStore::load(&config.users_file).wrap_err_with(|| {
        format!("failed to load users from {}", config.users_file.display())
    })?;

    let state = Data::new(AppData::new(users, ActivityRegistry::seeded()));

    log::info!("listening on {}", config.bind_address);
    actix_web::HttpServer::new(move || {
        let logger = Logger::default();
        App::new()
            .wrap(logger)
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind(config.bind_address.as_str())?
    .run()
    .await?;

    Ok(())
}
