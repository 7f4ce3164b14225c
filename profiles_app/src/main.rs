use profiles_app::{app::App, config::Config};

use clap::Parser;
use entrait::Impl;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::parse();
    let db = profiles_db::Db::init(&config.database_url).await?;

    let app = App {
        config: Arc::new(config),
        db,
    };

    if let Some(path) = app.config.fixtures.clone() {
        profiles_app::seed_fixtures(&Impl::new(app.clone()), &path).await?;
    }

    profiles_app::serve(app).await?;

    Ok(())
}
