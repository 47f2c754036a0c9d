use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

pub fn logging() {
    better_panic::install();
    let dotenv = kankyo::load(false);
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    for quiet in ["sqlx=warn", "sqlx::query=warn", "hyper=warn"] {
        if let Ok(directive) = quiet.parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
    if let Err(e) = dotenv {
        info!("couldn't load .env file: {}, this is probably fine", e);
    }
}
