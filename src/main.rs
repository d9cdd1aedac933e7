#[macro_use]
extern crate log;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;

use anyhow::Error;
use dotenv::dotenv;

use matchday::config::Config;
use matchday::{db, server};

#[actix_web::main]
async fn main() -> anyhow::Result<(), Error> {
    init().await?;

    Ok(())
}

async fn init() -> anyhow::Result<(), Error> {
    dotenv().ok();

    let (tracer, _uninstall) = opentelemetry_jaeger::new_pipeline()
        .with_service_name("matchday")
        .with_agent_endpoint(Config::opentelemetry_endpoint())
        .install()
        .expect("unable to connect to opentelemetry agent");

    // Create a tracing layer with the configured tracer
    let opentelemetry = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(opentelemetry)
        .try_init()
        .expect("unable to initialize the tokio tracer");

    let _sentry_guard = Config::sentry_dsn().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    db::migrate(Config::database_url())?;

    let pool = db::build_connection_pool(Config::database_url())?;

    debug!("launching the actix webserver");
    server::launch(pool).await?;

    Ok(())
}
