#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate clap;

use std::sync::Arc;

mod args;
mod http;
mod logging;
mod prices;
mod prom;
mod version;

#[cfg(all(feature = "docker", unix))]
async fn terminate_signal() -> Option<()> {
    // Docker signals container shutdown through SIGTERM
    use tokio::signal::unix::{signal, SignalKind};
    signal(SignalKind::terminate()).ok()?.recv().await
}

#[cfg(not(all(feature = "docker", unix)))]
async fn terminate_signal() -> Option<()> {
    tokio::signal::ctrl_c().await.ok()
}

async fn shutdown() {
    match terminate_signal().await {
        Some(()) => info!("received term"),
        None => {
            warn!("unable to listen for termination signals");
            std::future::pending::<()>().await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = args::load_args()?;
    logging::init(&args.log)?;

    info!("starting {}", crate_name!());
    version::BUILD_INFO.log();

    let client = prices::PriceClient::new(args.api_url, args.timeout)?;
    info!(
        "polling {} with a {} timeout",
        client.base(),
        humantime::format_duration(args.timeout)
    );
    let exporter = Arc::new(prom::Exporter::new(client)?);

    http::publish_metrics(&args.metrics, exporter, shutdown()).await?;
    info!("server stopped");

    Ok(())
}
