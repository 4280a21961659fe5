use std::{convert::Infallible, future::Future, sync::Arc};

use prometheus::{proto::MetricFamily, Encoder, TextEncoder};
use warp::{
    http::StatusCode,
    path::FullPath,
    reply::{self, with_header, Response},
    Filter, Rejection, Reply,
};

use crate::{args::MetricArgs, prom::Exporter};

fn encode_metrics<E: Encoder + Default>(
    families: &[MetricFamily],
) -> prometheus::Result<Response> {
    let enc: E = Default::default();
    let mut out = Vec::new();
    enc.encode(families, &mut out)?;
    Ok(with_header(out, "Content-Type", enc.format_type()).into_response())
}

async fn gather(exporter: &Exporter) -> Vec<MetricFamily> {
    let mut families = exporter.collect().await;
    families.extend(prometheus::gather());
    // the text encoder refuses families without samples
    families.retain(|mf| !mf.get_metric().is_empty());
    families
}

fn landing_page(path: &str) -> String {
    format!(
        r#"<html>
<head><title>OSRS GE Exporter</title></head>
<body>
<h1>OSRS GE Exporter</h1>
<p><a href="/{}">Metrics</a></p>
</body>
</html>"#,
        path
    )
}

/// Matches the request path exactly, `expected` may span several segments.
fn exact_path(expected: String) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::path::full()
        .and_then(move |full: FullPath| {
            let matched = full.as_str() == expected;
            async move {
                if matched {
                    Ok(())
                } else {
                    Err(warp::reject::not_found())
                }
            }
        })
        .untuple_one()
}

fn routes(
    path: &str,
    exporter: Arc<Exporter>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone + Send + Sync + 'static {
    let metrics = warp::get()
        .and(exact_path(format!("/{}", path)))
        .and_then(move || {
            let exporter = exporter.clone();
            async move {
                let families = gather(&exporter).await;
                let response = match encode_metrics::<TextEncoder>(&families) {
                    Ok(response) => response,
                    Err(err) => {
                        error!(target: "metrics", "failed to encode metrics: {}", err);
                        reply::with_status(err.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
                            .into_response()
                    }
                };
                Ok::<_, Infallible>(response)
            }
        });

    let page = landing_page(path);
    let index = warp::get()
        .and(warp::path::end())
        .map(move || reply::html(page.clone()).into_response());

    metrics.or(index).unify()
}

pub async fn publish_metrics(
    args: &MetricArgs,
    exporter: Arc<Exporter>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), warp::Error> {
    let (addr, server) = warp::serve(routes(&args.path, exporter))
        .try_bind_with_graceful_shutdown(args.addr, shutdown)?;
    info!(target: "metrics", "publishing metrics on http://{}/{}", addr, args.path);

    server.await;
    Ok(())
}
