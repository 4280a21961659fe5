use std::time::Duration;

use bytes::Bytes;
use reqwest::{header, StatusCode};
use thiserror::Error;
use url::Url;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0} cannot be used as a base url")]
    InvalidUrl(Url),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Thin GET-only wrapper around a fixed base url.
#[derive(Debug, Clone)]
pub struct Client {
    base: Url,
    http: reqwest::Client,
}

impl Client {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, FetchError> {
        if base.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base, http })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Appends `path` to the base path segment-wise, so neither a trailing
    /// slash on the base nor a leading slash on `path` doubles up.
    pub fn url_for(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base.clone()))?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    pub async fn get(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<(Bytes, StatusCode), FetchError> {
        let url = self.url_for(path, params)?;
        debug!(target: "fetch", "GET {}", url);

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "*/*")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await?;
        let status = response.status();
        Ok((response.bytes().await?, status))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use url::Url;
    use warp::Filter;

    use super::{Client, FetchError, USER_AGENT};
    use crate::prices::synthetic;

    fn client(base: &str) -> Client {
        Client::new(Url::parse(base).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn joins_paths_without_double_slashes() {
        let expected = "https://prices.runescape.wiki/api/v1/osrs/mapping";
        for base in &[
            "https://prices.runescape.wiki/api/v1/osrs",
            "https://prices.runescape.wiki/api/v1/osrs/",
        ] {
            for path in &["mapping", "/mapping", "mapping/"] {
                assert_eq!(client(base).url_for(path, &[]).unwrap().as_str(), expected);
            }
        }
        assert_eq!(
            client("http://localhost:1234").url_for("5m", &[]).unwrap().as_str(),
            "http://localhost:1234/5m"
        );
    }

    #[test]
    fn encodes_query_parameters() {
        let url = client("https://example.com/api")
            .url_for("latest", &[("id", "4151"), ("name", "Abyssal whip")])
            .unwrap();
        assert_eq!(url.path(), "/api/latest");
        assert_eq!(url.query(), Some("id=4151&name=Abyssal+whip"));
    }

    #[test]
    fn rejects_non_base_urls() {
        let result = Client::new(
            Url::parse("mailto:someone@example.com").unwrap(),
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn sends_fixed_headers() {
        let echo = warp::path("echo")
            .and(warp::header::<String>("accept"))
            .and(warp::header::<String>("content-type"))
            .and(warp::header::<String>("user-agent"))
            .map(|accept: String, content_type: String, agent: String| {
                format!("{}|{}|{}", accept, content_type, agent)
            });
        let addr = synthetic::serve_filter(echo);

        let (body, status) = client(&format!("http://{}", addr))
            .get("echo", &[])
            .await
            .unwrap();

        assert!(status.is_success());
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            format!("*/*|application/json|{}", USER_AGENT)
        );
    }

    #[tokio::test]
    async fn reports_status_codes_verbatim() {
        let missing = warp::path("gone")
            .map(|| warp::reply::with_status("gone", warp::http::StatusCode::GONE));
        let addr = synthetic::serve_filter(missing);

        let (body, status) = client(&format!("http://{}", addr))
            .get("gone", &[])
            .await
            .unwrap();

        assert_eq!(status.as_u16(), 410);
        assert_eq!(&body[..], b"gone");
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        // bind then drop to obtain a port with no listener
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let result = client(&format!("http://127.0.0.1:{}", port))
            .get("mapping", &[])
            .await;

        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}
