use clap::Arg;
use std::{
    net::{AddrParseError, SocketAddr},
    num::ParseIntError,
    time::Duration,
};
use thiserror::Error;
use url::Url;

use crate::{
    logging::{self, LogArgs, LogFormat},
    prices::DEFAULT_BASE_URL,
    version::BUILD_INFO,
};

#[derive(Debug, Error)]
pub enum ArgsError {
    #[error("metrics-port is a not a valid port: {0}")]
    PortNotANumber(#[from] ParseIntError),
    #[error("metrics-bind is not a valid ip: {0}")]
    MalformedBind(#[from] AddrParseError),
    #[error("metrics-path must not be empty")]
    EmptyMetricsPath,
    #[error("timeout is not valid duration: {0}")]
    NotAValidTimeout(#[from] humantime::DurationError),
    #[error("api-url is not a valid url: {0}")]
    MalformedApiUrl(#[from] url::ParseError),
    #[error(transparent)]
    UnknownLogFormat(#[from] logging::UnknownFormat),
    #[error("log.level is not a valid filter: {0}")]
    InvalidLogFilter(#[from] logging::InvalidFilter),
    #[error(transparent)]
    #[cfg(test)]
    TestError(#[from] clap::Error),
}

#[derive(Debug)]
pub struct MetricArgs {
    pub addr: SocketAddr,
    /// Without leading or trailing slashes.
    pub path: String,
}

#[derive(Debug)]
pub struct Args {
    pub metrics: MetricArgs,
    pub api_url: Url,
    pub timeout: Duration,
    pub log: LogArgs,
}

lazy_static! {
    static ref LONG_VERSION: String = BUILD_INFO.to_string();
}

fn clap_app() -> clap::App<'static, 'static> {
    app_from_crate!()
        .long_version(LONG_VERSION.as_str())
        .arg(
            Arg::with_name("path")
                .takes_value(true)
                .long("metrics-path")
                .env("METRICS_PATH")
                .default_value("metrics"),
        )
        .arg(
            Arg::with_name("port")
                .takes_value(true)
                .long("metrics-port")
                .env("METRICS_PORT")
                .default_value("8080"),
        )
        .arg(
            Arg::with_name("bind")
                .takes_value(true)
                .long("metrics-bind")
                .env("METRICS_BIND")
                .default_value("::"),
        )
        .arg(
            Arg::with_name("timeout")
                .takes_value(true)
                .long("timeout")
                .env("TIMEOUT")
                .default_value("30s")
                .help("timeout for each request to the price api"),
        )
        .arg(
            Arg::with_name("api_url")
                .takes_value(true)
                .long("api-url")
                .env("API_URL")
                .default_value(DEFAULT_BASE_URL),
        )
        .arg(
            Arg::with_name("log_level")
                .takes_value(true)
                .long("log.level")
                .env("LOG_LEVEL")
                .default_value("info")
                .help("log filter, e.g. `debug` or `info,collector=debug`"),
        )
        .arg(
            Arg::with_name("log_format")
                .takes_value(true)
                .long("log.format")
                .env("LOG_FORMAT")
                .possible_values(&logging::FORMATS)
                .default_value("pretty"),
        )
}

fn convert_to_args(args: clap::ArgMatches) -> Result<Args, ArgsError> {
    let path = args.value_of("path").unwrap().trim_matches('/').to_owned();
    let level = args.value_of("log_level").unwrap();
    logging::validate_filter(level)?;
    if path.is_empty() {
        return Err(ArgsError::EmptyMetricsPath);
    }

    Ok(Args {
        metrics: MetricArgs {
            addr: SocketAddr::new(
                args.value_of("bind").unwrap().parse()?,
                args.value_of("port").unwrap().parse()?,
            ),
            path,
        },
        api_url: Url::parse(args.value_of("api_url").unwrap())?,
        timeout: humantime::parse_duration(args.value_of("timeout").unwrap())?,
        log: LogArgs {
            level: level.to_owned(),
            format: args.value_of("log_format").unwrap().parse::<LogFormat>()?,
        },
    })
}

pub fn load_args() -> Result<Args, ArgsError> {
    convert_to_args(clap_app().get_matches())
}
