use std::{io::Write, str::FromStr, time::SystemTime};

use log::{LevelFilter, Record};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Logfmt,
    Json,
}

pub const FORMATS: [&str; 3] = ["pretty", "logfmt", "json"];

#[derive(Debug, Error)]
#[error("unknown log format {0:?}, expected one of: pretty, logfmt, json")]
pub struct UnknownFormat(String);

impl FromStr for LogFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(LogFormat::Pretty),
            "logfmt" => Ok(LogFormat::Logfmt),
            "json" => Ok(LogFormat::Json),
            other => Err(UnknownFormat(other.to_owned())),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid log filter directive {0:?}, expected a level or module=level")]
pub struct InvalidFilter(String);

/// Checks an env_logger filter. Bare tokens must be levels, otherwise a typo
/// would silently become a module name and mute everything else.
pub fn validate_filter(filter: &str) -> Result<(), InvalidFilter> {
    // a trailing `/regex` only narrows messages
    let directives = filter.split('/').next().unwrap_or("");
    for directive in directives
        .split(',')
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
    {
        let level = match directive.split_once('=') {
            Some((module, level)) if !module.is_empty() => level,
            Some(_) => return Err(InvalidFilter(directive.to_owned())),
            None => directive,
        };
        level
            .parse::<LevelFilter>()
            .map_err(|_| InvalidFilter(directive.to_owned()))?;
    }
    Ok(())
}

#[derive(Debug)]
pub struct LogArgs {
    pub level: String,
    pub format: LogFormat,
}

fn timestamp() -> String {
    humantime::format_rfc3339_millis(SystemTime::now()).to_string()
}

fn json_line(ts: &str, record: &Record) -> serde_json::Value {
    serde_json::json!({
        "ts": ts,
        "level": record.level().to_string(),
        "target": record.target(),
        "msg": record.args().to_string(),
    })
}

fn logfmt_value(out: &mut String, value: &str) {
    let bare = !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '=' || c.is_control());
    if bare {
        out.push_str(value);
    } else {
        out.push_str(&format!("{:?}", value));
    }
}

fn logfmt_line(ts: &str, record: &Record) -> String {
    let mut line = String::new();
    let level = record.level().to_string().to_lowercase();
    let msg = record.args().to_string();
    for (i, (key, value)) in [
        ("ts", ts),
        ("level", level.as_str()),
        ("target", record.target()),
        ("msg", msg.as_str()),
    ]
    .iter()
    .enumerate()
    {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(key);
        line.push('=');
        logfmt_value(&mut line, value);
    }
    line
}

pub fn init(args: &LogArgs) -> Result<(), log::SetLoggerError> {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.parse_filters(&args.level);
    match args.format {
        LogFormat::Pretty => {}
        LogFormat::Logfmt => {
            builder.format(|buf, record| writeln!(buf, "{}", logfmt_line(&timestamp(), record)));
        }
        LogFormat::Json => {
            builder.format(|buf, record| writeln!(buf, "{}", json_line(&timestamp(), record)));
        }
    }
    builder.try_init()
}
