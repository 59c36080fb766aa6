use std::io::{self, IsTerminal};
use std::str::FromStr;
use std::time::SystemTime;

use anyhow::{anyhow, Context, Result};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

pub fn init(level: &str) -> Result<()> {
    let level = parse_level(level)?;
    let is_terminal = io::stdout().is_terminal();

    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let ts = humantime::format_rfc3339_millis(SystemTime::now());
            if is_terminal {
                out.finish(format_args!(
                    "{ts} [{}] {message}",
                    colors.color(record.level())
                ))
            } else {
                out.finish(format_args!("{ts} [{}] {message}", record.level()))
            }
        })
        .level(level)
        // keep http stack internals quiet even on debug runs of the bot
        .level_for("hyper_util", LevelFilter::Info)
        .level_for("actix_server", LevelFilter::Info)
        .chain(io::stdout())
        .apply()
        .context("init logger")?;

    Ok(())
}

fn parse_level(level: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(level).map_err(|_| anyhow!("unknown log level '{level}'"))
}
