use pwner::tube::{LogLevel, Options, Process, Remote, Tube};
use pwner::{Result, utils};
use std::time::Duration;

/// Parses a timeout in seconds, e.g. "2.5". Zero waits forever.
pub fn parse_timeout(s: &str) -> std::result::Result<Duration, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("`{s}` isn't a number of seconds"))?;
    Duration::try_from_secs_f64(secs).map_err(|err| format!("bad timeout `{s}`: {err}"))
}

/// Builds tube options from command line values. The newline may use escapes like
/// `\r\n` and each verbose flag raises the log level by one.
pub fn options(timeout: Duration, newline: &str, verbose: u8) -> Options {
    let log_level = match verbose {
        0 => LogLevel::Quiet,
        1 => LogLevel::Info,
        _ => LogLevel::Debug,
    };
    Options::default()
        .with_timeout(timeout)
        .with_newline(&utils::unescape(newline))
        .with_log_level(log_level)
}

pub fn process(argv: &[String], options: Options) -> Result<()> {
    let mut process = Process::new(argv, options)?;
    utils::explain("pid", &process.pid().to_string());
    interact(&mut process)
}

pub fn remote(host: &str, port: u16, options: Options) -> Result<()> {
    let mut remote = Remote::new(host, port, options)?;
    utils::explain("connected", &remote.address());
    interact(&mut remote)
}

/// Runs the tube interactively and then closes it. The first error wins.
pub fn interact(tube: &mut dyn Tube) -> Result<()> {
    let result = tube.interactive();
    let closed = tube.close();
    result.and(closed)
}
