//! Logging via `tracing`, configured by the `[log]` section.

use std::{
    collections::HashMap,
    fmt,
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    path::PathBuf,
};
use serde::Deserialize;
use termcolor::ColorChoice;
use tracing::{Level, Subscriber};
use tracing_subscriber::{
    filter::{FilterFn, LevelFilter},
    fmt::{
        MakeWriter,
        format::{DefaultFields, Format, Full, Writer},
        time::FormatTime,
    },
    prelude::*,
    registry::LookupSpan,
};

use crate::{prelude::*, args::{Args, Color}};


#[derive(Debug, confique::Config)]
pub(crate) struct LogConfig {
    /// Minimum level per module path prefix. Each event is checked against
    /// the entry with the longest prefix of its module path. Events without
    /// any matching entry are dropped. Levels: "off", "error", "warn",
    /// "info", "debug", "trace".
    ///
    /// For example, to see SQL statements and hyper's debug output but no
    /// per-request lines:
    ///
    ///    [log]
    ///    filters.jotter = "info"
    ///    filters."jotter::db" = "trace"
    ///    filters."jotter::http::log" = "off"
    ///    filters.hyper = "debug"
    #[config(default = { "jotter": "debug" })]
    pub(crate) filters: Filters,

    /// Optional file to append log output to. `${cmd}` is replaced by the
    /// subcommand, e.g. "/var/log/jotter-${cmd}.log".
    pub(crate) file: Option<PathBuf>,

    /// Whether to log to stdout.
    #[config(default = true)]
    pub(crate) stdout: bool,

    /// Log the headers of every HTTP request at level "trace".
    #[config(default = false)]
    pub(crate) log_http_headers: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "HashMap<String, String>")]
pub(crate) struct Filters(HashMap<String, LevelFilter>);

impl TryFrom<HashMap<String, String>> for Filters {
    type Error = String;

    fn try_from(raw: HashMap<String, String>) -> Result<Self, Self::Error> {
        let mut out = HashMap::with_capacity(raw.len());
        for (prefix, level) in raw {
            let level = level.parse::<LevelFilter>()
                .map_err(|_| format!("invalid log level '{level}' for '{prefix}'"))?;
            out.insert(prefix, level);
        }
        Ok(Self(out))
    }
}

impl Filters {
    /// Whether an event with `level` from `target` passes. The longest
    /// matching prefix decides.
    fn enabled(&self, target: &str, level: &Level) -> bool {
        self.0.iter()
            .filter(|(target_prefix, _)| target.starts_with(target_prefix.as_str()))
            .max_by_key(|(target_prefix, _)| target_prefix.len())
            .is_some_and(|(_, level_filter)| level <= level_filter)
    }

    fn max_level(&self) -> LevelFilter {
        self.0.values().max().copied().unwrap_or(LevelFilter::OFF)
    }
}

/// Installs the global logger. Must only be called once. `cmd` is the name
/// of the subcommand and replaces `${cmd}` in the log file path.
pub(crate) fn init(config: &LogConfig, args: &Args, cmd: &str) -> Result<()> {
    let filters = config.filters.clone();
    let max_level = filters.max_level();
    let filter = FilterFn::new(move |metadata| filters.enabled(metadata.target(), metadata.level()))
        .with_max_level_hint(max_level);

    let stdout = config.stdout.then(|| {
        fmt_layer(std::io::stdout).with_ansi(args.stdout_color() != ColorChoice::Never)
    });
    let file = config.file.as_deref()
        .map(|path| open_log_file(path, cmd))
        .transpose()?
        .map(|file| fmt_layer(file).with_ansi(args.color == Color::Always));

    tracing_subscriber::registry()
        .with(filter)
        .with(file)
        .with(stdout)
        .init();

    Ok(())
}

type FmtLayer<S, W> = tracing_subscriber::fmt::Layer<S, DefaultFields, Format<Full, LocalTime>, W>;

fn fmt_layer<S, W>(writer: W) -> FmtLayer<S, W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_timer(LocalTime)
        .with_writer(writer)
}

/// Opens `path` for appending, with `${cmd}` replaced by `cmd`.
fn open_log_file(path: &Path, cmd: &str) -> Result<File> {
    let path = path.to_str()
        .ok_or_else(|| anyhow!("log file path is not valid UTF-8"))?
        .replace("${cmd}", cmd);

    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&path)
        .with_context(|| format!("failed to open/create log file '{path}'"))?;

    // Separates the output of consecutive runs.
    file.write_all(b"\n").context("could not write to log file")?;
    Ok(file)
}

/// Local wall clock time with milliseconds.
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}


#[cfg(test)]
mod tests {
    use std::{collections::HashMap, fs};
    use tracing::Level;
    use tracing_subscriber::fmt::{format::Writer, time::FormatTime};
    use super::{Filters, LevelFilter, LocalTime, open_log_file};

    fn filters(entries: &[(&str, &str)]) -> Filters {
        let map = entries.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        Filters::try_from(map).unwrap()
    }

    #[test]
    fn longest_prefix_wins() {
        let filters = filters(&[
            ("jotter", "info"),
            ("jotter::db", "trace"),
            ("jotter::http::log", "off"),
        ]);

        assert!(filters.enabled("jotter::api", &Level::INFO));
        assert!(!filters.enabled("jotter::api", &Level::DEBUG));
        assert!(filters.enabled("jotter::db::postgres", &Level::TRACE));
        assert!(!filters.enabled("jotter::http::log::req", &Level::ERROR));
        assert!(!filters.enabled("hyper::proto", &Level::ERROR));
        assert_eq!(filters.max_level(), LevelFilter::TRACE);
    }

    #[test]
    fn no_filters_means_off() {
        let filters = filters(&[]);
        assert!(!filters.enabled("jotter", &Level::ERROR));
        assert_eq!(filters.max_level(), LevelFilter::OFF);
    }

    #[test]
    fn invalid_level() {
        let map = HashMap::from([("jotter".to_string(), "verbose".to_string())]);
        assert!(Filters::try_from(map).is_err());
    }

    #[test]
    fn timestamp_has_milliseconds() {
        let mut out = String::new();
        LocalTime.format_time(&mut Writer::new(&mut out)).unwrap();

        // E.g. "2024-05-04 19:40:18.270"
        assert_eq!(out.len(), 23, "{out}");
        assert_eq!(&out[4..5], "-");
        assert_eq!(&out[10..11], " ");
        assert_eq!(&out[19..20], ".");
    }

    #[test]
    fn log_file_name_contains_command() {
        let dir = std::env::temp_dir().join(format!("jotter-log-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let template = dir.join("jotter-${cmd}.log");

        open_log_file(&template, "serve").unwrap();
        open_log_file(&template, "serve").unwrap();
        let written = fs::read_to_string(dir.join("jotter-serve.log")).unwrap();
        assert_eq!(written, "\n\n");
        assert!(!dir.join("jotter-${cmd}.log").exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
