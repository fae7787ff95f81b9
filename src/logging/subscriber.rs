//! Global subscriber: coloured console output plus a persistent log file.
use std::fs;
use std::io::{self, Write as _};
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing::field::{Field, Visit};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use super::types::Verbosity;
use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};

/// Target of stage-header events.
pub(super) const STAGE_TARGET: &str = "dotlink::stage";

/// Environment variable that overrides the console filter
/// (`tracing_subscriber::EnvFilter` syntax).
pub const LOG_ENV: &str = "DOTLINK_LOG";

/// Pulls the `message` field out of an event.
#[derive(Default)]
struct Message(String);

impl Visit for Message {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.0);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

fn message_of(event: &tracing::Event<'_>) -> String {
    let mut message = Message::default();
    event.record(&mut message);
    message.0
}

/// One log-file line: timestamped, ANSI-free, severity tagged.
fn file_line(level: Level, target: &str, msg: &str, ts: &str) -> String {
    let msg = strip_ansi(msg);
    match level {
        Level::INFO if target == STAGE_TARGET => format!("[{ts}] ==> {msg}"),
        Level::INFO => format!("[{ts}]     {msg}"),
        Level::ERROR => format!("[{ts}]     [error] {msg}"),
        Level::WARN => format!("[{ts}]     [warn] {msg}"),
        _ => format!("[{ts}]     [debug] {msg}"),
    }
}

/// One console line, coloured by severity.
fn console_line(level: Level, target: &str, msg: &str) -> String {
    match level {
        Level::ERROR => format!("\x1b[31mERROR\x1b[0m {msg}"),
        Level::WARN => format!("\x1b[33mWARN\x1b[0m  {msg}"),
        Level::INFO if target == STAGE_TARGET => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
        Level::INFO => format!("  {msg}"),
        _ => format!("  \x1b[2m{msg}\x1b[0m"),
    }
}

/// Layer appending every event to a log file.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate `path`, write a run header naming `command`, and keep the
    /// file open for appending.
    pub(super) fn create(path: &Path, command: &str) -> io::Result<Self> {
        let version =
            option_env!("DOTLINK_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let mut file = fs::File::create(path)?;
        writeln!(
            file,
            "# dotlink {version} {command} started {}",
            format_utc_datetime()
        )?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let meta = event.metadata();
        let line = file_line(
            *meta.level(),
            meta.target(),
            &message_of(event),
            &format_utc_time(),
        );
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{line}").ok();
        }
    }
}

/// Console event format: no timestamps, coloured severity.
struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        writeln!(
            writer,
            "{}",
            console_line(*meta.level(), meta.target(), &message_of(event))
        )
    }
}

const fn console_level(verbosity: Verbosity) -> LevelFilter {
    match verbosity {
        Verbosity::Quiet => LevelFilter::WARN,
        Verbosity::Normal => LevelFilter::INFO,
        Verbosity::Verbose => LevelFilter::DEBUG,
    }
}

/// Install the global [`tracing`] subscriber.  Call once, before logging.
///
/// The console shows events at the level selected by `verbosity` (or by
/// `DOTLINK_LOG`, when set and valid): warnings and errors on stderr,
/// everything else on stdout.  Every event at `DEBUG` and above also goes
/// to `$XDG_CACHE_HOME/dotlink/<command>.log`; if that file cannot be
/// created the run continues without it.
pub fn init_subscriber(verbosity: Verbosity, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{EnvFilter, Layer as _, fmt, layer::SubscriberExt as _};
    use tracing_subscriber::util::SubscriberInitExt as _;

    let console_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::default().add_directive(console_level(verbosity).into()));

    let console = fmt::layer()
        .event_format(ConsoleFormat)
        .with_writer(
            io::stderr
                .with_max_level(Level::WARN)
                .and(io::stdout.with_min_level(Level::INFO)),
        )
        .with_filter(console_filter);

    let file = log_file_path(command)
        .and_then(|path| FileLayer::create(&path, command).ok())
        .map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry().with(console).with(file).init();
}
