use anyhow::{Context, Result, anyhow};
use chrono::Local;
use std::{
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    Layer, // Layer is used by .with_filter() on the console layer below
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

use crate::config::LoggingConfig;

// --- Formatter ---

struct LocalFmt;

impl<S, N> FormatEvent<S, N> for LocalFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();

        if ansi {
            write!(writer, "\x1b[2m")?
        }
        write!(writer, "{} ", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))?;
        if ansi {
            write!(writer, "\x1b[0m")?
        }

        let (pre, post) = if ansi {
            match *meta.level() {
                Level::ERROR => ("\x1b[1;31m", "\x1b[0m"),
                Level::WARN => ("\x1b[1;33m", "\x1b[0m"),
                Level::INFO => ("\x1b[1;32m", "\x1b[0m"),
                Level::DEBUG => ("\x1b[1;34m", "\x1b[0m"),
                Level::TRACE => ("\x1b[1;35m", "\x1b[0m"),
            }
        } else {
            ("", "")
        };
        write!(writer, "{}{:>5}{} ", pre, meta.level(), post)?;

        if ansi {
            write!(writer, "\x1b[36m{}\x1b[0m ", meta.target())?;
        } else {
            write!(writer, "{} ", meta.target())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// --- Late-bound file writer ---

/// A MakeWriter that can be pointed at a file after initialization.
/// While no file is set, all writes are discarded.
#[derive(Clone)]
struct FileSlot(Arc<Mutex<Option<File>>>);

struct SlotWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for SlotWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match &mut *self.0 {
            Some(f) => f.write(buf),
            None => Ok(buf.len()),
        }
    }
    fn flush(&mut self) -> io::Result<()> {
        match &mut *self.0 {
            Some(f) => f.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for FileSlot {
    type Writer = SlotWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SlotWriter(self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// --- Runtime controls ---

type SetStrFn = Box<dyn Fn(&str) -> Result<()> + Send + Sync>;
type SetBoolFn = Box<dyn Fn(bool) -> Result<()> + Send + Sync>;

/// Handles into the installed subscriber, set once by `init_default_logging`.
struct LogControls {
    set_level: SetStrFn,
    set_console: SetBoolFn,
    file: FileSlot,
}

static CONTROLS: OnceLock<LogControls> = OnceLock::new();

const DEFAULT_FILTER: &str = "info";

fn controls() -> Result<&'static LogControls> {
    CONTROLS
        .get()
        .ok_or_else(|| anyhow!("logging not yet initialized"))
}

fn make_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn level_setter<S>(handle: reload::Handle<EnvFilter, S>) -> SetStrFn
where
    S: Subscriber + Send + Sync + 'static,
{
    Box::new(move |directive: &str| {
        let filter = EnvFilter::try_new(directive)
            .map_err(|e| anyhow!("invalid log level '{directive}': {e}"))?;
        handle
            .reload(filter)
            .map_err(|e| anyhow!("filter reload failed: {e}"))
    })
}

fn console_setter<S>(handle: reload::Handle<EnvFilter, S>) -> SetBoolFn
where
    S: Subscriber + Send + Sync + 'static,
{
    Box::new(move |enabled: bool| {
        // "trace" lets everything through; the global filter is still the ceiling.
        let filter = EnvFilter::new(if enabled { "trace" } else { "off" });
        handle
            .reload(filter)
            .map_err(|e| anyhow!("console reload failed: {e}"))
    })
}

// --- Public API ---

/// Changes the active log filter at runtime.
/// Accepts a bare level ("error", "warn", "info", "debug", "trace")
/// or any full EnvFilter directive such as `energy_store_sqlite=debug`.
pub fn set_log_level(level: &str) -> Result<()> {
    (controls()?.set_level)(level)
}

/// Shows or hides console log output without affecting file logging.
pub fn set_console_enabled(enabled: bool) -> Result<()> {
    (controls()?.set_console)(enabled)
}

/// Starts appending log output to `path`, creating its parent directory if
/// needed. An already open log file is replaced.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let slot = &controls()?.file;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create log directory '{}'", dir.display()))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))?;

    *slot.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(file);
    Ok(())
}

/// Installs the global subscriber. Call once at startup; later calls are
/// no-ops.
///
/// - Console: stderr, colored when attached to a terminal, so report output
///   on stdout stays clean.
/// - File: inactive until `enable_file_logging()` is called.
/// - Level: INFO by default, or overridden by the RUST_LOG env var.
pub fn init_default_logging() {
    let file_slot = FileSlot(Arc::new(Mutex::new(None)));

    let (console_gate, console_handle) = reload::Layer::new(EnvFilter::new("trace"));
    let (level_filter, level_handle) = reload::Layer::new(make_filter());

    let console_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_filter(console_gate);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_ansi(false)
        .with_writer(file_slot.clone());

    if tracing_subscriber::registry()
        .with(level_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
    {
        let _ = CONTROLS.set(LogControls {
            set_level: level_setter(level_handle),
            set_console: console_setter(console_handle),
            file: file_slot,
        });
    }
}

/// Installs the subscriber and applies `config` on top of it.
///
/// `RUST_LOG` keeps precedence over the configured level.
pub fn init_logging(
    config: &LoggingConfig,
    quiet: bool,
) -> Result<()> {
    init_default_logging();

    if std::env::var_os("RUST_LOG").is_none() {
        set_log_level(&config.level)?;
    }
    if quiet {
        set_console_enabled(false)?;
    }
    if let Some(path) = &config.file {
        enable_file_logging(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only one subscriber can be installed per process, so the whole
    // lifecycle is exercised in a single test.
    #[test]
    fn runtime_controls_after_init() {
        init_default_logging();

        assert!(set_log_level("debug").is_ok());
        assert!(set_log_level("energy_core=trace,warn").is_ok());
        assert!(set_log_level("energy_core=loud").is_err());
        assert!(set_console_enabled(false).is_ok());
        assert!(set_console_enabled(true).is_ok());

        let path = std::env::temp_dir()
            .join(format!("energy-intake-log-{}", std::process::id()))
            .join("intake.log");
        enable_file_logging(&path).unwrap();
        tracing::info!("written to file");
        assert!(path.is_file());
        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
