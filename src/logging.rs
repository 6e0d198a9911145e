// Centralized tracing setup: console output, optional JSON log file, and span timing
use std::env;
use std::fs;
use std::sync::OnceLock; // Keeps the file writer alive for the whole process
use std::time::{Duration, Instant};

use eyre::{Result, WrapErr};
use tracing::{Id, Subscriber, debug, field::Field, field::Visit, span};
use tracing_subscriber::{
    EnvFilter,
    fmt,
    layer::{Context, Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

const CRATE_TARGET: &str = "earn_opportunities";

static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

fn crate_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(format!("warn,{}={}", CRATE_TARGET, level))
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,{}=info", CRATE_TARGET)))
}

/// Install the global subscriber.
///
/// `CONSOLE_LOG_LEVEL` and `FILE_LOG_LEVEL` set the level for this crate (other
/// crates stay at `warn`); `LOG_TO_FILE=true` adds a JSON file under `logs/`.
pub fn init_logging(app_name: String) -> Result<()> {
    let console_log_level = env::var("CONSOLE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let file_log_level = env::var("FILE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_to_file = env::var("LOG_TO_FILE").map(|v| v == "true").unwrap_or(false);

    // Console goes to stderr so stdout stays clean for reports
    let console_layer = fmt::Layer::new()
        .pretty()
        .with_writer(std::io::stderr)
        .with_filter(crate_filter(&console_log_level));

    let file_layer = if log_to_file {
        let log_dir = std::path::Path::new("logs");
        fs::create_dir_all(log_dir).wrap_err("Failed to create log directory")?;
        let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
        let file_appender = tracing_appender::rolling::never(log_dir, format!("{}_{}.log", app_name, timestamp));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        FILE_GUARD.set(guard).ok();

        Some(
            fmt::Layer::new()
                .json()
                .with_writer(non_blocking)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_filter(crate_filter(&file_log_level)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(SpanTimingLayer)
        .try_init()
        .wrap_err("Failed to set global tracing subscriber")?;

    debug!(app = %app_name, log_to_file, "Logging initialized");
    Ok(())
}

/// Logs busy, idle and total time of spans opened with `on_close = true`
pub struct SpanTimingLayer;

struct SpanTiming {
    started: Instant,
    last_transition: Instant,
    busy: Duration,
    idle: Duration,
}

struct OnCloseVisitor(bool);

impl Visit for OnCloseVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "on_close" {
            self.0 = value;
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
}

impl<S> Layer<S> for SpanTimingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = OnCloseVisitor(false);
        attrs.record(&mut visitor);
        if !visitor.0 {
            return;
        }
        if let Some(span) = ctx.span(id) {
            let now = Instant::now();
            span.extensions_mut().insert(SpanTiming {
                started: now,
                last_transition: now,
                busy: Duration::ZERO,
                idle: Duration::ZERO,
            });
        }
    }

    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            if let Some(timing) = span.extensions_mut().get_mut::<SpanTiming>() {
                timing.idle += timing.last_transition.elapsed();
                timing.last_transition = Instant::now();
            }
        }
    }

    fn on_exit(&self, id: &Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            if let Some(timing) = span.extensions_mut().get_mut::<SpanTiming>() {
                timing.busy += timing.last_transition.elapsed();
                timing.last_transition = Instant::now();
            }
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(&id) {
            let timing = span.extensions_mut().remove::<SpanTiming>();
            if let Some(timing) = timing {
                debug!(
                    span = span.name(),
                    busy_time = ?timing.busy,
                    idle_time = ?timing.idle,
                    total_time = ?timing.started.elapsed(),
                    "span closed"
                );
            }
        }
    }
}
