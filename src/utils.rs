use chrono::{DateTime, Local, TimeDelta, Timelike};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[cfg(windows)]
pub fn setup_console() {
    use windows_sys::Win32::System::Console::{
        GetConsoleMode, GetStdHandle, SetConsoleMode, SetConsoleOutputCP,
        ENABLE_VIRTUAL_TERMINAL_PROCESSING, STD_ERROR_HANDLE, STD_OUTPUT_HANDLE,
    };
    unsafe {
        SetConsoleOutputCP(65001);
        for std_handle in [STD_OUTPUT_HANDLE, STD_ERROR_HANDLE] {
            let handle = GetStdHandle(std_handle);
            let mut mode = 0;
            if GetConsoleMode(handle, &mut mode) != 0 {
                SetConsoleMode(handle, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING);
            }
        }
    }
}

#[cfg(not(windows))]
pub fn setup_console() {}

/// Console logging, INFO unless `RUST_LOG` says otherwise.
/// `RUST_LOG_FORMAT=json` switches to one JSON object per line.
pub fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    let layer = match std::env::var("RUST_LOG_FORMAT").as_deref() {
        Ok("json") => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).init();
}

/// `H:MM:SS[.ffffff]`, with a `N day(s), ` prefix past 24 hours.
/// Negative spans print as zero.
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let total_us = elapsed
        .num_microseconds()
        .unwrap_or_else(|| elapsed.num_milliseconds().saturating_mul(1000))
        .max(0);
    let micros = total_us % 1_000_000;
    let secs = total_us / 1_000_000;
    let days = secs / 86_400;
    let (h, m, s) = (secs % 86_400 / 3600, secs % 3600 / 60, secs % 60);

    let mut out = match days {
        0 => String::new(),
        1 => "1 day, ".to_string(),
        n => format!("{} days, ", n),
    };
    out.push_str(&format!("{}:{:02}:{:02}", h, m, s));
    if micros != 0 {
        out.push_str(&format!(".{:06}", micros));
    }
    out
}

/// `YYYY-MM-DD HH:MM:SS[.ffffff]` in local time.
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    if at.nanosecond() / 1000 == 0 {
        at.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        at.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}
