#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use tracing_appender::non_blocking::WorkerGuard;
use yansi::Paint;

use crate::application::cli;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        Paint::red(format!(
            "Oh no! codesmith has failed with the following app version and error.\n\nVersion: {}\nCommit: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            env!("VERGEN_GIT_DESCRIBE"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 RUST_LOG=codesmith {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

/// Writes JSON debug logs to the cache directory when `RUST_LOG` mentions
/// codesmith. The returned guard flushes the log on drop.
fn init_tracing() -> Option<WorkerGuard> {
    if !env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("codesmith")
    {
        return None;
    }

    let debug_log_dir = env::var("CODESMITH_LOG_DIR").unwrap_or_else(|_| {
        return dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join("codesmith")
            .to_string_lossy()
            .to_string();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(writer)
        .init();

    return Some(guard);
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let log_guard = init_tracing();
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting");

    let res = cli::parse().await;
    drop(log_guard);

    if let Err(err) = res {
        handle_error(err);
    }
}
