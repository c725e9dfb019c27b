//! Sends one prompt, streams the answer, and remembers the conversation.

#[macro_use]
extern crate tracing;

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use stream_chat::SessionBuilder;
use stream_chat::cli::{self, Cli, ENV_HELP, PROMPT_HELP};
use stream_chat::core::{Error, FileHistoryStore, Renderer, TokioPacer};
use stream_chat_dify::DifyProvider;
use stream_chat_model::ErrorKind;

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match cli::provider_config(|key| env::var(key).ok()) {
        Ok(config) => config,
        Err(err) => {
            report(&err);
            eprintln!("{ENV_HELP}");
            return ExitCode::from(2);
        }
    };
    let prompt = match cli.prompt() {
        Ok(prompt) => prompt,
        Err(err) => {
            report(&err);
            eprintln!("{PROMPT_HELP}");
            return ExitCode::from(2);
        }
    };
    debug!("using {config:?}");

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {wide_msg}") {
        spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let mut builder = SessionBuilder::with_provider(
        DifyProvider::new(config),
        FileHistoryStore::new(&cli.history),
    )
    .on_request({
        let spinner = spinner.clone();
        move || {
            spinner.set_message("Sending request...");
            spinner.enable_steady_tick(Duration::from_millis(100));
        }
    })
    .on_response({
        let spinner = spinner.clone();
        move |accepted| {
            // Finish the spinner before printing anything else.
            spinner.finish_and_clear();
            if accepted {
                eprintln!("{}🤖", BAR_CHAR.bright_cyan());
            }
        }
    });
    if let Some(show_think) = cli.show_think {
        builder = builder.with_show_think(show_think);
    }
    if let Some(delay_ms) = cli.delay_ms {
        builder = builder.with_typewriter_delay_ms(delay_ms);
    }
    let session = builder.build();

    let mut renderer = Renderer::new(std::io::stdout(), TokioPacer);
    let result = session.ask(prompt, &mut renderer).await;
    spinner.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            if err.kind() == ErrorKind::Storage {
                println!();
            }
            report(&err);
            for line in err.diagnostic() {
                eprintln!("{line}");
            }
            return ExitCode::FAILURE;
        }
    };
    println!();

    let summary = &outcome.summary;
    if summary.skipped_lines > 0 {
        eprintln!(
            "{}",
            format!("({} unreadable lines skipped)", summary.skipped_lines)
                .dimmed()
        );
    }
    if let Some(err) = &summary.stream_error {
        report(err);
    }
    ExitCode::SUCCESS
}

fn report(err: &Error) {
    let label = match err.kind() {
        ErrorKind::Config => "configuration error",
        ErrorKind::Storage => "history error",
        ErrorKind::Transport => "connection error",
        ErrorKind::Remote => "request rejected",
        ErrorKind::Decode => "invalid response",
    };
    eprintln!(
        "{}{} {}",
        BAR_CHAR.bright_red(),
        format!("{label}:").bright_red().bold(),
        err.message()
    );
}
