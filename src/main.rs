use clap::{Arg, ArgAction};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use webpilot::{AutomationConfig, AutomationError, ChromeDriver, Command, Dispatcher, Response};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries only response envelopes; all logging goes to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = clap::Command::new("webpilot")
        .about("Browser automation core: JSON commands on stdin, response envelopes on stdout")
        .arg(
            Arg::new("headed")
                .long("headed")
                .action(ArgAction::SetTrue)
                .help("Run with a visible browser window"),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .value_parser(clap::value_parser!(u64))
                .help("Default per-command timeout in milliseconds"),
        )
        .get_matches();

    let mut config = AutomationConfig::default();
    config.browser.headless = !matches.get_flag("headed");
    if let Some(timeout_ms) = matches.get_one::<u64>("timeout-ms") {
        config.timeouts.default_ms = *timeout_ms;
    }

    info!(headless = config.browser.headless, "webpilot starting");

    let mut dispatcher = Dispatcher::new(ChromeDriver::new(), config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Command>(line) {
            Ok(command) => dispatcher.handle(&command).await,
            Err(e) => {
                let err = AutomationError::Validation(format!("malformed command: {e}"));
                Response::failure("unknown", &err)
            }
        };
        let encoded = serde_json::to_string(&response)?;
        stdout.write_all(encoded.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("input closed, shutting down");
    dispatcher.close().await;
    Ok(())
}
