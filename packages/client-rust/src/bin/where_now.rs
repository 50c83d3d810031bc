//! `where-now`: prints the channels a UUID is present on.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use pubsub_client::{ClientConfig, PubSubClient, Status, WhereNowResult};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "where-now", version, about = "Look up the channels a UUID is present on")]
struct Cli {
    #[arg(long, env = "PUBSUB_SUBSCRIBE_KEY")]
    subscribe_key: String,

    #[arg(long, env = "PUBSUB_AUTH_KEY")]
    auth_key: Option<String>,

    /// Client UUID sent with the request (random when omitted)
    #[arg(long, env = "PUBSUB_UUID")]
    uuid: Option<String>,

    /// UUID to look up (defaults to the client UUID)
    #[arg(long)]
    target: Option<String>,

    #[arg(long, env = "PUBSUB_ORIGIN", default_value = "ps.pndsn.com")]
    origin: String,

    /// Use plain HTTP
    #[arg(long, action = ArgAction::SetTrue)]
    insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long = "timeout", default_value_t = 10)]
    timeout_secs: u64,

    /// Calling convention to exercise
    #[arg(long, value_enum, default_value_t = Mode::Future)]
    mode: Mode,

    #[arg(short = 'o', long = "output", value_enum, default_value_t = Output::Human)]
    output: Output,

    /// Emit logs as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json_logs: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Mode {
    Sync,
    Future,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output {
    Human,
    Json,
}

#[derive(Serialize)]
struct Report<'a> {
    uuid: &'a str,
    channels: &'a [String],
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(true).init();
    }
}

impl Cli {
    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::with_subscribe_key(self.subscribe_key.clone());
        config.auth_key.clone_from(&self.auth_key);
        if let Some(uuid) = &self.uuid {
            config.uuid.clone_from(uuid);
        }
        config.origin.clone_from(&self.origin);
        config.secure = !self.insecure;
        config.request_timeout = Duration::from_secs(self.timeout_secs);
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let client = PubSubClient::new(cli.config()).context("creating client")?;
    let target = cli
        .target
        .clone()
        .unwrap_or_else(|| client.config().uuid.clone());
    info!(target = %target, mode = ?cli.mode, "looking up presence");

    let result = match cli.mode {
        Mode::Sync => {
            let request = client.where_now().uuid(target.clone());
            tokio::task::spawn_blocking(move || request.sync())
                .await
                .context("blocking call panicked")??
        }
        Mode::Future => {
            let call = client.where_now().uuid(target.clone()).future();
            tokio::pin!(call);
            let (result, status) = tokio::select! {
                outcome = &mut call => outcome,
                _ = tokio::signal::ctrl_c() => {
                    warn!("interrupted, cancelling");
                    client.shutdown();
                    call.await
                }
            };
            into_result(result, status)?
        }
    };

    match cli.output {
        Output::Human => {
            if result.channels.is_empty() {
                println!("{target} is not present on any channel");
            }
            for channel in &result.channels {
                println!("{channel}");
            }
        }
        Output::Json => {
            let report = Report {
                uuid: &target,
                channels: &result.channels,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    client.shutdown();
    client.wait_for_drain(Duration::from_secs(1)).await;
    Ok(())
}

fn into_result(result: Option<WhereNowResult>, status: Status) -> Result<WhereNowResult> {
    match (result, status.error) {
        (Some(result), None) => Ok(result),
        (_, Some(err)) => Err(err).context(format!("where-now failed ({})", status.category)),
        (None, None) => bail!("where-now returned no result"),
    }
}
