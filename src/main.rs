use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use envctx_client::{ClientConfig, HttpEnvironmentService};
use envctx_config::{Config, Overrides, Settings};
use envctx_pipeline::{ChannelNotifier, Pipeline, PipelineEvent, PipelineOptions, PipelineOutcome};
use envctx_sink::FsSink;

/// envctx - Render a deployed environment into a compact context document
#[derive(Parser)]
#[command(name = "envctx")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the config file (default: ~/.envctx/config.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Base URL of the environment service API
  #[arg(long, global = true)]
  base_url: Option<String>,

  /// Log debug output to stderr
  #[arg(long, short, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Fetch an environment and render its context document
  Fetch {
    /// Space the environment lives in
    #[arg(long)]
    space: String,

    /// Environment id
    #[arg(long)]
    environment: String,

    /// Directory to write the document to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Maximum number of requests in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Print the document to stdout instead of writing it
    #[arg(long)]
    stdout: bool,
  },

  /// Print the effective configuration
  Config,
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let mut config = Config::load(cli.config.as_deref()).context("failed to load config")?;
  config.apply_env(|name| std::env::var(name).ok());

  match cli.command {
    Some(Commands::Fetch {
      space,
      environment,
      output_dir,
      concurrency,
      stdout,
    }) => {
      config.apply_overrides(Overrides {
        base_url: cli.base_url,
        output_dir,
        max_concurrency: concurrency,
      });
      let settings = config.resolve().context("invalid configuration")?;
      fetch(settings, space, environment, stdout)?;
    }
    Some(Commands::Config) => {
      config.apply_overrides(Overrides {
        base_url: cli.base_url,
        ..Default::default()
      });
      println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    }
    None => {
      println!("envctx - use --help to see available commands");
    }
  }

  Ok(())
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

fn fetch(settings: Settings, space: String, environment: String, stdout: bool) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { fetch_async(settings, space, environment, stdout).await })
}

async fn fetch_async(
  settings: Settings,
  space: String,
  environment: String,
  stdout: bool,
) -> Result<()> {
  let service = HttpEnvironmentService::new(ClientConfig {
    base_url: settings.base_url.clone(),
    token: settings.token.clone(),
    request_timeout: settings.request_timeout,
  })
  .context("failed to create environment client")?;

  let options = PipelineOptions {
    max_concurrency: settings.max_concurrency,
    run_timeout: settings.run_timeout,
  };

  // Progress goes to stderr so stdout stays clean for --stdout
  let (tx, rx) = mpsc::unbounded_channel();
  let printer = tokio::spawn(print_progress(rx));
  let pipeline = Pipeline::with_notifier(service, ChannelNotifier::new(tx), options);

  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      eprintln!("Interrupted, cancelling...");
      on_interrupt.cancel();
    }
  });

  let result = if stdout {
    pipeline.run(&space, &environment, cancel).await
  } else {
    let sink = FsSink::new(&settings.output_dir);
    pipeline.run_to_sink(&space, &environment, &sink, cancel).await
  };

  // Dropping the pipeline closes the channel and ends the printer
  drop(pipeline);
  let _ = printer.await;

  let outcome = result.context("failed to build environment context")?;
  report(&outcome);

  if stdout {
    print!("{}", outcome.artifact);
  }

  Ok(())
}

async fn print_progress(mut rx: mpsc::UnboundedReceiver<PipelineEvent>) {
  let mut percent: u32 = 0;

  while let Some(event) = rx.recv().await {
    match event {
      PipelineEvent::Started {
        space,
        environment_id,
        ..
      } => {
        eprintln!("Fetching context for {environment_id} in space {space}");
      }
      PipelineEvent::Progress {
        message,
        increment_percent,
        ..
      } => {
        percent = (percent + u32::from(increment_percent)).min(100);
        eprintln!("[{percent:>3}%] {message}");
      }
      PipelineEvent::Completed {
        location: Some(location),
        ..
      } => {
        eprintln!("Context written to {location}");
      }
      PipelineEvent::Completed { location: None, .. } => {}
      PipelineEvent::Failed { error, .. } => {
        eprintln!("Failed: {error}");
      }
    }
  }
}

fn report(outcome: &PipelineOutcome) {
  let doc = &outcome.document;
  eprintln!(
    "Grains: {}, resources: {}, workflows: {}",
    doc.grains.len(),
    doc.resource_count(),
    doc.workflow_count()
  );

  if outcome.is_partial() {
    eprintln!(
      "Warning: {} lookups failed, the context is incomplete:",
      outcome.failures.len()
    );
    for failure in &outcome.failures {
      match &failure.resource {
        Some(resource) => eprintln!("  {}/{}: {}", failure.grain, resource, failure.error),
        None => eprintln!("  {}: {}", failure.grain, failure.error),
      }
    }
  }
}
