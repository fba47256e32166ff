use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use queue_core::{run_backfill, HttpBackfill, ReconciliationEngine, Surface, TemplateSet};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod live;

use commands::{parse_command, Command, HELP};
use config::{load_settings, Settings};
use live::{apply_message, connect_or_degrade, send_action, Flow};

#[derive(Parser, Debug)]
struct Args {
    /// TOML settings file; defaults to ./queue_watch.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    queue_id: Option<i64>,
    #[arg(long)]
    user_id: Option<i64>,
    /// View the queue as an instructor.
    #[arg(long)]
    instructor: bool,
    #[arg(long)]
    log_filter: Option<String>,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(v) = &self.server_url {
            settings.server_url = v.clone();
        }
        if let Some(v) = self.queue_id {
            settings.queue_id = v;
        }
        if let Some(v) = self.user_id {
            settings.current_user_id = v;
        }
        if self.instructor {
            settings.current_user_is_instructor = true;
        }
        if let Some(v) = &self.log_filter {
            settings.log_filter = v.clone();
        }
    }
}

fn load_templates(settings: &Settings) -> Result<TemplateSet> {
    let Some(path) = &settings.templates_path else {
        return Ok(TemplateSet::builtin());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read templates file '{}'", path.display()))?;
    TemplateSet::from_toml(&raw)
        .with_context(|| format!("invalid templates file '{}'", path.display()))
}

fn render(engine: &ReconciliationEngine) {
    println!("{}", engine.surface().render_text());
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let session = settings.session();
    let queue_id = settings.queue_id();
    info!(
        queue_id = queue_id.0,
        user_id = session.current_user_id.0,
        instructor = session.current_user_is_instructor,
        "queue_watch: starting"
    );

    let surface = Surface::new(load_templates(&settings)?);
    let mut engine = ReconciliationEngine::new(session, surface)?;

    // Subscribe before backfilling so nothing published in between is missed;
    // live events queue up in the channel until the backfill has been applied.
    let mut connection = connect_or_degrade(&mut engine, &settings.server_url, queue_id).await?;
    let backfill = HttpBackfill::new(settings.server_url.clone());
    let report = run_backfill(&mut engine, &backfill, queue_id).await?;
    if !report.is_complete() {
        warn!(failures = ?report.failures, "queue_watch: partial backfill");
    }
    render(&engine);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            message = async { connection.as_mut()?.recv().await }, if connection.is_some() => {
                if apply_message(&mut engine, message)? == Flow::Disconnected {
                    connection = None;
                }
                render(&engine);
            }
            line = stdin.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Command::Intent(intent)) => {
                        let Some(action) = engine.prepare(intent) else {
                            println!("not available right now");
                            continue;
                        };
                        if !send_action(&mut engine, connection.as_ref(), action).await? {
                            render(&engine);
                        }
                    }
                    Ok(Command::Refresh) => {
                        engine.refresh()?;
                        render(&engine);
                    }
                    Ok(Command::Show) => render(&engine),
                    Ok(Command::Help) => println!("{HELP}"),
                    Ok(Command::Quit) => break,
                    Err(err) => println!("{err}"),
                }
            }
        }
    }

    Ok(())
}
