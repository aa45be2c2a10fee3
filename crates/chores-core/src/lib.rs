pub mod app;
pub mod cli;
pub mod config;
pub mod filter;
pub mod form;
pub mod i18n;
pub mod sanitize;
pub mod shell;
pub mod store;
pub mod task;
pub mod view;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<String>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(&raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;
    info!(verbose = cli.verbose, quiet = cli.quiet, "starting chores");

    let mut cfg = config::Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(
        cli.rc_overrides
            .into_iter()
            .map(|kv| (kv.key, kv.value)),
    );

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;
    let store = store::TaskStore::open(&data_dir)
        .with_context(|| format!("failed to open task store at {}", data_dir.display()))?;

    let color = cli::use_color(&cfg);
    let mut app = app::App::open(store, &cfg, color)?;

    if cli.rest.is_empty() {
        debug!("no command given, entering interactive shell");
        shell::run_interactive(&mut app)?;
    } else {
        shell::run_once(&mut app, &cli.rest)?;
    }

    info!("done");
    Ok(())
}
