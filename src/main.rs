//! The Jotter backend server.

use clap::Parser;
use std::env;

use crate::{
    args::{Args, Command},
    config::Config,
    db::Store,
    prelude::*,
};

mod api;
mod args;
mod config;
mod cmd;
mod db;
mod http;
mod logger;
mod prelude;
mod util;


#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;


#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Also goes into the log file, if one is configured.
        error!("{e:?}");

        eprintln!();
        cmd::eprint_error(&e, 0);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    if env::var_os("RUST_BACKTRACE").is_none() {
        env::set_var("RUST_BACKTRACE", "1");
    }

    let args = Args::parse();
    bunt::set_stdout_color_choice(args.stdout_color());
    bunt::set_stderr_color_choice(args.stderr_color());

    match &args.cmd {
        Command::Serve { shared } => {
            let config = load_config_and_init_logger(shared, &args)?;
            info!("Starting Jotter backend {} ...", env!("CARGO_PKG_VERSION"));
            trace!("Configuration: {config:#?}");

            let store = Store::connect(&config.db).await?;
            http::serve(config, api::root_node(), store).await
                .context("failed to start HTTP server")?;
        }
        Command::Db { cmd, shared } => {
            let config = load_config_and_init_logger(shared, &args)?;
            db::cmd::run(cmd, &config).await?;
        }
        Command::Check { shared } => cmd::check::run(shared, &args).await?,
        Command::WriteConfig { target } => config::write_template(target.as_ref())?,
        Command::ExportApiSchema { target } => cmd::export_api_schema::run(target.as_ref())?,
    }

    Ok(())
}

/// Loads the config from `--config` or the default locations and installs
/// the logger it describes.
fn load_config_and_init_logger(shared: &args::Shared, args: &Args) -> Result<Config> {
    let (config, path) = match &shared.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from '{}'", path.display()))
            .map(|config| (config, path.clone()))?,
        None => Config::from_env_or_default_locations()?,
    };

    logger::init(&config.log, args, args.cmd.name())?;
    info!("Loaded config from '{}'", path.display());
    Ok(config)
}
