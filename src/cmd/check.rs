//! `jotter check`: loads the config and tries everything the server needs on
//! start, then prints a summary.

use crate::{
    args::{self, Args},
    config::Config,
    db::{self, StoreKind},
    load_config_and_init_logger,
    prelude::*,
};


pub(crate) async fn run(shared: &args::Shared, args: &Args) -> Result<()> {
    let config = load_config_and_init_logger(shared, args)
        .context("config is invalid, nothing else was checked")?;

    info!("Checking referenced files and the store...");
    let referenced_files = check_referenced_files(&config).await;
    let db = check_db(&config).await;

    // After all log output
    let mut any_errors = false;
    println!();
    bunt::println!("{$bold+blue+intense}Summary{/$}");
    println!();
    print_outcome(&mut any_errors, "Configuration", &Ok(()));
    print_outcome(&mut any_errors, "Referenced files", &referenced_files);
    print_outcome(&mut any_errors, "Store", &db);

    println!();
    if any_errors {
        bunt::println!("{$red+intense}Some checks failed.{/$}");
        std::process::exit(1);
    } else {
        bunt::println!("{$green+intense}All checks passed.{/$}");
        Ok(())
    }
}

fn print_outcome<T>(any_errors: &mut bool, label: &str, result: &Result<T>) {
    match result {
        Ok(_) => bunt::println!("  {[bold]}: {$green}ok{/$}", label),
        Err(e) => {
            *any_errors = true;
            bunt::println!("  {[bold]}: {$red}failed{/$}", label);
            super::eprint_error(e, 6);
            eprintln!();
        }
    }
}

async fn check_referenced_files(config: &Config) -> Result<()> {
    config.db.check_server_cert()?;

    // The log file is opened by the logger already, but possibly with
    // `${cmd}` replaced by "check". Make sure the directory is usable for
    // the other commands as well.
    if let Some(dir) = config.log.file.as_ref().and_then(|p| p.parent()) {
        debug!("Checking that log directory '{}' exists...", dir.display());
        let meta = tokio::fs::metadata(dir)
            .await
            .with_context(|| format!("could not access log directory '{}'", dir.display()))?;
        if !meta.is_dir() {
            bail!("'{}' is not a directory", dir.display());
        }
    }

    Ok(())
}

async fn check_db(config: &Config) -> Result<()> {
    match config.db.store {
        StoreKind::Memory => {
            info!("Configured to use in-memory store: nothing to connect to");
            Ok(())
        }
        StoreKind::Postgres => db::create_pool(&config.db).await.map(|_| ()),
    }
}
