use tokio_postgres::IsolationLevel;

use crate::{
    api::model::{note::Note, note_category::NoteCategory, user::User},
    config::Config,
    prelude::*,
};
use super::{Document, StoreKind, create_pool, migrations};


#[derive(Debug, clap::Subcommand)]
pub(crate) enum DbCommand {
    /// Applies all missing migrations. The server also does this on start.
    Migrate,

    /// Prints the applied migrations and the number of records in each
    /// collection.
    Status,
}

/// Entry point for `db` commands.
pub(crate) async fn run(cmd: &DbCommand, config: &Config) -> Result<()> {
    if config.db.store != StoreKind::Postgres {
        bail!("`db` commands only work with `db.store = \"postgres\"`");
    }

    let pool = create_pool(&config.db).await?;
    let mut db = pool.get().await?;
    match cmd {
        DbCommand::Migrate => migrations::migrate(&mut db).await,
        DbCommand::Status => status(&mut db).await,
    }
}

async fn status(db: &mut deadpool_postgres::ClientWrapper) -> Result<()> {
    let tx = db.build_transaction()
        .isolation_level(IsolationLevel::RepeatableRead)
        .read_only(true)
        .start()
        .await?;

    let has_meta_table = tx
        .query_one("select to_regclass('__db_migrations') is not null", &[])
        .await?
        .get::<_, bool>(0);
    if !has_meta_table {
        bunt::println!("{$yellow}No migrations applied yet.{/$} Run `jotter db migrate`.");
        return Ok(());
    }

    let applied = migrations::applied_migrations(&tx).await?;
    bunt::println!(
        "{$bold}Migrations{/$} ({} of {} applied)",
        applied.len(),
        migrations::MIGRATIONS.len(),
    );
    for m in &applied {
        bunt::println!("  {[green]}  {[bold]}  {$dimmed}{}{/$}", m.id, m.name, m.applied_on);
    }
    for (i, m) in migrations::MIGRATIONS.iter().enumerate().skip(applied.len()) {
        bunt::println!("  {[yellow]}  {[bold]}  {$dimmed}pending{/$}", i + 1, m.name);
    }

    println!();
    bunt::println!("{$bold}Collections{/$}");
    for collection in [User::COLLECTION, Note::COLLECTION, NoteCategory::COLLECTION] {
        let exists = tx.query_one("select to_regclass($1) is not null", &[&collection])
            .await?
            .get::<_, bool>(0);
        if exists {
            let count = tx.query_one(&format!("select count(*) from {collection}"), &[])
                .await?
                .get::<_, i64>(0);
            println!("  {collection}: {count} records");
        } else {
            bunt::println!("  {}: {$yellow}missing{/$}", collection);
        }
    }

    tx.commit().await?;
    Ok(())
}
