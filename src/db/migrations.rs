//! Versioned schema migrations for the Postgres store.
//!
//! Applied migrations are recorded in `__db_migrations` together with their
//! script. A database may only ever be behind: every recorded migration must
//! match the one we ship with the same ID.

use deadpool_postgres::{ClientWrapper, Transaction};
use std::time::Duration;
use tokio_postgres::{IsolationLevel, error::SqlState};

use crate::prelude::*;


#[derive(Debug)]
pub(crate) struct Migration {
    pub(crate) name: &'static str,
    pub(crate) script: &'static str,
}

/// All migrations in order. The ID of a migration is its position plus one.
pub(crate) const MIGRATIONS: &[Migration] = &[
    Migration { name: "users", script: include_str!("migrations/01-users.sql") },
    Migration { name: "notes", script: include_str!("migrations/02-notes.sql") },
    Migration {
        name: "note-categories",
        script: include_str!("migrations/03-note-categories.sql"),
    },
];

const CREATE_META_TABLE: &str = "create table if not exists __db_migrations (
    id bigint primary key,
    name text not null,
    applied_on timestamp with time zone not null default now(),
    script text not null
)";

/// A row of `__db_migrations`.
#[derive(Debug)]
pub(crate) struct AppliedMigration {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) applied_on: chrono::DateTime<chrono::Utc>,
    pub(crate) script: String,
}

/// Brings the schema up to date by applying all migrations missing in the
/// database. Everything happens in one serializable transaction, so that
/// concurrently starting Jotter nodes do not both migrate. A node losing that
/// race retries and then finds nothing left to do.
pub(crate) async fn migrate(db: &mut ClientWrapper) -> Result<()> {
    loop {
        let tx = db.build_transaction()
            .isolation_level(IsolationLevel::Serializable)
            .start()
            .await?;

        tx.batch_execute(CREATE_META_TABLE).await
            .context("could not create migrations meta table")?;
        let applied = applied_migrations(&tx).await?;
        let pending = pending_migrations(&applied, MIGRATIONS)?;
        if pending.is_empty() {
            info!("All {} migrations are applied: DB schema is up to date", applied.len());
        } else {
            info!("Applying {} new DB migrations...", pending.len());
        }

        for (offset, migration) in pending.iter().enumerate() {
            let id = (applied.len() + offset + 1) as i64;
            debug!("Applying migration {id} '{}'", migration.name);
            tx.batch_execute(migration.script).await
                .with_context(|| format!("failed to run migration {id} '{}'", migration.name))?;
            tx.execute(
                "insert into __db_migrations (id, name, script) values ($1, $2, $3)",
                &[&id, &migration.name, &migration.script],
            ).await.context("failed to record migration")?;
        }

        match tx.commit().await {
            Ok(()) => return Ok(()),
            Err(e) if e.code() == Some(&SqlState::T_R_SERIALIZATION_FAILURE) => {
                let backoff = Duration::from_millis(500);
                warn!("Migration transaction conflicted with another node, retrying in {backoff:?}");
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e).context("failed to commit migrations"),
        }
    }
}

pub(crate) async fn applied_migrations(tx: &Transaction<'_>) -> Result<Vec<AppliedMigration>> {
    let rows = tx.query("select id, name, applied_on, script from __db_migrations order by id", &[])
        .await
        .context("failed to query migrations meta table")?;

    Ok(rows.into_iter()
        .map(|row| AppliedMigration {
            id: row.get(0),
            name: row.get(1),
            applied_on: row.get(2),
            script: row.get(3),
        })
        .collect())
}

/// Returns the tail of `known` that is not yet in `applied`, or an error if
/// `applied` is not a prefix of `known`.
fn pending_migrations<'a>(
    applied: &[AppliedMigration],
    known: &'a [Migration],
) -> Result<&'a [Migration]> {
    for (i, actual) in applied.iter().enumerate() {
        let expected_id = i as i64 + 1;
        if actual.id != expected_id {
            bail!("applied migration IDs are not consecutive: expected {expected_id}, found {}",
                actual.id);
        }

        let Some(expected) = known.get(i) else {
            bail!(
                "migration {} '{}' (applied on {}) is unknown to this version of Jotter",
                actual.id,
                actual.name,
                actual.applied_on,
            );
        };

        if actual.script != expected.script {
            debug!("Expected script:\n{}", expected.script);
            debug!("Script in database:\n{}", actual.script);
            bail!(
                "script of applied migration {} '{}' (applied on {}) differs from ours",
                actual.id,
                actual.name,
                actual.applied_on,
            );
        }
    }

    Ok(&known[applied.len()..])
}


#[cfg(test)]
mod tests {
    use chrono::Utc;
    use super::{AppliedMigration, MIGRATIONS, Migration, pending_migrations};

    const KNOWN: &[Migration] = &[
        Migration { name: "a", script: "create table a ();" },
        Migration { name: "b", script: "create table b ();" },
        Migration { name: "c", script: "create table c ();" },
    ];

    fn applied(id: i64, m: &Migration) -> AppliedMigration {
        AppliedMigration {
            id,
            name: m.name.into(),
            applied_on: Utc::now(),
            script: m.script.into(),
        }
    }

    #[test]
    fn pending_is_the_unapplied_tail() {
        let names = |ms: &[Migration]| ms.iter().map(|m| m.name).collect::<Vec<_>>();

        assert_eq!(names(pending_migrations(&[], KNOWN).unwrap()), ["a", "b", "c"]);
        let some = [applied(1, &KNOWN[0]), applied(2, &KNOWN[1])];
        assert_eq!(names(pending_migrations(&some, KNOWN).unwrap()), ["c"]);
        let all = [applied(1, &KNOWN[0]), applied(2, &KNOWN[1]), applied(3, &KNOWN[2])];
        assert!(pending_migrations(&all, KNOWN).unwrap().is_empty());
    }

    #[test]
    fn changed_script_is_rejected() {
        let mut changed = applied(1, &KNOWN[0]);
        changed.script.push_str("\ncreate index on a (x);");
        let err = pending_migrations(&[changed], KNOWN).unwrap_err();
        assert!(err.to_string().contains("differs"), "{err}");
    }

    #[test]
    fn unknown_migration_is_rejected() {
        let mut all = KNOWN.iter().zip(1..).map(|(m, id)| applied(id, m)).collect::<Vec<_>>();
        all.push(AppliedMigration {
            id: 4,
            name: "from-the-future".into(),
            applied_on: Utc::now(),
            script: String::new(),
        });
        let err = pending_migrations(&all, KNOWN).unwrap_err();
        assert!(err.to_string().contains("unknown"), "{err}");
    }

    #[test]
    fn gap_in_ids_is_rejected() {
        let gap = [applied(1, &KNOWN[0]), applied(3, &KNOWN[1])];
        assert!(pending_migrations(&gap, KNOWN).is_err());
    }

    #[test]
    fn all_collections_are_created() {
        let all_scripts = MIGRATIONS.iter().map(|m| m.script).collect::<String>();
        for table in ["users", "notes", "note_categories"] {
            assert!(
                all_scripts.contains(&format!("create table {table} (")),
                "no migration creates table '{table}'",
            );
        }
    }
}
