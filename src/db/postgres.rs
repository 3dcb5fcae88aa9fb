//! The five collection operations, expressed as SQL on a pooled connection.
//!
//! Statements are built from the `Document` constants only. Values are always
//! passed as parameters.

use postgres_types::ToSql;
use tokio_postgres::{Error, Row};

use crate::prelude::*;
use super::{Document, Fields, Filter, Key, DbConnection};


type Param<'a> = &'a (dyn ToSql + Sync);

/// `id` followed by all fields of `D`, the selection every query returns.
fn columns<D: Document>() -> String {
    std::iter::once("id")
        .chain(D::FIELDS.iter().copied())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds a `D` from the columns selected by `columns::<D>()`: the key at
/// index 0, then the fields in `D::FIELDS` order.
fn from_columns<D: Document>(key: Key, mut get: impl FnMut(usize) -> Option<String>) -> D {
    let values = (1..=D::FIELDS.len()).map(&mut get).collect();
    D::from_values(key, values)
}

fn from_row<D: Document>(row: Row) -> D {
    from_columns(row.get(0), |i| row.get(i))
}

fn select_sql<D: Document>(filter: Filter<'_>) -> String {
    let condition = match filter {
        Filter::All => String::new(),
        Filter::Eq(field, _) => format!(" where {field} = $1"),
    };
    format!("select {} from {}{condition} order by id", columns::<D>(), D::COLLECTION)
}

fn select_by_key_sql<D: Document>() -> String {
    format!("select {} from {} where id = $1", columns::<D>(), D::COLLECTION)
}

fn insert_sql<D: Document>(fields: &Fields) -> String {
    if fields.is_empty() {
        return format!("insert into {} default values returning {}", D::COLLECTION, columns::<D>());
    }

    let names = fields.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", ");
    let placeholders = (1..=fields.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "insert into {} ({names}) values ({placeholders}) returning {}",
        D::COLLECTION,
        columns::<D>(),
    )
}

/// `$1` is the key, the new values follow from `$2` on.
fn update_sql<D: Document>(fields: &Fields) -> String {
    let assignments = fields.iter()
        .enumerate()
        .map(|(i, (name, _))| format!("{name} = ${}", i + 2))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "update {} set {assignments} where id = $1 returning {}",
        D::COLLECTION,
        columns::<D>(),
    )
}

fn delete_sql<D: Document>() -> String {
    format!("delete from {} where id = $1 returning {}", D::COLLECTION, columns::<D>())
}

/// Values can be passwords, so only their number is logged.
fn log_query(query: &str, params: &[Param<'_>]) {
    trace!("Executing SQL query: \"{}\" ({} params)", query, params.len());
}


pub(super) async fn find<D: Document>(
    db: &DbConnection,
    filter: Filter<'_>,
) -> Result<Vec<D>, Error> {
    let query = select_sql::<D>(filter);
    let params: Vec<Param> = match &filter {
        Filter::All => vec![],
        Filter::Eq(_, value) => vec![value as Param],
    };

    log_query(&query, &params);
    let statement = db.prepare_cached(&query).await?;
    db.query_raw(&statement, params)
        .await?
        .map_ok(from_row::<D>)
        .try_collect()
        .await
}

pub(super) async fn find_by_key<D: Document>(
    db: &DbConnection,
    key: Key,
) -> Result<Option<D>, Error> {
    query_opt(db, &select_by_key_sql::<D>(), &[&key]).await
}

pub(super) async fn insert<D: Document>(db: &DbConnection, fields: Fields) -> Result<D, Error> {
    let query = insert_sql::<D>(&fields);
    let params = fields.iter().map(|(_, value)| value as Param).collect::<Vec<_>>();

    log_query(&query, &params);
    let statement = db.prepare_cached(&query).await?;
    db.query_one(&statement, &params).await.map(from_row)
}

pub(super) async fn update_by_key<D: Document>(
    db: &DbConnection,
    key: Key,
    fields: Fields,
) -> Result<Option<D>, Error> {
    if fields.is_empty() {
        return find_by_key(db, key).await;
    }

    let params = std::iter::once(&key as Param)
        .chain(fields.iter().map(|(_, value)| value as Param))
        .collect::<Vec<_>>();
    query_opt(db, &update_sql::<D>(&fields), &params).await
}

pub(super) async fn delete_by_key<D: Document>(
    db: &DbConnection,
    key: Key,
) -> Result<Option<D>, Error> {
    query_opt(db, &delete_sql::<D>(), &[&key]).await
}

async fn query_opt<D: Document>(
    db: &DbConnection,
    query: &str,
    params: &[Param<'_>],
) -> Result<Option<D>, Error> {
    log_query(query, params);
    let statement = db.prepare_cached(query).await?;
    Ok(db.query_opt(&statement, params).await?.map(from_row))
}


#[cfg(test)]
mod tests {
    use std::{io, sync::{Arc, Mutex}};
    use crate::db::{Document, Fields, Filter, Key};
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pet {
        key: Key,
        name: Option<String>,
        owner: Option<String>,
        color: Option<String>,
    }

    impl Document for Pet {
        const COLLECTION: &'static str = "pets";
        const FIELDS: &'static [&'static str] = &["name", "owner", "color"];

        fn from_values(key: Key, values: Vec<Option<String>>) -> Self {
            let [name, owner, color]: [_; 3] = values.try_into().unwrap();
            Self { key, name, owner, color }
        }
    }

    fn fields(names: &[&'static str]) -> Fields {
        names.iter().map(|name| (*name, Some(format!("new {name}")))).collect()
    }

    #[test]
    fn select() {
        assert_eq!(
            select_sql::<Pet>(Filter::All),
            "select id, name, owner, color from pets order by id",
        );
        assert_eq!(
            select_sql::<Pet>(Filter::Eq("owner", "usAAAAAAAAAAB")),
            "select id, name, owner, color from pets where owner = $1 order by id",
        );
        assert_eq!(
            select_by_key_sql::<Pet>(),
            "select id, name, owner, color from pets where id = $1",
        );
    }

    #[test]
    fn insert_without_fields_uses_defaults() {
        assert_eq!(
            insert_sql::<Pet>(&vec![]),
            "insert into pets default values returning id, name, owner, color",
        );
    }

    #[test]
    fn insert_numbers_placeholders_in_given_order() {
        assert_eq!(
            insert_sql::<Pet>(&fields(&["color", "name"])),
            "insert into pets (color, name) values ($1, $2) returning id, name, owner, color",
        );
    }

    #[test]
    fn update_reserves_first_placeholder_for_key() {
        assert_eq!(
            update_sql::<Pet>(&fields(&["owner"])),
            "update pets set owner = $2 where id = $1 returning id, name, owner, color",
        );
        assert_eq!(
            update_sql::<Pet>(&fields(&["color", "name", "owner"])),
            "update pets set color = $2, name = $3, owner = $4 where id = $1 \
                returning id, name, owner, color",
        );
    }

    #[test]
    fn delete() {
        assert_eq!(
            delete_sql::<Pet>(),
            "delete from pets where id = $1 returning id, name, owner, color",
        );
    }

    #[test]
    fn row_columns_map_to_fields() {
        // Column 0 is the key, so column `i` holds `FIELDS[i - 1]`.
        let row = [None, Some("momo"), None, Some("grey")];
        let mut requested = vec![];
        let pet: Pet = from_columns(Key(7), |i| {
            requested.push(i);
            row[i].map(Into::into)
        });

        assert_eq!(requested, [1, 2, 3]);
        assert_eq!(pet, Pet {
            key: Key(7),
            name: Some("momo".into()),
            owner: None,
            color: Some("grey".into()),
        });
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn logged_queries_do_not_contain_values() {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let fields = vec![("password", Some("hunter2".to_owned()))];
        let params = fields.iter().map(|(_, value)| value as Param).collect::<Vec<_>>();
        tracing::subscriber::with_default(subscriber, || {
            log_query("insert into users (password) values ($1)", &params);
        });

        let logged = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("insert into users (password) values ($1)"), "{logged}");
        assert!(logged.contains("(1 params)"), "{logged}");
        assert!(!logged.contains("hunter2"), "{logged}");
    }
}
