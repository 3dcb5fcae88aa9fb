use super::Key;


/// A flat record stored in one of our collections.
///
/// Every field except the key is an optional string: the storage layer does
/// not know about required fields. Fields are addressed by their column name.
pub(crate) trait Document: Sized + Send {
    /// Name of the collection, which is also the table name in Postgres.
    const COLLECTION: &'static str;

    /// All column names except `id`. `from_values` receives values in exactly
    /// this order.
    const FIELDS: &'static [&'static str];

    fn from_values(key: Key, values: Vec<Option<String>>) -> Self;

    /// Returns the position of the given column in `FIELDS`. Panics if the
    /// column does not exist, as that is always a bug in our code.
    fn field_index(name: &str) -> usize {
        Self::FIELDS.iter()
            .position(|f| *f == name)
            .unwrap_or_else(|| panic!(
                "bug: collection '{}' has no field '{name}'",
                Self::COLLECTION,
            ))
    }
}

/// A list of column/value pairs to write.
pub(crate) type Fields = Vec<(&'static str, Option<String>)>;

/// Selects records from a collection.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Filter<'a> {
    All,

    /// Only records where the given column equals the given value.
    Eq(&'static str, &'a str),
}
