//! All object types of the API and their persistence.

use crate::db::Key;
use super::err::{ApiError, ApiResult};

pub(crate) mod note;
pub(crate) mod note_category;
pub(crate) mod user;


/// A GraphQL list that is nullable and has nullable items (`[T]`). A field
/// error inside one item then only nulls that item instead of the whole list
/// and its parent object.
pub(crate) type List<T> = Option<Vec<Option<T>>>;

pub(crate) fn list<T>(items: Vec<T>) -> List<T> {
    Some(items.into_iter().map(Some).collect())
}

/// Returns the value of a field the API declares as non-null. The storage
/// itself has no required fields, so a record might still lack it.
fn required<'a>(value: &'a Option<String>, field: &str, key: Key) -> ApiResult<&'a str> {
    value.as_deref()
        .ok_or_else(|| {
            ApiError::internal(format_args!("stored record {key:?} has no '{field}'"))
        })
}
