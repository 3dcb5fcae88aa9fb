use juniper::graphql_object;

use super::{
    Context,
    Id,
    err::ApiResult,
    model::{
        List,
        list,
        note::Note,
        note_category::NoteCategory,
        user::User,
    },
};


/// The root query object.
pub(crate) struct Query;

#[graphql_object(Context = Context)]
impl Query {
    /// Returns the note with the given ID or `null` if there is no such note.
    async fn get_single_note(id: Option<Id>, context: &Context) -> ApiResult<Option<Note>> {
        Note::load_by_id(id, context).await
    }

    /// Returns the user with the given ID or `null` if there is no such user.
    async fn get_user(id: Option<Id>, context: &Context) -> ApiResult<Option<User>> {
        User::load_by_id(id, context).await
    }

    /// Returns all users.
    async fn get_all_users(context: &Context) -> ApiResult<List<User>> {
        User::load_all(context).await.map(list)
    }

    /// Returns all note categories of all users.
    async fn get_note_category(context: &Context) -> ApiResult<List<NoteCategory>> {
        NoteCategory::load_all(context).await.map(list)
    }
}
