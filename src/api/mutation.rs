use juniper::graphql_object;

use super::{
    Context,
    err::ApiResult,
    id::Id,
    model::{
        note::{Note, NewNote, UpdateNote},
        note_category::{NoteCategory, NewNoteCategory},
        user::{User, NewUser},
    },
};


/// The root mutation object.
pub(crate) struct Mutation;

#[graphql_object(Context = Context)]
impl Mutation {
    /// Creates a new note and returns it.
    async fn add_note(
        title: Option<String>,
        text: Option<String>,
        time: Option<String>,
        user_id: Option<String>,
        day: Option<String>,
        start_time: Option<String>,
        end_time: Option<String>,
        color: Option<String>,
        context: &Context,
    ) -> ApiResult<Option<Note>> {
        let note = NewNote { title, text, time, user_id, day, start_time, end_time, color };
        Note::add(note, context).await.map(Some)
    }

    /// Removes a note. Returns the removed note or `null` if there was no note
    /// with that ID.
    async fn del_note(id: Option<Id>, context: &Context) -> ApiResult<Option<Note>> {
        Note::remove(id, context).await
    }

    /// Changes some fields of a note and returns the updated note, or `null`
    /// if there is no note with that ID. Fields that are not given (or `null`)
    /// keep their current value.
    async fn update_note(
        id: Option<Id>,
        title: Option<String>,
        text: Option<String>,
        start_time: Option<String>,
        end_time: Option<String>,
        color: Option<String>,
        context: &Context,
    ) -> ApiResult<Option<Note>> {
        let set = UpdateNote { title, text, start_time, end_time, color };
        Note::update(id, set, context).await
    }

    /// Creates a new user and returns it.
    async fn add_user(
        username: String,
        password: String,
        email: String,
        avatar: Option<String>,
        context: &Context,
    ) -> ApiResult<Option<User>> {
        User::add(NewUser { username, password, email, avatar }, context).await.map(Some)
    }

    /// Creates a new note category and returns it.
    async fn add_note_category(
        user_id: Option<String>,
        title: String,
        color: String,
        context: &Context,
    ) -> ApiResult<Option<NoteCategory>> {
        NoteCategory::add(NewNoteCategory { user_id, title, color }, context).await.map(Some)
    }

    /// Removes a note category. Returns the removed category or `null` if
    /// there was no category with that ID.
    async fn del_note_category(
        id: Option<Id>,
        context: &Context,
    ) -> ApiResult<Option<NoteCategory>> {
        NoteCategory::remove(id, context).await
    }
}
