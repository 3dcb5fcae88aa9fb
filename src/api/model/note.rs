use juniper::graphql_object;

use crate::{
    api::{Context, Id, err::ApiResult},
    db::{Document, Fields, Filter, Key},
    prelude::*,
};
use super::required;


pub(crate) struct Note {
    key: Key,
    user_id: Option<String>,
    title: Option<String>,
    text: Option<String>,
    time: Option<String>,
    day: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    color: Option<String>,
}

/// A single note. All values besides the title are free-form strings that the
/// API does not interpret.
#[graphql_object(Context = Context)]
impl Note {
    fn id(&self) -> Option<Id> {
        Some(Id::note(self.key))
    }

    fn title(&self) -> ApiResult<&str> {
        required(&self.title, "title", self.key)
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    /// The ID of the user this note belongs to. Not checked in any way.
    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn day(&self) -> Option<&str> {
        self.day.as_deref()
    }

    fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }
}

pub(crate) struct NewNote {
    pub(crate) title: Option<String>,
    pub(crate) text: Option<String>,
    pub(crate) time: Option<String>,
    pub(crate) user_id: Option<String>,
    pub(crate) day: Option<String>,
    pub(crate) start_time: Option<String>,
    pub(crate) end_time: Option<String>,
    pub(crate) color: Option<String>,
}

/// The fields `updateNote` can change. `None` means "leave as is".
pub(crate) struct UpdateNote {
    pub(crate) title: Option<String>,
    pub(crate) text: Option<String>,
    pub(crate) start_time: Option<String>,
    pub(crate) end_time: Option<String>,
    pub(crate) color: Option<String>,
}

impl UpdateNote {
    fn into_fields(self) -> Fields {
        [
            ("title", self.title),
            ("text", self.text),
            ("start_time", self.start_time),
            ("end_time", self.end_time),
            ("color", self.color),
        ]
            .into_iter()
            .filter(|(_, value)| value.is_some())
            .collect()
    }
}

impl Note {
    pub(crate) async fn load_by_id(id: Option<Id>, context: &Context) -> ApiResult<Option<Self>> {
        match key_of(id)? {
            Some(key) => Ok(context.db.find_by_key(key).await?),
            None => Ok(None),
        }
    }

    pub(crate) async fn load_for_user(user: Id, context: &Context) -> ApiResult<Vec<Self>> {
        let user = user.to_string();
        Ok(context.db.find(Filter::Eq("user_id", &user)).await?)
    }

    pub(crate) async fn add(note: NewNote, context: &Context) -> ApiResult<Self> {
        let note: Self = context.db.insert(vec![
            ("user_id", note.user_id),
            ("title", note.title),
            ("text", note.text),
            ("time", note.time),
            ("day", note.day),
            ("start_time", note.start_time),
            ("end_time", note.end_time),
            ("color", note.color),
        ]).await?;

        debug!("Added note {}", Id::note(note.key));
        Ok(note)
    }

    pub(crate) async fn remove(id: Option<Id>, context: &Context) -> ApiResult<Option<Self>> {
        let Some(key) = key_of(id)? else { return Ok(None) };
        let removed = context.db.delete_by_key::<Self>(key).await?;
        if removed.is_some() {
            debug!("Removed note {}", Id::note(key));
        }
        Ok(removed)
    }

    pub(crate) async fn update(
        id: Option<Id>,
        set: UpdateNote,
        context: &Context,
    ) -> ApiResult<Option<Self>> {
        let Some(key) = key_of(id)? else { return Ok(None) };
        Ok(context.db.update_by_key(key, set.into_fields()).await?)
    }
}

fn key_of(id: Option<Id>) -> ApiResult<Option<Key>> {
    match id {
        Some(id) => id.checked_key_for(Id::NOTE_KIND),
        None => Ok(None),
    }
}

impl Document for Note {
    const COLLECTION: &'static str = "notes";
    const FIELDS: &'static [&'static str] = &[
        "user_id",
        "title",
        "text",
        "time",
        "day",
        "start_time",
        "end_time",
        "color",
    ];

    fn from_values(key: Key, values: Vec<Option<String>>) -> Self {
        let mut values = values.into_iter();
        let mut next = || values.next().flatten();
        Self {
            key,
            user_id: next(),
            title: next(),
            text: next(),
            time: next(),
            day: next(),
            start_time: next(),
            end_time: next(),
            color: next(),
        }
    }
}
