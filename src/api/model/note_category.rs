use juniper::graphql_object;

use crate::{
    api::{Context, Id, err::ApiResult},
    db::{Document, Filter, Key},
    prelude::*,
};
use super::required;


pub(crate) struct NoteCategory {
    key: Key,
    user_id: Option<String>,
    title: Option<String>,
    color: Option<String>,
}

#[graphql_object(Context = Context)]
impl NoteCategory {
    fn id(&self) -> Option<Id> {
        Some(Id::note_category(self.key))
    }

    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn title(&self) -> ApiResult<&str> {
        required(&self.title, "title", self.key)
    }

    fn color(&self) -> ApiResult<&str> {
        required(&self.color, "color", self.key)
    }
}

pub(crate) struct NewNoteCategory {
    pub(crate) user_id: Option<String>,
    pub(crate) title: String,
    pub(crate) color: String,
}

impl NoteCategory {
    pub(crate) async fn load_all(context: &Context) -> ApiResult<Vec<Self>> {
        Ok(context.db.find(Filter::All).await?)
    }

    pub(crate) async fn load_for_user(user: Id, context: &Context) -> ApiResult<Vec<Self>> {
        let user = user.to_string();
        Ok(context.db.find(Filter::Eq("user_id", &user)).await?)
    }

    pub(crate) async fn add(category: NewNoteCategory, context: &Context) -> ApiResult<Self> {
        let category: Self = context.db.insert(vec![
            ("user_id", category.user_id),
            ("title", Some(category.title)),
            ("color", Some(category.color)),
        ]).await?;

        debug!("Added note category {}", Id::note_category(category.key));
        Ok(category)
    }

    pub(crate) async fn remove(id: Option<Id>, context: &Context) -> ApiResult<Option<Self>> {
        let key = match id {
            Some(id) => id.checked_key_for(Id::NOTE_CATEGORY_KIND)?,
            None => None,
        };
        let Some(key) = key else { return Ok(None) };

        let removed = context.db.delete_by_key::<Self>(key).await?;
        if removed.is_some() {
            debug!("Removed note category {}", Id::note_category(key));
        }
        Ok(removed)
    }
}

impl Document for NoteCategory {
    const COLLECTION: &'static str = "note_categories";
    const FIELDS: &'static [&'static str] = &["user_id", "title", "color"];

    fn from_values(key: Key, values: Vec<Option<String>>) -> Self {
        let mut values = values.into_iter();
        let mut next = || values.next().flatten();
        Self {
            key,
            user_id: next(),
            title: next(),
            color: next(),
        }
    }
}
