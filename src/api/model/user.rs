use juniper::graphql_object;

use crate::{
    api::{Context, Id, err::ApiResult},
    db::{Document, Filter, Key},
    prelude::*,
};
use super::{List, list, note::Note, note_category::NoteCategory, required};


pub(crate) struct User {
    key: Key,
    username: Option<String>,
    password: Option<String>,
    email: Option<String>,
    avatar: Option<String>,
}

/// A user of the app. The password is stored and returned as given.
#[graphql_object(Context = Context)]
impl User {
    fn id(&self) -> Option<Id> {
        Some(Id::user(self.key))
    }

    fn username(&self) -> ApiResult<&str> {
        required(&self.username, "username", self.key)
    }

    fn password(&self) -> ApiResult<&str> {
        required(&self.password, "password", self.key)
    }

    fn email(&self) -> ApiResult<&str> {
        required(&self.email, "email", self.key)
    }

    fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    /// All notes whose `userId` is the ID of this user.
    async fn user_notes(&self, context: &Context) -> ApiResult<List<Note>> {
        Note::load_for_user(Id::user(self.key), context).await.map(list)
    }

    /// All note categories whose `userId` is the ID of this user.
    async fn note_category(&self, context: &Context) -> ApiResult<List<NoteCategory>> {
        NoteCategory::load_for_user(Id::user(self.key), context).await.map(list)
    }
}

pub(crate) struct NewUser {
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) email: String,
    pub(crate) avatar: Option<String>,
}

impl User {
    pub(crate) async fn load_by_id(id: Option<Id>, context: &Context) -> ApiResult<Option<Self>> {
        let Some(id) = id else { return Ok(None) };
        match id.checked_key_for(Id::USER_KIND)? {
            Some(key) => Ok(context.db.find_by_key(key).await?),
            None => Ok(None),
        }
    }

    pub(crate) async fn load_all(context: &Context) -> ApiResult<Vec<Self>> {
        Ok(context.db.find(Filter::All).await?)
    }

    pub(crate) async fn add(user: NewUser, context: &Context) -> ApiResult<Self> {
        let user: Self = context.db.insert(vec![
            ("username", Some(user.username)),
            ("password", Some(user.password)),
            ("email", Some(user.email)),
            ("avatar", user.avatar),
        ]).await?;

        debug!("Added user {}", Id::user(user.key));
        Ok(user)
    }
}

impl Document for User {
    const COLLECTION: &'static str = "users";
    const FIELDS: &'static [&'static str] = &["username", "password", "email", "avatar"];

    fn from_values(key: Key, values: Vec<Option<String>>) -> Self {
        let mut values = values.into_iter();
        let mut next = || values.next().flatten();
        Self {
            key,
            username: next(),
            password: next(),
            email: next(),
            avatar: next(),
        }
    }
}
