use crate::db::Db;


/// The context that is accessible to every resolver in our API.
pub(crate) struct Context {
    pub(crate) db: Db,
}

impl juniper::Context for Context {}
