//! The GraphQL schema: root query, root mutation and the object types.

use juniper::EmptySubscription;

use self::{
    mutation::Mutation,
    query::Query,
};

pub(crate) mod err;
pub(crate) mod model;

mod context;
mod id;
mod mutation;
mod query;


pub(crate) use self::{
    id::Id,
    context::Context,
};


/// Builds the schema. Done once on startup.
pub(crate) fn root_node() -> RootNode {
    RootNode::new(Query, Mutation, EmptySubscription::new())
}

/// Type of our API root node.
pub(crate) type RootNode = juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;
