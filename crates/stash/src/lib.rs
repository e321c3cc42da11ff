mod builder;
pub use builder::Builder;

mod engine;

mod identity;

mod merge;

mod notify;
pub use notify::Notification;

pub mod store;
pub use store::{CacheMode, Related, Relations, Store};

mod translate;

pub use stash_core::{
    mirror::{self, Mirror},
    schema::{self, Schema},
    source::{self, RemoteSource},
    stmt, Error, Result,
};
