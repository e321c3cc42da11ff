mod error;
pub use error::Error;

pub mod mirror;
pub use mirror::Mirror;

pub mod schema;
pub use schema::Schema;

pub mod source;
pub use source::RemoteSource;

pub mod stmt;

/// A Result type alias that uses Stash's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

pub use async_trait::async_trait;
