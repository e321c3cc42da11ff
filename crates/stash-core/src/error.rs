use std::sync::Arc;

/// Helper macro for returning ad-hoc errors.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Helper macro for creating ad-hoc errors.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur in Stash.
#[derive(Clone)]
pub struct Error {
    inner: Arc<ErrorInner>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
}

#[derive(Debug)]
enum ErrorKind {
    /// A value map was requested for a handle that was never merged.
    NotFound(String),

    /// The predicate is outside the translator's supported grammar.
    UnsupportedPredicateShape(String),

    /// A save referenced a handle with no known resource id.
    UnresolvedRelationship(String),

    /// A durable merge transaction could not commit.
    DurableWriteFailed(String),

    /// A remote source call failed or timed out.
    RemoteUnavailable(String),

    /// The operation is not available under the configured cache mode.
    UnsupportedOperation(String),

    /// Ad-hoc error created via `err!` / `bail!`.
    Adhoc(String),

    /// Bridge for errors raised by third-party crates.
    Anyhow(anyhow::Error),
}

macro_rules! constructors {
    ( $( $(#[$meta:meta])* $name:ident / $is_name:ident => $variant:ident; )* ) => {
        $(
            $(#[$meta])*
            pub fn $name(msg: impl Into<String>) -> Self {
                Self::from(ErrorKind::$variant(msg.into()))
            }

            pub fn $is_name(&self) -> bool {
                matches!(self.kind(), ErrorKind::$variant(_))
            }
        )*
    };
}

impl Error {
    constructors! {
        /// A value map was requested for an unmerged (or foreign) handle.
        not_found / is_not_found => NotFound;

        /// The predicate cannot be translated; see the translator contract.
        unsupported_predicate_shape / is_unsupported_predicate_shape => UnsupportedPredicateShape;

        /// A related handle could not be resolved to a resource id.
        unresolved_relationship / is_unresolved_relationship => UnresolvedRelationship;

        /// The durable mirror failed to commit a merge batch.
        durable_write_failed / is_durable_write_failed => DurableWriteFailed;

        /// The remote source is unreachable or returned a failure.
        remote_unavailable / is_remote_unavailable => RemoteUnavailable;

        /// The operation is disabled under the configured cache mode.
        unsupported_operation / is_unsupported_operation => UnsupportedOperation;
    }

    #[doc(hidden)]
    pub fn from_args(args: core::fmt::Arguments<'_>) -> Self {
        Self::from(ErrorKind::Adhoc(std::fmt::format(args)))
    }

    fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self.kind() {
            NotFound(msg) => write!(f, "record not found: {msg}"),
            UnsupportedPredicateShape(msg) => write!(f, "unsupported predicate shape: {msg}"),
            UnresolvedRelationship(msg) => write!(f, "unresolved relationship: {msg}"),
            DurableWriteFailed(msg) => write!(f, "durable write failed: {msg}"),
            RemoteUnavailable(msg) => write!(f, "remote source unavailable: {msg}"),
            UnsupportedOperation(msg) => write!(f, "unsupported operation: {msg}"),
            Adhoc(msg) => f.write_str(msg),
            Anyhow(err) => core::fmt::Display::fmt(err, f),
        }
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if f.alternate() {
            f.debug_struct("Error").field("kind", &self.inner.kind).finish()
        } else {
            core::fmt::Display::fmt(self, f)
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            inner: Arc::new(ErrorInner { kind }),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::from(ErrorKind::Anyhow(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::from(anyhow::Error::from(err))
    }
}
