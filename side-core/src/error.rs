// Licensed under the MIT license.

use thiserror::Error;

/// Errors returned by the event/tracer registry.
#[derive(Debug, Error)]
pub enum Error {
    /// The argument failed a basic sanity check (e.g. an empty name).
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// A callback was already present on the event or tracer it was being
    /// attached to.
    #[error("callback already registered")]
    AlreadyExists,
    /// A callback array was full.
    #[error("no room for another callback")]
    NoMemory,
    /// A callback was not found among those currently attached.
    #[error("callback not found")]
    NotFound,
    /// The registry has been finalized (e.g. during process shutdown) and
    /// no longer accepts new registrations.
    #[error("registry is finalized")]
    Finalized,
}
