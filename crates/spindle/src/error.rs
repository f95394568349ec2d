//! Error types for store configuration and wiring

use thiserror::Error;

/// Everything that can go wrong while wiring or configuring a store.
///
/// Reductions themselves are total. Apart from [`StateError::Config`] and
/// [`StateError::Io`], the variants describe programmer mistakes (a reducer
/// that needs an extension that was never installed, an object factory that
/// disagrees with its branches) and are raised through [`fail_fast`].
#[derive(Debug, Error)]
pub enum StateError {
    #[error("capability `{0}` is not installed on this store, add the extension that provides it")]
    MissingCapability(&'static str),

    #[error("branch index {index} is out of range for a combined state of {len} branches")]
    BranchOutOfRange { index: usize, len: usize },

    #[error("branch {index} does not hold a `{expected}`")]
    BranchTypeMismatch { index: usize, expected: &'static str },

    #[error("branch {index} was already taken from the parts")]
    BranchTaken { index: usize },

    #[error("object factory produced {parts} parts for {branches} branches")]
    BranchCountMismatch { parts: usize, branches: usize },

    #[error("shared state was read before its reducer was created")]
    SharedStateUnavailable,

    #[error("store was dropped while a scope still referenced it")]
    StoreDropped,

    #[error("failed to spawn thunk task: {0}")]
    Spawn(#[from] futures::task::SpawnError),

    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}

/// Log a wiring error and abort the current dispatch.
///
/// Used where the error can only come from a misconfigured store, so there is
/// no caller that could sensibly recover.
#[track_caller]
pub fn fail_fast(error: StateError) -> ! {
    log::error!("{}", error);
    panic!("{}", error)
}
