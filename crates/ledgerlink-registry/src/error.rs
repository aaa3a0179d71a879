use thiserror::Error;

/// Errors arising from peer discovery and quorum queries.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No amount (or other sampled value) reached the `QuerySize / 2 + 1`
    /// threshold across the fanned-out responses.
    #[error("no quorum reached")]
    NoQuorum,

    /// An operation that requires at least one known peer was attempted
    /// against an empty registry.
    #[error("peer registry is empty")]
    EmptyRegistry,
}
