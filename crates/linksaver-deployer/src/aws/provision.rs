//! Create-operation outcomes
//!
//! Create calls that tolerate "already exists" return [`Provisioned`]
//! instead of erroring, so callers match on the outcome explicitly rather
//! than catching a named exception.

/// Outcome of a create operation for a named resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioned<T> {
    /// The resource was created by this run
    Created(T),
    /// The resource already existed; the reference was reconstructed
    /// deterministically from the run's names
    Reused(T),
}

impl<T> Provisioned<T> {
    /// The resource reference, however it was obtained.
    pub fn into_inner(self) -> T {
        match self {
            Provisioned::Created(v) | Provisioned::Reused(v) => v,
        }
    }

    pub fn is_reused(&self) -> bool {
        matches!(self, Provisioned::Reused(_))
    }
}
