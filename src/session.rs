use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque id of the authenticated user a book collection belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Identity(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supplies the current user to the rest of the crate.
///
/// Login, signup and logout live with the embedding application; the core
/// only ever asks who is signed in right now.
pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;
}

/// Provider pinned to a single known identity, for single-user embeddings.
pub struct FixedIdentity(Identity);

impl FixedIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        FixedIdentity(Identity::new(id))
    }
}

impl IdentityProvider for FixedIdentity {
    fn current_identity(&self) -> Option<Identity> {
        Some(self.0.clone())
    }
}
