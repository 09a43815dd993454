use std::collections::BTreeSet;

use crate::store::IdentityStore;

/// Snapshot of registered usernames taken when a session starts.
///
/// The snapshot is never refreshed: identities enrolled or removed
/// afterwards are not reflected until a new session loads a new one.
#[derive(Debug, Clone)]
pub struct Directory {
    usernames: BTreeSet<String>,
}

impl Directory {
    /// List the store. A listing failure yields an empty directory.
    pub fn load(store: &IdentityStore) -> Self {
        let usernames = match store.list_identities() {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "identity listing failed, using empty directory");
                BTreeSet::new()
            }
        };
        Self::from_usernames(usernames)
    }

    pub fn from_usernames(usernames: impl IntoIterator<Item = String>) -> Self {
        Self {
            usernames: usernames.into_iter().collect(),
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.usernames.contains(username)
    }

    pub fn len(&self) -> usize {
        self.usernames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usernames.is_empty()
    }

    /// Usernames in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.usernames.iter().map(String::as_str)
    }
}
