//! Current user lookup.
//!
//! The user blob is written by the host's session layer; the notebook only
//! reads it to decide what to show. The role is trusted as given.

use crate::store::{JsonStoreExt, KeyValueStore, CURRENT_USER_KEY};
use crate::types::User;
use notebook_core::AppResult;

/// Read the signed-in user, if any.
pub fn current_user(store: &dyn KeyValueStore) -> AppResult<Option<User>> {
    let user: Option<User> = store.get_json(CURRENT_USER_KEY)?;
    tracing::debug!(
        admin = user.as_ref().map(User::is_admin).unwrap_or(false),
        "Loaded current user"
    );
    Ok(user)
}

/// Record the signed-in user. Used by hosts that own the session.
pub fn set_current_user(store: &dyn KeyValueStore, user: &User) -> AppResult<()> {
    store.set_json(CURRENT_USER_KEY, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_no_user() {
        let store = MemoryStore::new();
        assert_eq!(current_user(&store).unwrap(), None);
    }

    #[test]
    fn test_user_roundtrip() {
        let store = MemoryStore::new();
        set_current_user(&store, &User::admin()).unwrap();
        assert!(current_user(&store).unwrap().unwrap().is_admin());

        store.set(CURRENT_USER_KEY, r#"{"role":"worker","name":"Minh"}"#).unwrap();
        let user = current_user(&store).unwrap().unwrap();
        assert!(!user.is_admin());
    }
}
