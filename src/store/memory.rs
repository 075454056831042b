//! In-memory user store for testing and simple deployments

use std::collections::HashMap;
use tokio::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::UserStore;
use crate::user::User;
use crate::{AuthError, AuthResult};

/// In-memory user store backed by a `RwLock`ed map. Uniqueness of
/// username and email is enforced the same way a database constraint
/// would surface it.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn conflict_in<'a, I>(records: I, candidate: &User) -> Option<&'static str>
    where
        I: Iterator<Item = &'a User>,
    {
        for existing in records {
            if existing.id == candidate.id {
                continue;
            }
            if existing.username == candidate.username {
                return Some("username");
            }
            if existing.email == candidate.email {
                return Some("email");
            }
        }
        None
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().await;
        if let Some(field) = Self::conflict_in(users.values(), user) {
            return Err(AuthError::conflict(field));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(AuthError::NotFound);
        }
        if let Some(field) = Self::conflict_in(users.values(), user) {
            return Err(AuthError::conflict(field));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AuthResult<bool> {
        let mut users = self.users.write().await;
        Ok(users.remove(&id).is_some())
    }

    async fn list(&self, skip: u64, limit: u64) -> AuthResult<Vec<User>> {
        let users = self.users.read().await;
        let mut records: Vec<User> = users.values().cloned().collect();
        records.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(records
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_enabled_admins(&self) -> AuthResult<u64> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| u.is_enabled_admin()).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::Role;
    use std::collections::BTreeSet;

    fn make_user(username: &str, email: &str, role: Role) -> User {
        User::new(
            username.to_string(),
            email.to_string(),
            "$argon2id$stub".to_string(),
            role,
            BTreeSet::new(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = InMemoryUserStore::new();
        let user = make_user("alice", "alice@example.com", Role::User);
        store.insert(&user).await.unwrap();

        assert_eq!(store.find_by_id(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(
            store.find_by_username("alice").await.unwrap(),
            Some(user.clone())
        );
        assert_eq!(
            store.find_by_email("alice@example.com").await.unwrap(),
            Some(user)
        );
        assert_eq!(store.find_by_username("bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_uniqueness_on_insert() {
        let store = InMemoryUserStore::new();
        store
            .insert(&make_user("alice", "alice@example.com", Role::User))
            .await
            .unwrap();

        let dup_name = make_user("alice", "other@example.com", Role::User);
        assert_eq!(
            store.insert(&dup_name).await.unwrap_err(),
            AuthError::conflict("username")
        );

        let dup_mail = make_user("bob", "alice@example.com", Role::User);
        assert_eq!(
            store.insert(&dup_mail).await.unwrap_err(),
            AuthError::conflict("email")
        );
    }

    #[tokio::test]
    async fn test_update_conflict_leaves_records_unchanged() {
        let store = InMemoryUserStore::new();
        let a = make_user("alice", "alice@example.com", Role::User);
        let b = make_user("bob", "bob@example.com", Role::User);
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();

        let mut patched = a.clone();
        patched.username = "bob".to_string();
        assert_eq!(
            store.update(&patched).await.unwrap_err(),
            AuthError::conflict("username")
        );

        // Both records are intact.
        assert_eq!(store.find_by_id(a.id).await.unwrap(), Some(a));
        assert_eq!(store.find_by_id(b.id).await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = InMemoryUserStore::new();
        let ghost = make_user("ghost", "ghost@example.com", Role::User);
        assert_eq!(store.update(&ghost).await.unwrap_err(), AuthError::NotFound);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let store = InMemoryUserStore::new();
        for name in ["carol", "alice", "bob"] {
            store
                .insert(&make_user(name, &format!("{name}@example.com"), Role::User))
                .await
                .unwrap();
        }

        let page = store.list(0, 2).await.unwrap();
        let names: Vec<&str> = page.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);

        let page = store.list(2, 2).await.unwrap();
        let names: Vec<&str> = page.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["carol"]);
    }

    #[tokio::test]
    async fn test_count_enabled_admins() {
        let store = InMemoryUserStore::new();
        store
            .insert(&make_user("admin1", "a1@example.com", Role::Admin))
            .await
            .unwrap();
        let mut disabled_admin = make_user("admin2", "a2@example.com", Role::Admin);
        disabled_admin.disabled = true;
        store.insert(&disabled_admin).await.unwrap();
        store
            .insert(&make_user("user1", "u1@example.com", Role::User))
            .await
            .unwrap();

        assert_eq!(store.count_enabled_admins().await.unwrap(), 1);
    }
}
