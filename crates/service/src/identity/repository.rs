use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{College, GradingScale, NewUser, UserRecord};
use super::errors::IdentityError;

/// Repository abstraction for identity persistence.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Idempotent lookup-or-create of a college by its unique name.
    async fn ensure_college(&self, name: &str, grading_scale: GradingScale) -> Result<College, IdentityError>;

    /// `email` is expected lower-cased.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, IdentityError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, IdentityError>;

    /// Fails with [`IdentityError::Conflict`] when username or email is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord, IdentityError>;
    async fn update_password(&self, user_id: Uuid, password_hash: String) -> Result<(), IdentityError>;
}

/// Simple in-memory mock repository for tests, benches and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockIdentityRepository {
        colleges: Mutex<HashMap<String, College>>, // key: name
        users: Mutex<Vec<UserRecord>>,
        calls: AtomicUsize,
        creates: AtomicUsize,
        fail_next_user_create: AtomicBool,
        conflict_next_user_create: AtomicBool,
    }

    impl MockIdentityRepository {
        /// Every trait method invocation, reads included.
        pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

        /// Colleges plus users actually inserted through the trait.
        pub fn creates(&self) -> usize { self.creates.load(Ordering::SeqCst) }

        pub fn colleges(&self) -> Vec<College> {
            self.colleges.lock().unwrap().values().cloned().collect()
        }

        pub fn users(&self) -> Vec<UserRecord> {
            self.users.lock().unwrap().clone()
        }

        pub fn user_by_username(&self, username: &str) -> Option<UserRecord> {
            self.users.lock().unwrap().iter().find(|u| u.username == username).cloned()
        }

        /// Insert a user directly, bypassing counters.
        pub fn seed_user(&self, username: &str, email: &str) -> UserRecord {
            let user = UserRecord {
                id: Uuid::new_v4(),
                username: username.to_string(),
                email: email.to_lowercase(),
                password_hash: "$argon2id$seeded".to_string(),
                college_id: Uuid::nil(),
            };
            self.users.lock().unwrap().push(user.clone());
            user
        }

        /// Insert a college directly, bypassing counters.
        pub fn seed_college(&self, name: &str, grading_scale: GradingScale) -> College {
            let college = College { id: Uuid::new_v4(), name: name.to_string(), grading_scale };
            self.colleges.lock().unwrap().insert(name.to_string(), college.clone());
            college
        }

        /// Make the next `create_user` fail the way a dropped connection would.
        pub fn fail_next_user_create(&self) {
            self.fail_next_user_create.store(true, Ordering::SeqCst);
        }

        /// Make the next `create_user` hit a unique violation, as if another
        /// login inserted the same username between lookup and insert.
        pub fn fail_next_user_create_with_conflict(&self) {
            self.conflict_next_user_create.store(true, Ordering::SeqCst);
        }

        fn touch(&self) { self.calls.fetch_add(1, Ordering::SeqCst); }
    }

    #[async_trait]
    impl IdentityRepository for MockIdentityRepository {
        async fn ensure_college(&self, name: &str, grading_scale: GradingScale) -> Result<College, IdentityError> {
            self.touch();
            let mut colleges = self.colleges.lock().unwrap();
            if let Some(existing) = colleges.get(name) {
                return Ok(existing.clone());
            }
            let college = College { id: Uuid::new_v4(), name: name.to_string(), grading_scale };
            colleges.insert(name.to_string(), college.clone());
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(college)
        }

        async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, IdentityError> {
            self.touch();
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.email == email).cloned())
        }

        async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, IdentityError> {
            self.touch();
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.username == username).cloned())
        }

        async fn create_user(&self, new_user: NewUser) -> Result<UserRecord, IdentityError> {
            self.touch();
            if self.fail_next_user_create.swap(false, Ordering::SeqCst) {
                return Err(IdentityError::Repository("connection reset".into()));
            }
            if self.conflict_next_user_create.swap(false, Ordering::SeqCst) {
                return Err(IdentityError::Conflict(format!("username {} exists", new_user.username)));
            }
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.username == new_user.username) {
                return Err(IdentityError::Conflict(format!("username {} exists", new_user.username)));
            }
            if users.iter().any(|u| u.email == new_user.email) {
                return Err(IdentityError::Conflict(format!("email {} exists", new_user.email)));
            }
            let user = UserRecord {
                id: Uuid::new_v4(),
                username: new_user.username,
                email: new_user.email,
                password_hash: new_user.password_hash,
                college_id: new_user.college_id,
            };
            users.push(user.clone());
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(user)
        }

        async fn update_password(&self, user_id: Uuid, password_hash: String) -> Result<(), IdentityError> {
            self.touch();
            let mut users = self.users.lock().unwrap();
            let user = users.iter_mut().find(|u| u.id == user_id).ok_or(IdentityError::NotFound)?;
            user.password_hash = password_hash;
            Ok(())
        }
    }
}
