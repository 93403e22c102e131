use sea_orm::DatabaseConnection;
use tracing::info;
use uuid::Uuid;

use models::{college, user};

use crate::identity::domain::{College, GradingScale, NewUser, UserRecord};
use crate::identity::errors::IdentityError;
use crate::identity::repository::IdentityRepository;

pub struct SeaOrmIdentityRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmIdentityRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn to_record(u: user::Model) -> UserRecord {
    UserRecord { id: u.id, username: u.username, email: u.email, password_hash: u.password_hash, college_id: u.college_id }
}

#[async_trait::async_trait]
impl IdentityRepository for SeaOrmIdentityRepository {
    async fn ensure_college(&self, name: &str, grading_scale: GradingScale) -> Result<College, IdentityError> {
        let (c, created) = college::ensure(&self.db, name, grading_scale).await?;
        if created {
            info!(college_id = %c.id, name = %c.name, "default_college_created");
        }
        Ok(College { id: c.id, name: c.name, grading_scale: c.grading_scale })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, IdentityError> {
        Ok(user::find_by_email(&self.db, email).await?.map(to_record))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, IdentityError> {
        Ok(user::find_by_username(&self.db, username).await?.map(to_record))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord, IdentityError> {
        let created = user::create(&self.db, &new_user.username, &new_user.email, &new_user.password_hash, new_user.college_id).await?;
        Ok(to_record(created))
    }

    async fn update_password(&self, user_id: Uuid, password_hash: String) -> Result<(), IdentityError> {
        user::update_password_hash(&self.db, user_id, password_hash).await?;
        Ok(())
    }
}
