use sea_orm::{entity::prelude::*, DatabaseConnection, QueryFilter, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::college;
use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub college_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    College,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::College => Entity::belongs_to(college::Entity).from(Column::CollegeId).to(college::Column::Id).into() }
    }
}

impl Related<college::Entity> for Entity {
    fn to() -> RelationDef { Relation::College.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    if !email.contains('@') { return Err(ModelError::Validation("invalid email".into())); }
    if email.len() > 255 { return Err(ModelError::Validation("email too long (<=255)".into())); }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ModelError> {
    if username.trim().is_empty() { return Err(ModelError::Validation("username required".into())); }
    if username.len() > 64 { return Err(ModelError::Validation("username too long (<=64)".into())); }
    Ok(())
}

/// Insert a user. The email is stored lower-cased; `password_hash` must
/// already be a hash.
pub async fn create(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password_hash: &str,
    college_id: Uuid,
) -> Result<Model, ModelError> {
    validate_username(username)?;
    validate_email(email)?;
    if password_hash.trim().is_empty() { return Err(ModelError::Validation("password hash required".into())); }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email.to_lowercase()),
        password_hash: Set(password_hash.to_string()),
        college_id: Set(college_id),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(ModelError::from)
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::Email.eq(email.to_lowercase()))
        .one(db)
        .await
        .map_err(ModelError::from)
}

pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::Username.eq(username.to_string()))
        .one(db)
        .await
        .map_err(ModelError::from)
}

pub async fn update_password_hash(db: &DatabaseConnection, id: Uuid, password_hash: String) -> Result<Model, ModelError> {
    if password_hash.trim().is_empty() { return Err(ModelError::Validation("password hash required".into())); }
    let mut am: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ModelError::Validation("user not found".into()))?
        .into();
    am.password_hash = Set(password_hash);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(ModelError::from)
}

pub async fn hard_delete(db: &DatabaseConnection, id: Uuid) -> Result<(), ModelError> {
    Entity::delete_by_id(id).exec(db).await?;
    Ok(())
}
