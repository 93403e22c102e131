use sea_orm::{entity::prelude::*, sea_query::StringLen, DatabaseConnection, QueryFilter, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::user;

/// How a college reports grades.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum GradingScale {
    #[sea_orm(string_value = "four_point")]
    FourPoint,
    #[sea_orm(string_value = "ten_point")]
    TenPoint,
    #[sea_orm(string_value = "percentage")]
    Percentage,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "college")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub grading_scale: GradingScale,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::User => Entity::has_many(user::Entity).into() }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() { return Err(ModelError::Validation("name required".into())); }
    if name.len() > 128 { return Err(ModelError::Validation("name too long (<=128)".into())); }
    Ok(())
}

pub async fn find_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::Name.eq(name.to_string()))
        .one(db)
        .await
        .map_err(ModelError::from)
}

pub async fn create(db: &DatabaseConnection, name: &str, grading_scale: GradingScale) -> Result<Model, ModelError> {
    validate_name(name)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        grading_scale: Set(grading_scale),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(ModelError::from)
}

/// Look up a college by name, creating it when absent.
///
/// Two concurrent callers may both miss the lookup; the loser's insert hits
/// the unique index on `name` and re-reads the winner's row instead of
/// failing. Returns the row and whether this call created it.
pub async fn ensure(db: &DatabaseConnection, name: &str, grading_scale: GradingScale) -> Result<(Model, bool), ModelError> {
    if let Some(existing) = find_by_name(db, name).await? {
        return Ok((existing, false));
    }
    match create(db, name, grading_scale).await {
        Ok(created) => Ok((created, true)),
        Err(ModelError::Conflict(_)) => {
            let winner = find_by_name(db, name)
                .await?
                .ok_or_else(|| ModelError::Db(format!("college {name} vanished after unique conflict")))?;
            Ok((winner, false))
        }
        Err(e) => Err(e),
    }
}
