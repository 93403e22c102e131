use crate::errors::ModelError;
use crate::{college, user, GradingScale};
use sea_orm::EntityTrait;
use anyhow::Result;
use uuid::Uuid;

/// Test college create / lookup / ensure
#[tokio::test]
async fn test_college_ensure_is_idempotent() -> Result<()> {
    let Some(db) = super::setup_test_db().await else { return Ok(()) };

    let name = format!("test_college_{}", Uuid::new_v4());
    let (first, created) = college::ensure(&db, &name, GradingScale::FourPoint).await?;
    assert!(created);
    assert_eq!(first.grading_scale, GradingScale::FourPoint);

    let (second, created_again) = college::ensure(&db, &name, GradingScale::TenPoint).await?;
    assert!(!created_again);
    assert_eq!(second.id, first.id);
    // existing row is reused unchanged
    assert_eq!(second.grading_scale, GradingScale::FourPoint);

    // a plain create with the same name hits the unique index
    let dup = college::create(&db, &name, GradingScale::Percentage).await;
    assert!(matches!(dup, Err(ModelError::Conflict(_))));

    college::Entity::delete_by_id(first.id).exec(&db).await?;
    Ok(())
}

/// Two first logins racing on an empty college table agree on one row
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_college_ensure_concurrent_agrees_on_winner() -> Result<()> {
    let Some(db) = super::setup_test_db().await else { return Ok(()) };

    let name = format!("test_college_race_{}", Uuid::new_v4());
    let (a, b) = tokio::join!(
        college::ensure(&db, &name, GradingScale::FourPoint),
        college::ensure(&db, &name, GradingScale::FourPoint),
    );
    let (a, a_created) = a?;
    let (b, b_created) = b?;
    assert_eq!(a.id, b.id);
    assert_eq!([a_created, b_created].iter().filter(|c| **c).count(), 1);

    let row = college::find_by_name(&db, &name).await?.expect("college row");
    assert_eq!(row.id, a.id);

    college::Entity::delete_by_id(a.id).exec(&db).await?;
    Ok(())
}

/// Test user create / lookup / password update
#[tokio::test]
async fn test_user_crud() -> Result<()> {
    let Some(db) = super::setup_test_db().await else { return Ok(()) };

    let c = college::create(&db, &format!("user_test_college_{}", Uuid::new_v4()), GradingScale::TenPoint).await?;
    let tag = Uuid::new_v4().simple().to_string();
    let username = format!("crud{}", &tag[..12]);
    let email = format!("Crud_{}@Example.com", tag);

    let u = user::create(&db, &username, &email, "$argon2id$placeholder", c.id).await?;
    assert_eq!(u.email, email.to_lowercase());
    assert_eq!(u.college_id, c.id);

    let by_email = user::find_by_email(&db, &email.to_uppercase()).await?.expect("found by email");
    assert_eq!(by_email.id, u.id);
    let by_name = user::find_by_username(&db, &username).await?.expect("found by username");
    assert_eq!(by_name.id, u.id);

    let updated = user::update_password_hash(&db, u.id, "$argon2id$other".into()).await?;
    assert_eq!(updated.password_hash, "$argon2id$other");
    assert!(updated.updated_at >= u.updated_at);

    let dup = user::create(&db, &username, &format!("other_{}@example.com", tag), "$argon2id$x", c.id).await;
    assert!(matches!(dup, Err(ModelError::Conflict(_))));

    user::hard_delete(&db, u.id).await?;
    assert!(user::find_by_username(&db, &username).await?.is_none());
    college::Entity::delete_by_id(c.id).exec(&db).await?;
    Ok(())
}

#[test]
fn user_validation() {
    assert!(user::validate_email("no-at-sign").is_err());
    assert!(user::validate_email("a@b.c").is_ok());
    assert!(user::validate_username("  ").is_err());
    assert!(user::validate_username(&"x".repeat(65)).is_err());
    assert!(college::validate_name("").is_err());
}
