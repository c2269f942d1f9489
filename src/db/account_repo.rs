use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use crate::db::entities::{account, prelude::Account};

pub async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<account::Model>, sea_orm::DbErr> {
    Account::find()
        .filter(account::Column::Email.eq(email))
        .one(db)
        .await
}

pub async fn find_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<account::Model>, sea_orm::DbErr> {
    Account::find()
        .filter(account::Column::Username.eq(username))
        .one(db)
        .await
}

pub async fn find_by_id(
    db: &DatabaseConnection,
    id: &Uuid,
) -> Result<Option<account::Model>, sea_orm::DbErr> {
    Account::find_by_id(*id).one(db).await
}

pub async fn count(db: &DatabaseConnection) -> Result<u64, sea_orm::DbErr> {
    Account::find().count(db).await
}

pub async fn create_account(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password_hash: &str,
    role: &str,
    confirmed: bool,
) -> Result<account::Model, sea_orm::DbErr> {
    let model = account::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash.to_string()),
        role: Set(role.to_string()),
        active: Set(true),
        confirmed: Set(confirmed),
        ..Default::default()
    };
    model.insert(db).await
}

pub async fn set_confirmed(db: &DatabaseConnection, id: &Uuid) -> Result<(), sea_orm::DbErr> {
    account::ActiveModel {
        id: Set(*id),
        confirmed: Set(true),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(())
}

/// Ban/unban; banned accounts stay in the table (`active = false`), they are
/// never hard-deleted.
pub async fn set_active(
    db: &DatabaseConnection,
    id: &Uuid,
    active: bool,
) -> Result<(), sea_orm::DbErr> {
    account::ActiveModel {
        id: Set(*id),
        active: Set(active),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(())
}

pub async fn set_role(
    db: &DatabaseConnection,
    id: &Uuid,
    role: &str,
) -> Result<(), sea_orm::DbErr> {
    account::ActiveModel {
        id: Set(*id),
        role: Set(role.to_string()),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(())
}
