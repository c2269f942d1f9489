use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::db::entities::{prelude::Rating, rating};

pub async fn find_one(
    db: &DatabaseConnection,
    photo_id: &Uuid,
    rater_id: &Uuid,
) -> Result<Option<rating::Model>, DbErr> {
    Rating::find_by_id((*photo_id, *rater_id)).one(db).await
}

/// Insert relies on the (photo_id, rater_id) primary key; a concurrent
/// duplicate surfaces as a unique-constraint violation for the caller to
/// translate, never as a silent overwrite.
pub async fn insert(
    db: &DatabaseConnection,
    photo_id: &Uuid,
    rater_id: &Uuid,
    value: i32,
) -> Result<rating::Model, DbErr> {
    let model = rating::ActiveModel {
        photo_id: Set(*photo_id),
        rater_id: Set(*rater_id),
        value: Set(value),
        created_at: Set(Utc::now().fixed_offset()),
    };
    model.insert(db).await
}

pub async fn delete(
    db: &DatabaseConnection,
    photo_id: &Uuid,
    rater_id: &Uuid,
) -> Result<bool, DbErr> {
    let result = Rating::delete_by_id((*photo_id, *rater_id)).exec(db).await?;
    Ok(result.rows_affected > 0)
}

pub async fn list_values(db: &DatabaseConnection, photo_id: &Uuid) -> Result<Vec<i32>, DbErr> {
    let rows = Rating::find()
        .filter(rating::Column::PhotoId.eq(*photo_id))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|r| r.value).collect())
}
