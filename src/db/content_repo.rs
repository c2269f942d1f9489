use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::db::entities::{
    comment, photo,
    prelude::{Comment, Photo},
};

pub async fn create_photo(
    db: &DatabaseConnection,
    owner_id: &Uuid,
    description: &str,
    image_url: &str,
    tags: &[String],
) -> Result<photo::Model, DbErr> {
    let model = photo::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(*owner_id),
        description: Set(description.to_string()),
        image_url: Set(image_url.to_string()),
        tags: Set(photo::Tags(tags.to_vec())),
        ..Default::default()
    };
    model.insert(db).await
}

pub async fn get_photo(
    db: &DatabaseConnection,
    id: &Uuid,
) -> Result<Option<photo::Model>, DbErr> {
    Photo::find_by_id(*id).one(db).await
}

/// Ownership lookup used by the authorization and rating guards; kept here so
/// those guards stay independent of the rest of the photo subsystem.
pub async fn get_photo_owner(
    db: &DatabaseConnection,
    id: &Uuid,
) -> Result<Option<Uuid>, DbErr> {
    Ok(Photo::find_by_id(*id).one(db).await?.map(|p| p.owner_id))
}

pub async fn update_photo_description(
    db: &DatabaseConnection,
    id: &Uuid,
    description: &str,
) -> Result<photo::Model, DbErr> {
    photo::ActiveModel {
        id: Set(*id),
        description: Set(description.to_string()),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .update(db)
    .await
}

pub async fn delete_photo(db: &DatabaseConnection, id: &Uuid) -> Result<bool, DbErr> {
    let result = Photo::delete_by_id(*id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

pub async fn add_comment(
    db: &DatabaseConnection,
    photo_id: &Uuid,
    author_id: &Uuid,
    body: &str,
) -> Result<comment::Model, DbErr> {
    let model = comment::ActiveModel {
        id: Set(Uuid::new_v4()),
        photo_id: Set(*photo_id),
        author_id: Set(*author_id),
        body: Set(body.to_string()),
        ..Default::default()
    };
    model.insert(db).await
}

pub async fn get_comment(
    db: &DatabaseConnection,
    photo_id: &Uuid,
    comment_id: &Uuid,
) -> Result<Option<comment::Model>, DbErr> {
    Comment::find_by_id(*comment_id)
        .filter(comment::Column::PhotoId.eq(*photo_id))
        .one(db)
        .await
}

pub async fn list_comments(
    db: &DatabaseConnection,
    photo_id: &Uuid,
) -> Result<Vec<comment::Model>, DbErr> {
    Comment::find()
        .filter(comment::Column::PhotoId.eq(*photo_id))
        .order_by_asc(comment::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn update_comment(
    db: &DatabaseConnection,
    comment_id: &Uuid,
    body: &str,
) -> Result<comment::Model, DbErr> {
    comment::ActiveModel {
        id: Set(*comment_id),
        body: Set(body.to_string()),
        updated_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .update(db)
    .await
}

pub async fn delete_comment(db: &DatabaseConnection, comment_id: &Uuid) -> Result<bool, DbErr> {
    let result = Comment::delete_by_id(*comment_id).exec(db).await?;
    Ok(result.rows_affected > 0)
}
