use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use crate::db::entities::{
    prelude::{RefreshSession, RevokedToken},
    refresh_session, revoked_token,
};

pub async fn get_refresh(
    db: &DatabaseConnection,
    account_id: &Uuid,
) -> Result<Option<refresh_session::Model>, DbErr> {
    RefreshSession::find()
        .filter(refresh_session::Column::AccountId.eq(*account_id))
        .one(db)
        .await
}

/// Last-write-wins overwrite used by login: whatever refresh session the
/// account had before is replaced by the new token value.
pub async fn upsert_refresh(
    db: &DatabaseConnection,
    account_id: &Uuid,
    token: &str,
) -> Result<(), DbErr> {
    let now = Utc::now().fixed_offset();
    let model = refresh_session::ActiveModel {
        id: Set(Uuid::new_v4()),
        account_id: Set(*account_id),
        token: Set(Some(token.to_string())),
        created_at: Set(now),
        updated_at: Set(now),
    };
    RefreshSession::insert(model)
        .on_conflict(
            OnConflict::column(refresh_session::Column::AccountId)
                .update_columns([
                    refresh_session::Column::Token,
                    refresh_session::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;
    Ok(())
}

/// Compare-and-replace rotation step: the stored token is swapped for `new`
/// only where it still equals `expected`. Returns false when another refresh
/// already rotated it (or the session was cleared), in which case the caller
/// must treat the presented token as stale.
pub async fn replace_refresh(
    db: &DatabaseConnection,
    account_id: &Uuid,
    expected: &str,
    new: &str,
) -> Result<bool, DbErr> {
    let result = RefreshSession::update_many()
        .col_expr(refresh_session::Column::Token, Expr::value(new.to_string()))
        .col_expr(
            refresh_session::Column::UpdatedAt,
            Expr::value(Utc::now().fixed_offset()),
        )
        .filter(refresh_session::Column::AccountId.eq(*account_id))
        .filter(refresh_session::Column::Token.eq(expected))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Clears the stored refresh token (logout, or defensive revocation after a
/// stale-token presentation), forcing a full re-login.
pub async fn clear_refresh(db: &DatabaseConnection, account_id: &Uuid) -> Result<(), DbErr> {
    RefreshSession::update_many()
        .col_expr(
            refresh_session::Column::Token,
            Expr::value(Option::<String>::None),
        )
        .col_expr(
            refresh_session::Column::UpdatedAt,
            Expr::value(Utc::now().fixed_offset()),
        )
        .filter(refresh_session::Column::AccountId.eq(*account_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Appends a token to the revocation list. Idempotent: re-revoking an
/// already revoked token is not an error.
pub async fn insert_revoked(db: &DatabaseConnection, token: &str) -> Result<(), DbErr> {
    let model = revoked_token::ActiveModel {
        id: Set(Uuid::new_v4()),
        token: Set(token.to_string()),
        created_at: Set(Utc::now().fixed_offset()),
    };
    let insert = RevokedToken::insert(model)
        .on_conflict(
            OnConflict::column(revoked_token::Column::Token)
                .do_nothing()
                .to_owned(),
        )
        .exec(db)
        .await;
    match insert {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(err) => Err(err),
    }
}

pub async fn is_revoked(db: &DatabaseConnection, token: &str) -> Result<bool, DbErr> {
    let hit = RevokedToken::find()
        .filter(revoked_token::Column::Token.eq(token))
        .one(db)
        .await?;
    Ok(hit.is_some())
}
