use sea_orm::{DatabaseConnection, SqlErr};
use uuid::Uuid;

use crate::{
    db::{content_repo, entities::rating, rating_repo},
    error::{AppError, AuthError},
};

pub struct RatingService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RatingService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Check order is fixed: missing photo, self-rating, duplicate. The
    /// pre-insert duplicate check gives the friendly error on the common
    /// path; the composite-key constraint closes the race between two
    /// concurrent first-time ratings, and its violation is translated to the
    /// same domain error rather than leaking a storage failure.
    pub async fn set_rate(
        &self,
        rater_id: &Uuid,
        photo_id: &Uuid,
        value: i32,
    ) -> Result<rating::Model, AppError> {
        let owner_id = content_repo::get_photo_owner(self.db, photo_id)
            .await?
            .ok_or(AuthError::NotFound("Photo"))?;

        if owner_id == *rater_id {
            return Err(AuthError::CannotRateOwn.into());
        }

        if rating_repo::find_one(self.db, photo_id, rater_id)
            .await?
            .is_some()
        {
            return Err(AuthError::AlreadySet.into());
        }

        match rating_repo::insert(self.db, photo_id, rater_id, value).await {
            Ok(model) => Ok(model),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AuthError::AlreadySet.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Deleting a missing rating reports not-found so callers can tell
    /// "nothing to delete" from "deleted". Role restriction is enforced at
    /// the route.
    pub async fn delete_rate(&self, photo_id: &Uuid, rater_id: &Uuid) -> Result<(), AppError> {
        if content_repo::get_photo_owner(self.db, photo_id).await?.is_none() {
            return Err(AuthError::NotFound("Photo").into());
        }
        if !rating_repo::delete(self.db, photo_id, rater_id).await? {
            return Err(AuthError::NotFound("Rating").into());
        }
        Ok(())
    }

    /// Mean of all rating values, rounded to 2 decimals; no ratings is an
    /// explicit `None`, never zero.
    pub async fn average(&self, photo_id: &Uuid) -> Result<Option<f64>, AppError> {
        if content_repo::get_photo_owner(self.db, photo_id).await?.is_none() {
            return Err(AuthError::NotFound("Photo").into());
        }
        let values = rating_repo::list_values(self.db, photo_id).await?;
        Ok(mean_rounded(&values))
    }
}

fn mean_rounded(values: &[i32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: i64 = values.iter().map(|v| i64::from(*v)).sum();
    let mean = sum as f64 / values.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::mean_rounded;

    #[test]
    fn average_rounds_to_two_decimals() {
        assert_eq!(mean_rounded(&[4, 5]), Some(4.5));
        assert_eq!(mean_rounded(&[1, 2, 2]), Some(1.67));
        assert_eq!(mean_rounded(&[3]), Some(3.0));
    }

    #[test]
    fn empty_set_is_none_not_zero() {
        assert_eq!(mean_rounded(&[]), None);
    }
}
