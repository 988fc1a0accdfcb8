//! Store request repository (customer side).

use sqlx::PgPool;

use cradlix_core::UserId;

use super::RepositoryError;
use crate::models::{StoreRequest, StoreRequestInput};

const STORE_REQUEST_COLUMNS: &str = "id, store_name, business_email, phone, gst_number, \
                                     pickup_address, description, status, admin_note, \
                                     reviewed_at, created_at";

/// Repository for a customer's store requests.
pub struct StoreRequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRequestRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Submit a request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a pending request.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &StoreRequestInput,
    ) -> Result<StoreRequest, RepositoryError> {
        sqlx::query_as::<_, StoreRequest>(&format!(
            "INSERT INTO cradlix.store_request
                (user_id, store_name, business_email, phone, gst_number, pickup_address, description)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {STORE_REQUEST_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&input.store_name)
        .bind(&input.business_email)
        .bind(&input.phone)
        .bind(&input.gst_number)
        .bind(&input.pickup_address)
        .bind(&input.description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "you already have a store request under review"))
    }

    /// The user's requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<StoreRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRequest>(&format!(
            "SELECT {STORE_REQUEST_COLUMNS} FROM cradlix.store_request
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}
