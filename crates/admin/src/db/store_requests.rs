//! Store request review.
//!
//! Deciding a request locks its row, so two admins cannot approve and reject
//! the same request. Approval promotes the applicant to `seller` in the same
//! transaction; an applicant who is already an admin keeps that role.

use sqlx::{PgConnection, PgPool};

use cradlix_core::{StoreRequestId, StoreRequestStatus, UserId};

use super::RepositoryError;
use crate::models::{Decision, StoreRequest};

const STORE_REQUEST_SELECT: &str = "SELECT sr.id, sr.user_id, u.name AS applicant_name,
        u.email AS applicant_email, sr.store_name, sr.business_email, sr.phone, sr.gst_number,
        sr.pickup_address, sr.description, sr.status, sr.admin_note, sr.reviewed_by,
        sr.reviewed_at, sr.created_at
     FROM cradlix.store_request sr
     JOIN cradlix.user u ON u.id = sr.user_id";

pub struct StoreRequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRequestRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A page of requests, oldest pending first so the queue reads in order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        status: Option<StoreRequestStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<StoreRequest>, i64), RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cradlix.store_request
             WHERE $1::cradlix.store_request_status IS NULL OR status = $1",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, StoreRequest>(&format!(
            "{STORE_REQUEST_SELECT}
             WHERE $1::cradlix.store_request_status IS NULL OR sr.status = $1
             ORDER BY (sr.status = 'pending') DESC, sr.created_at, sr.id
             LIMIT $2 OFFSET $3"
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok((rows, total))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such request.
    pub async fn get(&self, id: StoreRequestId) -> Result<StoreRequest, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Approve or reject a pending request.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such request, or
    /// `RepositoryError::Conflict` if it has already been decided.
    pub async fn decide(
        &self,
        id: StoreRequestId,
        reviewer: UserId,
        decision: &Decision,
    ) -> Result<StoreRequest, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (applicant, status): (UserId, StoreRequestStatus) = sqlx::query_as(
            "SELECT user_id, status FROM cradlix.store_request WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if status.is_decided() {
            return Err(RepositoryError::Conflict(format!(
                "this store request has already been {status}"
            )));
        }

        sqlx::query(
            "UPDATE cradlix.store_request
             SET status = $2, admin_note = $3, reviewed_by = $4, reviewed_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(decision.status)
        .bind(&decision.note)
        .bind(reviewer)
        .execute(&mut *tx)
        .await?;

        if decision.status == StoreRequestStatus::Approved {
            sqlx::query(
                "UPDATE cradlix.user SET role = 'seller', updated_at = now()
                 WHERE id = $1 AND role = 'customer'",
            )
            .bind(applicant)
            .execute(&mut *tx)
            .await?;
        }

        let request = fetch(&mut tx, id).await?;
        tx.commit().await?;
        Ok(request)
    }
}

async fn fetch(conn: &mut PgConnection, id: StoreRequestId) -> Result<StoreRequest, RepositoryError> {
    sqlx::query_as::<_, StoreRequest>(&format!("{STORE_REQUEST_SELECT} WHERE sr.id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(RepositoryError::NotFound)
}
