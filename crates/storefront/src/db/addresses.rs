//! Address book repository.
//!
//! A user has at most [`MAX_ADDRESSES`] addresses and exactly one default
//! whenever they have any. Writes lock the owning user row so concurrent
//! requests cannot break either rule.

use sqlx::{PgConnection, PgPool};

use cradlix_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressInput};

/// Address book size limit.
pub const MAX_ADDRESSES: i64 = 10;

const ADDRESS_COLUMNS: &str = "id, user_id, full_name, phone, line1, line2, landmark, city, \
                               state, pincode, is_default, created_at, updated_at";

/// Repository for shipping addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, default first, then newest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM cradlix.address
             WHERE user_id = $1
             ORDER BY is_default DESC, created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Get one of the user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM cradlix.address WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Save a new address. The first address always becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when the address book is full.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, user_id).await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cradlix.address WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
        if count >= MAX_ADDRESSES {
            return Err(RepositoryError::Conflict(format!(
                "you can save at most {MAX_ADDRESSES} addresses"
            )));
        }

        let make_default = input.is_default || count == 0;
        if make_default {
            clear_default(&mut tx, user_id).await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            "INSERT INTO cradlix.address
                (user_id, full_name, phone, line1, line2, landmark, city, state, pincode, is_default)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&input.full_name)
        .bind(&input.phone)
        .bind(&input.line1)
        .bind(&input.line2)
        .bind(&input.landmark)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.pincode)
        .bind(make_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(address)
    }

    /// Replace an address's fields.
    ///
    /// `is_default: true` moves the default here; `false` leaves the current
    /// default untouched, since a user with addresses always has one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the user's.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, user_id).await?;

        if input.is_default {
            clear_default_except(&mut tx, user_id, id).await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            "UPDATE cradlix.address
             SET full_name = $3, phone = $4, line1 = $5, line2 = $6, landmark = $7,
                 city = $8, state = $9, pincode = $10,
                 is_default = is_default OR $11,
                 updated_at = now()
             WHERE id = $1 AND user_id = $2
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.full_name)
        .bind(&input.phone)
        .bind(&input.line1)
        .bind(&input.line2)
        .bind(&input.landmark)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.pincode)
        .bind(input.is_default)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(address)
    }

    /// Delete an address. Deleting the default promotes the newest remaining one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the user's.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, user_id).await?;

        let was_default: bool = sqlx::query_scalar(
            "DELETE FROM cradlix.address WHERE id = $1 AND user_id = $2 RETURNING is_default",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if was_default {
            sqlx::query(
                "UPDATE cradlix.address SET is_default = TRUE, updated_at = now()
                 WHERE id = (
                     SELECT id FROM cradlix.address
                     WHERE user_id = $1
                     ORDER BY created_at DESC, id DESC
                     LIMIT 1
                 )",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Make an address the user's default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not the user's.
    pub async fn set_default(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, user_id).await?;

        clear_default_except(&mut tx, user_id, id).await?;
        let address = sqlx::query_as::<_, Address>(&format!(
            "UPDATE cradlix.address SET is_default = TRUE, updated_at = now()
             WHERE id = $1 AND user_id = $2
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(address)
    }
}

async fn lock_owner(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
    sqlx::query("SELECT id FROM cradlix.user WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    Ok(())
}

async fn clear_default(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE cradlix.address SET is_default = FALSE, updated_at = now()
         WHERE user_id = $1 AND is_default",
    )
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Clear the default flag only if `keep` really is one of the user's addresses,
/// so a bad id cannot leave the user without a default.
async fn clear_default_except(
    conn: &mut PgConnection,
    user_id: UserId,
    keep: AddressId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE cradlix.address SET is_default = FALSE, updated_at = now()
         WHERE user_id = $1 AND is_default AND id <> $2
           AND EXISTS (SELECT 1 FROM cradlix.address WHERE id = $2 AND user_id = $1)",
    )
    .bind(user_id)
    .bind(keep)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cradlix_core::{PhoneNumber, Pincode};

    use super::*;
    use crate::db::fixtures;

    fn input(line1: &str) -> AddressInput {
        AddressInput {
            full_name: "Test Parent".to_string(),
            phone: PhoneNumber::parse("9876543210").unwrap(),
            line1: line1.to_string(),
            line2: None,
            landmark: None,
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: Pincode::parse("560001").unwrap(),
            is_default: false,
        }
    }

    #[sqlx::test]
    #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
    async fn test_address_book_limit_and_default_promotion(pool: PgPool) {
        let user = fixtures::customer(&pool, "book@cradlix.test").await;
        let repo = AddressRepository::new(&pool);

        let first = repo.create(user.id, &input("1 Residency Road")).await.unwrap();
        assert!(first.is_default);

        let mut newest = first.id;
        for n in 2..=MAX_ADDRESSES {
            let address = repo
                .create(user.id, &input(&format!("{n} Residency Road")))
                .await
                .unwrap();
            assert!(!address.is_default);
            newest = address.id;
        }

        let err = repo.create(user.id, &input("11 Residency Road")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        repo.delete(user.id, first.id).await.unwrap();
        let addresses = repo.list(user.id).await.unwrap();
        assert_eq!(addresses.len(), 9);
        let defaults: Vec<AddressId> = addresses
            .iter()
            .filter(|a| a.is_default)
            .map(|a| a.id)
            .collect();
        assert_eq!(defaults, vec![newest]);
    }
}
