//! # Address Repository
//!
//! Saved delivery addresses, with exactly one default per user who has any.
//!
//! ## Default Address Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add()          is_default = NOT EXISTS (user's addresses)   one INSERT │
//! │                                                                         │
//! │  set_default()  BEGIN                                                   │
//! │                   UPDATE ... SET is_default = 0 WHERE is_default = 1    │
//! │                   UPDATE ... SET is_default = 1 WHERE id = :target      │
//! │                 COMMIT   (target missing → ROLLBACK, old default kept)  │
//! │                                                                         │
//! │  delete()       DELETE ... WHERE id = :id AND is_default = 0            │
//! │                 (the default is refused: CannotDeleteDefault)           │
//! │                                                                         │
//! │  update()       text fields only; never the flag                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The partial unique index `ux_addresses_one_default` backs "at most one";
//! the rules above give "at least one".

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use storefront_core::validation::{validate_address_input, validate_user_id};
use storefront_core::{Address, AddressInput, CoreError};

const ADDRESS_COLUMNS: &str =
    "id, user_id, city, district, ward, street, house_number, is_default, created_at, updated_at";

/// Repository for address database operations.
#[derive(Debug, Clone)]
pub struct AddressRepository {
    pool: SqlitePool,
}

impl AddressRepository {
    /// Creates a new AddressRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AddressRepository { pool }
    }

    /// Adds an address. The user's first address becomes the default.
    pub async fn add(&self, user_id: &str, input: &AddressInput) -> DbResult<Address> {
        validate_user_id(user_id)?;
        validate_address_input(input)?;

        let id = Uuid::new_v4().to_string();
        debug!(id = %id, user_id = %user_id, "Adding address");

        // Existence check and insert are one statement
        let address = sqlx::query_as::<_, Address>(&format!(
            r#"
            INSERT INTO addresses (
                id, user_id, city, district, ward, street, house_number,
                is_default, created_at, updated_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                   NOT EXISTS (SELECT 1 FROM addresses WHERE user_id = ?2),
                   ?8, ?8
            RETURNING {ADDRESS_COLUMNS}
            "#
        ))
        .bind(&id)
        .bind(user_id)
        .bind(input.city.trim())
        .bind(input.district.trim())
        .bind(input.ward.trim())
        .bind(input.street.trim())
        .bind(input.house_number.trim())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(address)
    }

    /// Lists the user's addresses, default first, then oldest first.
    pub async fn list(&self, user_id: &str) -> DbResult<Vec<Address>> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            r#"
            SELECT {ADDRESS_COLUMNS}
            FROM addresses
            WHERE user_id = ?1
            ORDER BY is_default DESC, created_at, rowid
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(addresses)
    }

    /// Gets one of the user's addresses.
    pub async fn get(&self, user_id: &str, address_id: &str) -> DbResult<Option<Address>> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = ?1 AND user_id = ?2"
        ))
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(address)
    }

    /// Gets the user's default address, if the user has any address.
    pub async fn get_default(&self, user_id: &str) -> DbResult<Option<Address>> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = ?1 AND is_default = 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(address)
    }

    /// Rewrites an address's text fields. The default flag is untouched.
    pub async fn update(
        &self,
        user_id: &str,
        address_id: &str,
        input: &AddressInput,
    ) -> DbResult<Address> {
        validate_address_input(input)?;

        debug!(id = %address_id, user_id = %user_id, "Updating address");

        let address = sqlx::query_as::<_, Address>(&format!(
            r#"
            UPDATE addresses
            SET city = ?3,
                district = ?4,
                ward = ?5,
                street = ?6,
                house_number = ?7,
                updated_at = ?8
            WHERE id = ?1 AND user_id = ?2
            RETURNING {ADDRESS_COLUMNS}
            "#
        ))
        .bind(address_id)
        .bind(user_id)
        .bind(input.city.trim())
        .bind(input.district.trim())
        .bind(input.ward.trim())
        .bind(input.street.trim())
        .bind(input.house_number.trim())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        address.ok_or_else(|| DbError::not_found("Address", address_id))
    }

    /// Makes `address_id` the user's default address.
    ///
    /// ## Atomicity
    /// Unsetting the old default and setting the new one commit together.
    /// An unknown address rolls back, leaving the old default in place.
    pub async fn set_default(&self, user_id: &str, address_id: &str) -> DbResult<Address> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        sqlx::query(
            r#"
            UPDATE addresses
            SET is_default = 0,
                updated_at = ?2
            WHERE user_id = ?1 AND is_default = 1
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let address = sqlx::query_as::<_, Address>(&format!(
            r#"
            UPDATE addresses
            SET is_default = 1,
                updated_at = ?3
            WHERE id = ?1 AND user_id = ?2
            RETURNING {ADDRESS_COLUMNS}
            "#
        ))
        .bind(address_id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(address) = address else {
            warn!(id = %address_id, user_id = %user_id, "Default swap aborted: unknown address");
            tx.rollback().await.map_err(DbError::transaction)?;
            return Err(DbError::not_found("Address", address_id));
        };

        tx.commit().await.map_err(DbError::transaction)?;

        info!(id = %address_id, user_id = %user_id, "Default address changed");
        Ok(address)
    }

    /// Deletes a non-default address.
    ///
    /// ## Errors
    /// * `CoreError::CannotDeleteDefault` - the address is the user's default
    /// * `DbError::NotFound` - not one of the user's addresses
    pub async fn delete(&self, user_id: &str, address_id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM addresses WHERE id = ?1 AND user_id = ?2 AND is_default = 0",
        )
        .bind(address_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            debug!(id = %address_id, user_id = %user_id, "Address deleted");
            return Ok(());
        }

        match self.get(user_id, address_id).await? {
            Some(_) => Err(CoreError::CannotDeleteDefault {
                address_id: address_id.to_string(),
            }
            .into()),
            None => Err(DbError::not_found("Address", address_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use storefront_core::ErrorKind;

    fn input(street: &str) -> AddressInput {
        AddressInput {
            city: "Hanoi".to_string(),
            district: "Ba Dinh".to_string(),
            ward: "Kim Ma".to_string(),
            street: street.to_string(),
            house_number: "12".to_string(),
        }
    }

    async fn setup() -> AddressRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().addresses()
    }

    #[tokio::test]
    async fn test_first_address_is_default() {
        let addresses = setup().await;

        let first = addresses.add("u1", &input("Lieu Giai")).await.unwrap();
        let second = addresses.add("u1", &input("Doi Can")).await.unwrap();
        let other_user = addresses.add("u2", &input("Hang Bai")).await.unwrap();

        assert!(first.is_default);
        assert!(!second.is_default);
        assert!(other_user.is_default);
    }

    #[tokio::test]
    async fn test_set_default_swaps_atomically() {
        let addresses = setup().await;
        let first = addresses.add("u1", &input("Lieu Giai")).await.unwrap();
        let second = addresses.add("u1", &input("Doi Can")).await.unwrap();

        let updated = addresses.set_default("u1", &second.id).await.unwrap();
        assert!(updated.is_default);

        let list = addresses.list("u1").await.unwrap();
        assert_eq!(list[0].id, second.id);
        assert_eq!(list.iter().filter(|a| a.is_default).count(), 1);
        assert!(!addresses.get("u1", &first.id).await.unwrap().unwrap().is_default);
    }

    #[tokio::test]
    async fn test_set_default_unknown_keeps_old_default() {
        let addresses = setup().await;
        let first = addresses.add("u1", &input("Lieu Giai")).await.unwrap();
        let foreign = addresses.add("u2", &input("Hang Bai")).await.unwrap();

        assert!(matches!(
            addresses.set_default("u1", "missing").await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            addresses.set_default("u1", &foreign.id).await,
            Err(DbError::NotFound { .. })
        ));

        let default = addresses.get_default("u1").await.unwrap().unwrap();
        assert_eq!(default.id, first.id);
    }

    #[tokio::test]
    async fn test_set_default_is_idempotent() {
        let addresses = setup().await;
        let first = addresses.add("u1", &input("Lieu Giai")).await.unwrap();

        addresses.set_default("u1", &first.id).await.unwrap();

        assert_eq!(addresses.get_default("u1").await.unwrap().unwrap().id, first.id);
    }

    #[tokio::test]
    async fn test_delete_refuses_default() {
        let addresses = setup().await;
        let first = addresses.add("u1", &input("Lieu Giai")).await.unwrap();
        let second = addresses.add("u1", &input("Doi Can")).await.unwrap();

        let err = addresses.delete("u1", &first.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::CannotDeleteDefault { .. })
        ));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        addresses.delete("u1", &second.id).await.unwrap();
        assert_eq!(addresses.list("u1").await.unwrap().len(), 1);

        assert!(matches!(
            addresses.delete("u1", &second.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_default_flag() {
        let addresses = setup().await;
        let first = addresses.add("u1", &input("Lieu Giai")).await.unwrap();

        let updated = addresses.update("u1", &first.id, &input("Nguyen Thai Hoc")).await.unwrap();

        assert_eq!(updated.street, "Nguyen Thai Hoc");
        assert!(updated.is_default);
        assert!(matches!(
            addresses.update("u2", &first.id, &input("x")).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_rejects_blank_fields() {
        let addresses = setup().await;

        let err = addresses.add("u1", &input("  ")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(addresses.get_default("u1").await.unwrap().is_none());
    }
}
