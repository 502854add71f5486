//! # Catalog Repository
//!
//! The slice of the catalog that commerce state depends on: products with
//! their current price and thumbnail, and the sizes that carry stock.
//! Listing and search live in the catalog service, not here.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::stock::StockLedger;
use storefront_core::validation::{
    validate_price, validate_product_name, validate_size_name, validate_stock_quantity,
};
use storefront_core::{Product, StockLine};

/// Repository for catalog database operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Inserts a new product with no stock.
    pub async fn insert_product(&self, name: &str, price: i64, image_url: &str) -> DbResult<Product> {
        validate_product_name(name)?;
        validate_price(price)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            price,
            total_quantity: 0,
            image_url: image_url.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, total_quantity, image_url, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.total_quantity)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Adds a size with its initial stock.
    ///
    /// The stock line and the product's `total_quantity` are written in one
    /// transaction.
    pub async fn add_size(
        &self,
        product_id: &str,
        size_name: &str,
        quantity: i64,
    ) -> DbResult<StockLine> {
        validate_size_name(size_name)?;
        validate_stock_quantity(quantity)?;

        let line = StockLine {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            size_name: size_name.trim().to_string(),
            quantity,
        };

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;
        StockLedger::open_line(&mut tx, &line).await?;
        tx.commit().await.map_err(DbError::transaction)?;

        info!(product_id = %product_id, size = %line.size_name, quantity, "Stock line opened");
        Ok(line)
    }

    /// Updates a product's display fields and price.
    ///
    /// Past orders are unaffected; their lines hold snapshots.
    pub async fn update_product(
        &self,
        product_id: &str,
        name: &str,
        price: i64,
        image_url: &str,
    ) -> DbResult<()> {
        validate_product_name(name)?;
        validate_price(price)?;

        debug!(id = %product_id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?2,
                price = ?3,
                image_url = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .bind(name.trim())
        .bind(price)
        .bind(image_url.trim())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Gets a product by its ID.
    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, total_quantity, image_url, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Counts products in the catalog.
    pub async fn count_products(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Lists a product's sizes in creation order.
    pub async fn list_sizes(&self, product_id: &str) -> DbResult<Vec<StockLine>> {
        let sizes = sqlx::query_as::<_, StockLine>(
            r#"
            SELECT id, product_id, size_name, quantity
            FROM product_sizes
            WHERE product_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sizes)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::DbError;

    #[tokio::test]
    async fn test_add_sizes_maintains_total() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let product = catalog.insert_product("Wool Coat", 900, "coat.jpg").await.unwrap();
        assert_eq!(product.total_quantity, 0);
        assert_eq!(catalog.count_products().await.unwrap(), 1);

        catalog.add_size(&product.id, "S", 2).await.unwrap();
        catalog.add_size(&product.id, "M", 4).await.unwrap();

        let stored = catalog.get_product(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.total_quantity, 6);

        let sizes = catalog.list_sizes(&product.id).await.unwrap();
        let names: Vec<_> = sizes.iter().map(|s| s.size_name.as_str()).collect();
        assert_eq!(names, ["S", "M"]);
    }

    #[tokio::test]
    async fn test_add_size_to_unknown_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db.catalog().add_size("missing", "M", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_size_name_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();
        let product = catalog.insert_product("Wool Coat", 900, "coat.jpg").await.unwrap();

        catalog.add_size(&product.id, "M", 1).await.unwrap();
        let err = catalog.add_size(&product.id, "M", 1).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // The failed insert rolled back its total adjustment
        let stored = catalog.get_product(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.total_quantity, 1);
    }

    #[tokio::test]
    async fn test_update_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();
        let product = catalog.insert_product("Wool Coat", 900, "coat.jpg").await.unwrap();

        catalog
            .update_product(&product.id, "Wool Coat II", 1200, "coat2.jpg")
            .await
            .unwrap();

        let stored = catalog.get_product(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Wool Coat II");
        assert_eq!(stored.price, 1200);
        assert!(catalog.update_product("missing", "x", 1, "").await.is_err());
    }
}
