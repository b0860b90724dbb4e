//! Product catalogue reads/writes outside the invoice-preview resolution
//! path: direct creation, listing, and the `CHECK_STOCK` lookup.

use crate::error::{LedgerError, Result};
use crate::rows::ProductRow;
use crate::store::LedgerStore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use voice_agent_core::ids::ShopId;
use voice_agent_core::money::Money;
use voice_agent_core::product::Product;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductStockMatch {
    pub product: Product,
    pub score: f64,
}

const PRODUCT_COLUMNS: &str = "id, name, unit, price, stock, hsn_code, gst_rate, cess_rate, is_gst_exempt, is_active, auto_created";

impl LedgerStore {
    pub async fn create_product(
        &self,
        shop_id: &ShopId,
        name: &str,
        unit: &str,
        price: Money,
        stock: i64,
        hsn_code: Option<&str>,
        gst_rate: Decimal,
    ) -> Result<Product> {
        let mut product = Product::new(name, unit)?;
        product.price = price;
        product.stock = stock;
        product.hsn_code = hsn_code.map(String::from);
        product.gst_rate = gst_rate;

        sqlx::query(
            r#"
            INSERT INTO products (id, shop_id, name, unit, price, stock, hsn_code, gst_rate, cess_rate, is_gst_exempt, is_active, auto_created)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, FALSE, TRUE, FALSE)
            "#,
        )
        .bind(product.id.0)
        .bind(&shop_id.0)
        .bind(&product.name)
        .bind(&product.unit)
        .bind(product.price.inner())
        .bind(product.stock)
        .bind(&product.hsn_code)
        .bind(product.gst_rate)
        .execute(self.pool.raw())
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => LedgerError::Conflict,
            _ => LedgerError::Storage(e),
        })?;

        Ok(product)
    }

    pub async fn list_products(&self, shop_id: &ShopId) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE shop_id = $1 AND is_active ORDER BY name"
        ))
        .bind(&shop_id.0)
        .fetch_all(self.pool.raw())
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn list_low_stock(&self, shop_id: &ShopId, threshold: i64) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE shop_id = $1 AND is_active AND stock <= $2 ORDER BY stock"
        ))
        .bind(&shop_id.0)
        .bind(threshold)
        .fetch_all(self.pool.raw())
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// `CHECK_STOCK` — finds the product the shopkeeper named, using the
    /// same contains/fuzzy cascade as invoice-item resolution but read-only
    /// (a miss never auto-creates a placeholder here).
    pub async fn find_product_for_stock_check(&self, shop_id: &ShopId, spoken_name: &str) -> Result<ProductStockMatch> {
        let lower = spoken_name.trim().to_lowercase();
        let exact: Option<ProductRow> = sqlx::query_as(&format!(
            r#"SELECT {PRODUCT_COLUMNS} FROM products
               WHERE shop_id = $1 AND is_active AND (lower(name) LIKE '%' || $2 || '%' OR $2 LIKE '%' || lower(name) || '%')
               ORDER BY length(name) ASC LIMIT 1"#
        ))
        .bind(&shop_id.0)
        .bind(&lower)
        .fetch_optional(self.pool.raw())
        .await?;

        if let Some(row) = exact {
            return Ok(ProductStockMatch { product: row.into(), score: 1.0 });
        }

        let all: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE shop_id = $1 AND is_active"
        ))
        .bind(&shop_id.0)
        .fetch_all(self.pool.raw())
        .await?;

        let mut best: Option<(f64, Product)> = None;
        for row in all {
            let product: Product = row.into();
            if let Some(m) = self.fuzzy.match_name(&lower, &product.name.to_lowercase(), 0.5) {
                if best.as_ref().map(|(s, _)| m.score > *s).unwrap_or(true) {
                    best = Some((m.score, product));
                }
            }
        }

        best.map(|(score, product)| ProductStockMatch { product, score })
            .ok_or(LedgerError::ProductNotFound)
    }
}
