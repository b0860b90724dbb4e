//! Invoice preview/confirm/cancel and the atomic per-financial-year counter.

use crate::error::{LedgerError, Result};
use crate::gst::{calculate_line_item, InvoiceTotals, LineItemInput};
use crate::rows::{invoice_status_str, InvoiceItemRow, InvoiceRow, ProductRow};
use crate::store::LedgerStore;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Postgres;
use voice_agent_core::ids::{CustomerId, InvoiceId, ProductId, ShopId};
use voice_agent_core::invoice::{Invoice, InvoiceItem, InvoiceStatus, SupplyType};
use voice_agent_core::ledger_entry::LedgerEntryType;
use voice_agent_core::money::Money;
use voice_agent_core::product::{Product, PLACEHOLDER_STOCK};

/// One spoken line item before product resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRequest {
    pub product_name: String,
    pub quantity: Decimal,
}

/// A line item after resolving `product_name` to a catalogue row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit: String,
    pub hsn_code: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub gst_rate: Decimal,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub cess: Money,
    pub subtotal: Money,
    pub total: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicePreview {
    pub resolved_items: Vec<ResolvedItem>,
    pub subtotal: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub cess: Money,
    pub grand_total: Money,
    pub with_gst: bool,
    pub auto_created_products: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub invoice_count: i64,
    pub total_sales: Money,
    pub cash_collected: Money,
    pub upi_collected: Money,
    pub pending_amount: Money,
}

impl LedgerStore {
    /// `previewInvoice` — resolves every item, computes GST, but persists
    /// nothing beyond auto-created placeholder products. Stock is untouched.
    pub async fn preview_invoice(
        &self,
        shop_id: &ShopId,
        customer_id: CustomerId,
        items: &[ItemRequest],
        with_gst: bool,
        supply_type: SupplyType,
    ) -> Result<InvoicePreview> {
        self.get_customer(customer_id).await?;

        let mut tx = self.pool.raw().begin().await?;
        let mut resolved_items = Vec::with_capacity(items.len());
        let mut auto_created = Vec::new();
        let mut totals = InvoiceTotals::default();

        for item in items {
            let (product, was_created) = resolve_or_create_product(&mut tx, shop_id, &item.product_name).await?;
            if was_created {
                auto_created.push(product.name.clone());
            }

            let tax = calculate_line_item(
                &LineItemInput {
                    product_name: product.name.clone(),
                    hsn_code: product.hsn_code.clone(),
                    quantity: item.quantity,
                    unit_price: product.price,
                    gst_rate: product.gst_rate,
                    cess_rate: product.cess_rate,
                    is_gst_exempt: product.is_gst_exempt || !with_gst,
                },
                supply_type,
            );
            totals = totals.add_line(&tax);

            resolved_items.push(ResolvedItem {
                product_id: product.id,
                product_name: product.name,
                unit: product.unit,
                hsn_code: product.hsn_code,
                quantity: item.quantity,
                unit_price: product.price,
                gst_rate: product.gst_rate,
                cgst: tax.cgst,
                sgst: tax.sgst,
                igst: tax.igst,
                cess: tax.cess,
                subtotal: tax.subtotal,
                total: tax.total,
            });
        }

        tx.commit().await?;

        Ok(InvoicePreview {
            resolved_items,
            subtotal: totals.subtotal,
            cgst: totals.cgst,
            sgst: totals.sgst,
            igst: totals.igst,
            cess: totals.cess,
            grand_total: totals.grand_total,
            with_gst,
            auto_created_products: auto_created,
        })
    }

    /// `confirmInvoice` — commits `resolvedItems` as a real invoice:
    /// assigns the invoice number, decrements stock, credits the shop's
    /// running receivable against the customer. All-or-nothing.
    pub async fn confirm_invoice(
        &self,
        shop_id: &ShopId,
        customer_id: CustomerId,
        resolved_items: &[ResolvedItem],
        notes: Option<&str>,
    ) -> Result<Invoice> {
        let mut tx = self.pool.raw().begin().await?;

        for item in resolved_items {
            let stock: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1 FOR UPDATE")
                .bind(item.product_id.0)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(LedgerError::ProductNotFound)?;

            let requested: i64 = item.quantity.round().to_string().parse().unwrap_or(i64::MAX);
            if stock < requested {
                return Err(LedgerError::InsufficientStock {
                    product_name: item.product_name.clone(),
                    requested,
                    available: stock,
                });
            }
        }

        let invoice_no = generate_invoice_no(&mut tx, shop_id, Utc::now()).await?;

        let subtotal: Money = resolved_items.iter().fold(Money::ZERO, |acc, i| acc + i.subtotal);
        let cgst: Money = resolved_items.iter().fold(Money::ZERO, |acc, i| acc + i.cgst);
        let sgst: Money = resolved_items.iter().fold(Money::ZERO, |acc, i| acc + i.sgst);
        let igst: Money = resolved_items.iter().fold(Money::ZERO, |acc, i| acc + i.igst);
        let cess: Money = resolved_items.iter().fold(Money::ZERO, |acc, i| acc + i.cess);
        let grand_total = subtotal + cgst + sgst + igst + cess;

        let invoice_id = InvoiceId::new();
        let row: InvoiceRow = sqlx::query_as(
            r#"
            INSERT INTO invoices (id, shop_id, invoice_no, customer_id, date, subtotal, cgst, sgst, igst, cess, total, status, notes)
            VALUES ($1, $2, $3, $4, now(), $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, invoice_no, customer_id, date, subtotal, cgst, sgst, igst, cess, total, status, notes, pdf_object_key, pdf_url
            "#,
        )
        .bind(invoice_id.0)
        .bind(&shop_id.0)
        .bind(&invoice_no)
        .bind(customer_id.0)
        .bind(subtotal.inner())
        .bind(cgst.inner())
        .bind(sgst.inner())
        .bind(igst.inner())
        .bind(cess.inner())
        .bind(grand_total.inner())
        .bind(invoice_status_str(InvoiceStatus::Pending))
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        for (line_no, item) in resolved_items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_items
                    (invoice_id, line_no, product_id, product_name, unit, hsn_code, quantity, unit_price,
                     gst_rate, cgst, sgst, igst, cess, subtotal, total)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                "#,
            )
            .bind(invoice_id.0)
            .bind(line_no as i32)
            .bind(item.product_id.0)
            .bind(&item.product_name)
            .bind(&item.unit)
            .bind(&item.hsn_code)
            .bind(item.quantity)
            .bind(item.unit_price.inner())
            .bind(item.gst_rate)
            .bind(item.cgst.inner())
            .bind(item.sgst.inner())
            .bind(item.igst.inner())
            .bind(item.cess.inner())
            .bind(item.subtotal.inner())
            .bind(item.total.inner())
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1")
                .bind(item.product_id.0)
                .bind(item.quantity.round().to_string().parse::<i64>().unwrap_or(0))
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            UPDATE customers SET
                balance = balance + $2,
                total_purchases = total_purchases + $2,
                visit_count = visit_count + 1,
                last_visit = now()
            WHERE id = $1
            "#,
        )
        .bind(customer_id.0)
        .bind(grand_total.inner())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (customer_id, entry_type, amount, description, reference, created_at)
            VALUES ($1, 'debit', $2, $3, $4, now())
            "#,
        )
        .bind(customer_id.0)
        .bind(grand_total.inner())
        .bind(format!("Invoice {invoice_no}"))
        .bind(invoice_id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.balance_cache.invalidate(customer_id);
        tracing::info!(invoice_no = %invoice_no, customer_id = %customer_id, total = %grand_total, "invoice_operations operation=create status=success");

        Ok(row.into())
    }

    /// `cancelInvoice` — the transactional reverse of confirmation: restock,
    /// credit the customer back, append a reversal ledger entry.
    pub async fn cancel_invoice(&self, invoice_id: InvoiceId) -> Result<Invoice> {
        let mut tx = self.pool.raw().begin().await?;

        let invoice_row: Option<InvoiceRow> = sqlx::query_as(
            r#"
            SELECT id, invoice_no, customer_id, date, subtotal, cgst, sgst, igst, cess, total, status, notes, pdf_object_key, pdf_url
            FROM invoices WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(invoice_id.0)
        .fetch_optional(&mut *tx)
        .await?;
        let invoice_row = invoice_row.ok_or(LedgerError::InvoiceNotFound)?;
        if invoice_row.status == "cancelled" {
            return Err(LedgerError::AlreadyCancelled);
        }

        let items: Vec<InvoiceItemRow> = sqlx::query_as(
            r#"
            SELECT invoice_id, product_id, product_name, unit, hsn_code, quantity, unit_price,
                   gst_rate, cgst, sgst, igst, cess, subtotal, total
            FROM invoice_items WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id.0)
        .fetch_all(&mut *tx)
        .await?;

        for item in &items {
            if let Some(product_id) = item.product_id {
                let qty: i64 = item.quantity.round().to_string().parse().unwrap_or(0);
                sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1")
                    .bind(product_id)
                    .bind(qty)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let customer_id = CustomerId::from_uuid(invoice_row.customer_id);
        let total = Money::from_decimal(invoice_row.total);

        sqlx::query("UPDATE customers SET balance = balance - $2 WHERE id = $1")
            .bind(customer_id.0)
            .bind(total.inner())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (customer_id, entry_type, amount, description, reference, created_at)
            VALUES ($1, 'credit', $2, $3, $4, now())
            "#,
        )
        .bind(customer_id.0)
        .bind(total.inner())
        .bind(format!("Cancellation of invoice {}", invoice_row.invoice_no.clone().unwrap_or_default()))
        .bind(invoice_id.to_string())
        .execute(&mut *tx)
        .await?;

        let updated: InvoiceRow = sqlx::query_as(
            r#"
            UPDATE invoices SET status = 'cancelled' WHERE id = $1
            RETURNING id, invoice_no, customer_id, date, subtotal, cgst, sgst, igst, cess, total, status, notes, pdf_object_key, pdf_url
            "#,
        )
        .bind(invoice_id.0)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        self.balance_cache.invalidate(customer_id);
        Ok(updated.into())
    }

    pub async fn get_last_invoice(&self, customer_id: CustomerId) -> Result<Option<Invoice>> {
        let row: Option<InvoiceRow> = sqlx::query_as(
            r#"
            SELECT id, invoice_no, customer_id, date, subtotal, cgst, sgst, igst, cess, total, status, notes, pdf_object_key, pdf_url
            FROM invoices WHERE customer_id = $1 AND status != 'cancelled' ORDER BY date DESC LIMIT 1
            "#,
        )
        .bind(customer_id.0)
        .fetch_optional(self.pool.raw())
        .await?;
        Ok(row.map(Invoice::from))
    }

    pub async fn get_recent_invoices(&self, shop_id: &ShopId, limit: i64) -> Result<Vec<Invoice>> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(
            r#"
            SELECT id, invoice_no, customer_id, date, subtotal, cgst, sgst, igst, cess, total, status, notes, pdf_object_key, pdf_url
            FROM invoices WHERE shop_id = $1 ORDER BY date DESC LIMIT $2
            "#,
        )
        .bind(&shop_id.0)
        .bind(limit)
        .fetch_all(self.pool.raw())
        .await?;
        Ok(rows.into_iter().map(Invoice::from).collect())
    }

    pub async fn get_customer_invoices(&self, customer_id: CustomerId) -> Result<Vec<Invoice>> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(
            r#"
            SELECT id, invoice_no, customer_id, date, subtotal, cgst, sgst, igst, cess, total, status, notes, pdf_object_key, pdf_url
            FROM invoices WHERE customer_id = $1 ORDER BY date DESC
            "#,
        )
        .bind(customer_id.0)
        .fetch_all(self.pool.raw())
        .await?;
        Ok(rows.into_iter().map(Invoice::from).collect())
    }

    pub async fn get_invoice_items(&self, invoice_id: InvoiceId) -> Result<Vec<InvoiceItem>> {
        let rows: Vec<InvoiceItemRow> = sqlx::query_as(
            r#"
            SELECT invoice_id, product_id, product_name, unit, hsn_code, quantity, unit_price,
                   gst_rate, cgst, sgst, igst, cess, subtotal, total
            FROM invoice_items WHERE invoice_id = $1 ORDER BY line_no
            "#,
        )
        .bind(invoice_id.0)
        .fetch_all(self.pool.raw())
        .await?;
        Ok(rows.into_iter().map(InvoiceItem::from).collect())
    }

    /// `getDailySummary` — today's invoices, payments split by method, and
    /// the shop's still-outstanding total.
    pub async fn get_daily_summary(&self, shop_id: &ShopId, date: NaiveDate) -> Result<DailySummary> {
        let (invoice_count, total_sales): (i64, Decimal) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total), 0) FROM invoices
            WHERE shop_id = $1 AND date::date = $2 AND status != 'cancelled'
            "#,
        )
        .bind(&shop_id.0)
        .bind(date)
        .fetch_one(self.pool.raw())
        .await?;

        let cash: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(p.amount) FROM payments p
            JOIN customers c ON c.id = p.customer_id
            WHERE c.shop_id = $1 AND p.received_at::date = $2 AND p.method = 'cash'
            "#,
        )
        .bind(&shop_id.0)
        .bind(date)
        .fetch_one(self.pool.raw())
        .await?;

        let upi: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(p.amount) FROM payments p
            JOIN customers c ON c.id = p.customer_id
            WHERE c.shop_id = $1 AND p.received_at::date = $2 AND p.method = 'upi'
            "#,
        )
        .bind(&shop_id.0)
        .bind(date)
        .fetch_one(self.pool.raw())
        .await?;

        let pending = self.get_total_pending_amount(shop_id).await?;

        Ok(DailySummary {
            date,
            invoice_count,
            total_sales: Money::from_decimal(total_sales),
            cash_collected: Money::from_decimal(cash.unwrap_or_default()),
            upi_collected: Money::from_decimal(upi.unwrap_or_default()),
            pending_amount: pending,
        })
    }
}

/// `generateInvoiceNo` — Indian financial year (Apr 1 → Mar 31), formatted
/// `YYYY-YY`, with a strictly monotone 4-digit zero-padded sequence
/// assigned by an atomic upsert inside the caller's transaction.
async fn generate_invoice_no(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    shop_id: &ShopId,
    now: DateTime<Utc>,
) -> Result<String> {
    let fy = financial_year_label(now.date_naive());
    let sequence: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO invoice_counters (shop_id, financial_year, next_sequence)
        VALUES ($1, $2, 1)
        ON CONFLICT (shop_id, financial_year)
        DO UPDATE SET next_sequence = invoice_counters.next_sequence + 1
        RETURNING next_sequence
        "#,
    )
    .bind(&shop_id.0)
    .bind(&fy)
    .fetch_one(&mut **tx)
    .await?;

    Ok(format!("{fy}/INV/{sequence:04}"))
}

/// Indian financial year label for a given calendar date: Apr 1 starts a
/// new year, e.g. 2025-02-14 falls in `2024-25`.
pub fn financial_year_label(date: NaiveDate) -> String {
    use chrono::Datelike;
    let year = date.year();
    if date.month() >= 4 {
        format!("{year}-{:02}", (year + 1) % 100)
    } else {
        format!("{}-{:02}", year - 1, year % 100)
    }
}

async fn resolve_or_create_product(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    shop_id: &ShopId,
    spoken_name: &str,
) -> Result<(Product, bool)> {
    let lower = spoken_name.trim().to_lowercase();

    // Pass 1: exact case-insensitive contains match, either direction.
    let exact: Option<ProductRow> = sqlx::query_as(
        r#"
        SELECT id, name, unit, price, stock, hsn_code, gst_rate, cess_rate, is_gst_exempt, is_active, auto_created
        FROM products
        WHERE shop_id = $1 AND is_active AND (lower(name) LIKE '%' || $2 || '%' OR $2 LIKE '%' || lower(name) || '%')
        ORDER BY length(name) ASC
        LIMIT 1
        "#,
    )
    .bind(&shop_id.0)
    .bind(&lower)
    .fetch_optional(&mut **tx)
    .await?;
    if let Some(row) = exact {
        return Ok((row.into(), false));
    }

    // Pass 2: fuzzy longest-overlap ratio over the catalogue.
    let all: Vec<ProductRow> = sqlx::query_as(
        r#"
        SELECT id, name, unit, price, stock, hsn_code, gst_rate, cess_rate, is_gst_exempt, is_active, auto_created
        FROM products WHERE shop_id = $1 AND is_active
        "#,
    )
    .bind(&shop_id.0)
    .fetch_all(&mut **tx)
    .await?;

    let normalized_query = normalize_for_overlap(&lower);
    let mut best: Option<(f64, ProductRow)> = None;
    for row in all {
        let ratio = overlap_ratio(&normalized_query, &normalize_for_overlap(&row.name.to_lowercase()));
        if ratio >= 0.5 && best.as_ref().map(|(b, _)| ratio > *b).unwrap_or(true) {
            best = Some((ratio, row));
        }
    }
    if let Some((_, row)) = best {
        return Ok((row.into(), false));
    }

    // Pass 3: auto-create a zero-priced placeholder.
    let placeholder = Product::placeholder(spoken_name.trim(), "piece");
    sqlx::query(
        r#"
        INSERT INTO products (id, shop_id, name, unit, price, stock, is_gst_exempt, is_active, auto_created)
        VALUES ($1, $2, $3, $4, 0, $5, FALSE, TRUE, TRUE)
        "#,
    )
    .bind(placeholder.id.0)
    .bind(&shop_id.0)
    .bind(&placeholder.name)
    .bind(&placeholder.unit)
    .bind(PLACEHOLDER_STOCK)
    .execute(&mut **tx)
    .await?;

    Ok((placeholder, true))
}

fn normalize_for_overlap(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Longest common substring length, scaled by the longer string's length.
fn overlap_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    let mut longest = 0;
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            if a[i - 1] == b[j - 1] {
                dp[i][j] = dp[i - 1][j - 1] + 1;
                longest = longest.max(dp[i][j]);
            }
        }
    }
    longest as f64 / a.len().max(b.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn financial_year_before_april_uses_previous_calendar_year() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
        assert_eq!(financial_year_label(date), "2024-25");
    }

    #[test]
    fn financial_year_on_april_first_rolls_over() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        assert_eq!(financial_year_label(date), "2025-26");
    }

    #[test]
    fn overlap_ratio_is_one_for_identical_strings() {
        assert_eq!(overlap_ratio("chawal", "chawal"), 1.0);
    }

    #[test]
    fn overlap_ratio_rewards_shared_substring() {
        let ratio = overlap_ratio("chawal", "chawalbasmati");
        assert!(ratio > 0.4);
    }
}
