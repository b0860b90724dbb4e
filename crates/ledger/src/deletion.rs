//! Cascading customer deletion.

use crate::error::{LedgerError, Result};
use crate::store::LedgerStore;
use serde::{Deserialize, Serialize};
use voice_agent_core::ids::CustomerId;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DeletionCounts {
    pub invoices: u64,
    pub invoice_items: u64,
    pub payments: u64,
    pub ledger_entries: u64,
    pub reminders: u64,
}

impl LedgerStore {
    /// Row-locks the customer first to serialise concurrent deletes, then
    /// cascades invoices (and their items), payments, ledger entries, and
    /// reminders — cancelling any still-queued reminder jobs along the way.
    pub async fn delete_customer_and_all_data(&self, customer_id: CustomerId) -> Result<DeletionCounts> {
        let mut tx = self.pool.raw().begin().await?;

        let exists: Option<uuid::Uuid> = sqlx::query_scalar("SELECT id FROM customers WHERE id = $1 FOR UPDATE")
            .bind(customer_id.0)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(LedgerError::CustomerNotFound);
        }

        let job_ids: Vec<Option<String>> = sqlx::query_scalar(
            "SELECT external_job_id FROM reminders WHERE customer_id = $1",
        )
        .bind(customer_id.0)
        .fetch_all(&mut *tx)
        .await?;
        for job_id in job_ids.into_iter().flatten() {
            let _ = self.job_queue.cancel(&job_id).await;
        }
        let reminders = sqlx::query("DELETE FROM reminders WHERE customer_id = $1")
            .bind(customer_id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let invoice_items = sqlx::query(
            r#"
            DELETE FROM invoice_items WHERE invoice_id IN (SELECT id FROM invoices WHERE customer_id = $1)
            "#,
        )
        .bind(customer_id.0)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let invoices = sqlx::query("DELETE FROM invoices WHERE customer_id = $1")
            .bind(customer_id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let payments = sqlx::query("DELETE FROM payments WHERE customer_id = $1")
            .bind(customer_id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let ledger_entries = sqlx::query("DELETE FROM ledger_entries WHERE customer_id = $1")
            .bind(customer_id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(customer_id.0)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.balance_cache.invalidate(customer_id);

        Ok(DeletionCounts { invoices, invoice_items, payments, ledger_entries, reminders })
    }
}
