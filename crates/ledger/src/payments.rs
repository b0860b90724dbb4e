//! Payments and direct ledger credits.

use crate::error::Result;
use crate::rows::{ledger_entry_type_str, payment_method_str, PaymentRow};
use crate::store::LedgerStore;
use voice_agent_core::ids::CustomerId;
use voice_agent_core::ledger_entry::LedgerEntryType;
use voice_agent_core::money::Money;
use voice_agent_core::payment::{Payment, PaymentMethod};

impl LedgerStore {
    /// `recordPayment` — a CREDIT ledger entry plus a `Payment` row,
    /// decrementing the customer's running balance.
    pub async fn record_payment(
        &self,
        customer_id: CustomerId,
        amount: Money,
        method: PaymentMethod,
        notes: Option<&str>,
    ) -> Result<(Payment, Money)> {
        let mut tx = self.pool.raw().begin().await?;

        let payment = Payment::new(customer_id, amount, method)?;
        let row: PaymentRow = sqlx::query_as(
            r#"
            INSERT INTO payments (id, customer_id, amount, method, status, received_at)
            VALUES ($1, $2, $3, $4, 'recorded', now())
            RETURNING id, customer_id, amount, method, status, received_at
            "#,
        )
        .bind(payment.id.0)
        .bind(customer_id.0)
        .bind(amount.inner())
        .bind(payment_method_str(method))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (customer_id, entry_type, amount, description, reference, payment_mode, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            "#,
        )
        .bind(customer_id.0)
        .bind(ledger_entry_type_str(LedgerEntryType::Credit))
        .bind(amount.inner())
        .bind(notes.unwrap_or("Payment received"))
        .bind(row.id.to_string())
        .bind(payment_method_str(method))
        .execute(&mut *tx)
        .await?;

        let new_balance: rust_decimal::Decimal = sqlx::query_scalar(
            "UPDATE customers SET balance = balance - $2 WHERE id = $1 RETURNING balance",
        )
        .bind(customer_id.0)
        .bind(amount.inner())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        self.balance_cache.invalidate(customer_id);

        Ok((row.into(), Money::from_decimal(new_balance)))
    }

    /// `addCredit` — appends a CREDIT entry without a `Payment` row (e.g.
    /// goodwill adjustment, manual correction).
    pub async fn add_credit(&self, customer_id: CustomerId, amount: Money, description: &str) -> Result<Money> {
        let mut tx = self.pool.raw().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (customer_id, entry_type, amount, description, created_at)
            VALUES ($1, $2, $3, $4, now())
            "#,
        )
        .bind(customer_id.0)
        .bind(ledger_entry_type_str(LedgerEntryType::Credit))
        .bind(amount.inner())
        .bind(description)
        .execute(&mut *tx)
        .await?;

        let new_balance: rust_decimal::Decimal = sqlx::query_scalar(
            "UPDATE customers SET balance = balance - $2 WHERE id = $1 RETURNING balance",
        )
        .bind(customer_id.0)
        .bind(amount.inner())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        self.balance_cache.invalidate(customer_id);
        Ok(Money::from_decimal(new_balance))
    }

    /// `updateBalance` — a raw delta with no ledger entry, used only to set
    /// an opening balance at customer creation.
    pub async fn update_balance(&self, customer_id: CustomerId, delta: Money) -> Result<Money> {
        let mut tx = self.pool.raw().begin().await?;

        if !delta.is_zero() {
            sqlx::query(
                r#"
                INSERT INTO ledger_entries (customer_id, entry_type, amount, description, created_at)
                VALUES ($1, 'opening_balance', $2, 'Opening balance', now())
                "#,
            )
            .bind(customer_id.0)
            .bind(delta.inner().abs())
            .execute(&mut *tx)
            .await?;
        }

        let new_balance: rust_decimal::Decimal = sqlx::query_scalar(
            "UPDATE customers SET balance = balance + $2 WHERE id = $1 RETURNING balance",
        )
        .bind(customer_id.0)
        .bind(delta.inner())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        self.balance_cache.invalidate(customer_id);
        Ok(Money::from_decimal(new_balance))
    }
}
