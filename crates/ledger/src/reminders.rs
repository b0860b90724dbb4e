//! Payment-collection reminders, backed by the external job queue.

use crate::error::{LedgerError, Result};
use crate::rows::{reminder_status_str, ReminderRow};
use crate::store::LedgerStore;
use chrono::{DateTime, Utc};
use voice_agent_core::ids::{CustomerId, ReminderId, ShopId};
use voice_agent_core::money::Money;
use voice_agent_core::reminder::{Reminder, ReminderStatus};

impl LedgerStore {
    /// Inserts the `Reminder` row first, then enqueues the job in the same
    /// unit of work; an enqueue failure flips the row straight to `Failed`
    /// rather than leaving it `Scheduled` with no backing job.
    pub async fn schedule_reminder(
        &self,
        customer_id: CustomerId,
        amount: Money,
        scheduled_time: DateTime<Utc>,
    ) -> Result<Reminder> {
        let mut reminder = Reminder::new(customer_id, scheduled_time, amount.to_string())?;

        sqlx::query(
            r#"
            INSERT INTO reminders (id, customer_id, scheduled_time, status, notes)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(reminder.id.0)
        .bind(customer_id.0)
        .bind(scheduled_time)
        .bind(reminder_status_str(ReminderStatus::Scheduled))
        .bind(&reminder.notes)
        .execute(self.pool.raw())
        .await?;

        let payload = serde_json::json!({ "customer_id": customer_id.to_string(), "amount": amount.to_string() }).to_string();
        match self.job_queue.enqueue("payment_reminder", &payload, scheduled_time).await {
            Ok(job_id) => {
                reminder.mark_enqueued(job_id.clone());
                sqlx::query("UPDATE reminders SET external_job_id = $2 WHERE id = $1")
                    .bind(reminder.id.0)
                    .bind(&job_id)
                    .execute(self.pool.raw())
                    .await?;
            }
            Err(err) => {
                tracing::warn!(error = %err, reminder_id = %reminder.id, "reminder job enqueue failed, marking FAILED");
                reminder.mark_enqueue_failed();
                sqlx::query("UPDATE reminders SET status = $2 WHERE id = $1")
                    .bind(reminder.id.0)
                    .bind(reminder_status_str(ReminderStatus::Failed))
                    .execute(self.pool.raw())
                    .await?;
            }
        }

        Ok(reminder)
    }

    /// `cancelReminder` — cancels the first still-pending reminder for the
    /// customer, removing the queued job if it hasn't fired yet.
    pub async fn cancel_reminder_for_customer(&self, customer_id: CustomerId) -> Result<Reminder> {
        let row: Option<ReminderRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, scheduled_time, status, notes, external_job_id
            FROM reminders WHERE customer_id = $1 AND status = 'scheduled' ORDER BY scheduled_time LIMIT 1
            "#,
        )
        .bind(customer_id.0)
        .fetch_optional(self.pool.raw())
        .await?;
        let row = row.ok_or(LedgerError::NoReminder)?;

        if let Some(job_id) = &row.external_job_id {
            let _ = self.job_queue.cancel(job_id).await;
        }

        let updated: ReminderRow = sqlx::query_as(
            r#"
            UPDATE reminders SET status = $2 WHERE id = $1
            RETURNING id, customer_id, scheduled_time, status, notes, external_job_id
            "#,
        )
        .bind(row.id)
        .bind(reminder_status_str(ReminderStatus::Cancelled))
        .fetch_one(self.pool.raw())
        .await?;

        Ok(updated.into())
    }

    pub async fn cancel_reminder(&self, reminder_id: ReminderId) -> Result<Reminder> {
        let row: Option<ReminderRow> = sqlx::query_as(
            r#"SELECT id, customer_id, scheduled_time, status, notes, external_job_id FROM reminders WHERE id = $1"#,
        )
        .bind(reminder_id.0)
        .fetch_optional(self.pool.raw())
        .await?;
        let row = row.ok_or(LedgerError::NoReminder)?;
        if let Some(job_id) = &row.external_job_id {
            let _ = self.job_queue.cancel(job_id).await;
        }
        let updated: ReminderRow = sqlx::query_as(
            r#"UPDATE reminders SET status = $2 WHERE id = $1
               RETURNING id, customer_id, scheduled_time, status, notes, external_job_id"#,
        )
        .bind(reminder_id.0)
        .bind(reminder_status_str(ReminderStatus::Cancelled))
        .fetch_one(self.pool.raw())
        .await?;
        Ok(updated.into())
    }

    /// `modifyReminder` — reschedules the first pending reminder, keeping
    /// its queue job in sync (cancel the old, enqueue a new one).
    pub async fn reschedule_reminder(&self, customer_id: CustomerId, new_time: DateTime<Utc>) -> Result<Reminder> {
        let row: Option<ReminderRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, scheduled_time, status, notes, external_job_id
            FROM reminders WHERE customer_id = $1 AND status = 'scheduled' ORDER BY scheduled_time LIMIT 1
            "#,
        )
        .bind(customer_id.0)
        .fetch_optional(self.pool.raw())
        .await?;
        let row = row.ok_or(LedgerError::NoReminder)?;

        if let Some(job_id) = &row.external_job_id {
            let _ = self.job_queue.cancel(job_id).await;
        }

        let payload = serde_json::json!({ "customer_id": customer_id.to_string(), "amount": row.notes }).to_string();
        let job_id = self.job_queue.enqueue("payment_reminder", &payload, new_time).await.ok();

        let updated: ReminderRow = sqlx::query_as(
            r#"
            UPDATE reminders SET scheduled_time = $2, external_job_id = $3 WHERE id = $1
            RETURNING id, customer_id, scheduled_time, status, notes, external_job_id
            "#,
        )
        .bind(row.id)
        .bind(new_time)
        .bind(job_id)
        .fetch_one(self.pool.raw())
        .await?;

        Ok(updated.into())
    }

    /// `listReminders` — every still-scheduled reminder in the shop.
    pub async fn list_pending_reminders(&self, shop_id: &ShopId) -> Result<Vec<Reminder>> {
        let rows: Vec<ReminderRow> = sqlx::query_as(
            r#"
            SELECT r.id, r.customer_id, r.scheduled_time, r.status, r.notes, r.external_job_id
            FROM reminders r JOIN customers c ON c.id = r.customer_id
            WHERE c.shop_id = $1 AND r.status = 'scheduled'
            ORDER BY r.scheduled_time
            "#,
        )
        .bind(&shop_id.0)
        .fetch_all(self.pool.raw())
        .await?;
        Ok(rows.into_iter().map(Reminder::from).collect())
    }
}
