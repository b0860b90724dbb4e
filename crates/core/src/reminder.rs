//! Payment-collection reminders backed by an external job queue

use crate::ids::{CustomerId, ReminderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Scheduled,
    Sent,
    Cancelled,
    Failed,
}

/// A scheduled reminder to collect a pending balance.
///
/// `external_job_id` is an opaque handle into the job queue. If enqueueing
/// fails after the database row is inserted, the row must be moved to
/// `Failed` in the same unit of work — it must never be left `Scheduled`
/// with no corresponding job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub customer_id: CustomerId,
    pub scheduled_time: DateTime<Utc>,
    pub status: ReminderStatus,
    /// Carries the reminder amount as a string rather than a typed `Money`
    /// field, since a reminder note is free-form text read back to the
    /// shopkeeper, not a ledger entry.
    pub notes: String,
    pub external_job_id: Option<String>,
}

impl Reminder {
    pub fn new(customer_id: CustomerId, scheduled_time: DateTime<Utc>, notes: impl Into<String>) -> crate::Result<Self> {
        if scheduled_time <= Utc::now() {
            return Err(crate::Error::Validation(
                "reminder scheduled_time must be in the future".into(),
            ));
        }
        Ok(Self {
            id: ReminderId::new(),
            customer_id,
            scheduled_time,
            status: ReminderStatus::Scheduled,
            notes: notes.into(),
            external_job_id: None,
        })
    }

    pub fn mark_enqueue_failed(&mut self) {
        self.status = ReminderStatus::Failed;
        self.external_job_id = None;
    }

    pub fn mark_enqueued(&mut self, job_id: impl Into<String>) {
        self.external_job_id = Some(job_id.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn rejects_past_schedule() {
        let past = Utc::now() - Duration::hours(1);
        assert!(Reminder::new(CustomerId::new(), past, "500").is_err());
    }

    #[test]
    fn failed_enqueue_clears_job_id_and_fails_status() {
        let future = Utc::now() + Duration::hours(2);
        let mut r = Reminder::new(CustomerId::new(), future, "500").unwrap();
        r.mark_enqueue_failed();
        assert_eq!(r.status, ReminderStatus::Failed);
        assert!(r.external_job_id.is_none());
    }
}
