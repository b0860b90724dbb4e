//! The `LedgerStore` handle shared by every operation in this crate.

use crate::cache::BalanceCache;
use crate::pool::LedgerPool;
use dashmap::DashMap;
use std::sync::Arc;
use voice_agent_core::customer::Customer;
use voice_agent_core::traits::JobQueue;
use voice_agent_text::FuzzyMatcher;

/// ACID operations over customers, products, invoices, payments, ledger
/// entries, and reminders for one shop's Postgres database.
///
/// Dependency-injected rather than a singleton service object: every executor in
/// `voice-agent-agent` takes this handle so it is unit-testable against a
/// stub `JobQueue`/`FuzzyMatcher` without standing up Postgres.
#[derive(Clone)]
pub struct LedgerStore {
    pub(crate) pool: LedgerPool,
    pub(crate) balance_cache: Arc<BalanceCache>,
    pub(crate) job_queue: Arc<dyn JobQueue>,
    pub(crate) fuzzy: Arc<FuzzyMatcher>,
    /// Per-session warm cache of the last `searchCustomer` result set, so
    /// `searchCustomerRanked` can rescan in-process on a
    /// repeat query within the same conversation instead of re-querying.
    pub(crate) search_cache: Arc<DashMap<String, Vec<Customer>>>,
}

impl LedgerStore {
    pub fn new(pool: LedgerPool, job_queue: Arc<dyn JobQueue>, fuzzy: Arc<FuzzyMatcher>) -> Self {
        Self {
            pool,
            balance_cache: Arc::new(BalanceCache::new()),
            job_queue,
            fuzzy,
            search_cache: Arc::new(DashMap::new()),
        }
    }

    pub fn pool(&self) -> &LedgerPool {
        &self.pool
    }
}
