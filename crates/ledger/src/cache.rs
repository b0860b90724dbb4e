//! In-process 30-second balance cache, invalidated explicitly by every
//! balance-mutating call, in the same
//! `parking_lot`-guarded style the teacher uses for its shared state.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use voice_agent_core::ids::CustomerId;
use voice_agent_core::money::Money;

const TTL: Duration = Duration::from_secs(30);

#[derive(Default)]
pub struct BalanceCache {
    entries: Mutex<HashMap<CustomerId, (Money, Instant)>>,
}

impl BalanceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, customer_id: CustomerId) -> Option<Money> {
        let entries = self.entries.lock();
        entries.get(&customer_id).and_then(|(balance, at)| {
            if at.elapsed() < TTL {
                Some(*balance)
            } else {
                None
            }
        })
    }

    pub fn put(&self, customer_id: CustomerId, balance: Money) {
        self.entries.lock().insert(customer_id, (balance, Instant::now()));
    }

    pub fn invalidate(&self, customer_id: CustomerId) {
        self.entries.lock().remove(&customer_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fresh_entry_is_returned() {
        let cache = BalanceCache::new();
        let id = CustomerId::new();
        cache.put(id, Money::from_decimal(dec!(100)));
        assert_eq!(cache.get(id), Some(Money::from_decimal(dec!(100))));
    }

    #[test]
    fn invalidate_clears_entry() {
        let cache = BalanceCache::new();
        let id = CustomerId::new();
        cache.put(id, Money::from_decimal(dec!(100)));
        cache.invalidate(id);
        assert_eq!(cache.get(id), None);
    }
}
