//! Customer creation, search/ranking, and balance queries.

use crate::error::{LedgerError, Result};
use crate::rows::CustomerRow;
use crate::store::LedgerStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use voice_agent_core::customer::Customer;
use voice_agent_core::ids::{CustomerId, ShopId};
use voice_agent_core::money::Money;

/// A ranked search hit, carried out to the HTTP surface and the Customer
/// Resolver as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerMatch {
    pub customer: Customer,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerResult {
    pub success: bool,
    pub duplicate_found: bool,
    pub suggestions: Vec<String>,
    pub customer: Option<Customer>,
}

impl LedgerStore {
    /// `createCustomer` — unique-name check is enforced by the database's
    /// case-insensitive unique index; a violation maps to `LedgerError::Conflict`.
    pub async fn create_customer(
        &self,
        shop_id: &ShopId,
        name: &str,
        phone: Option<&str>,
        nickname: Option<&str>,
        landmark: Option<&str>,
    ) -> Result<Customer> {
        voice_agent_core::customer::validate_name(name)?;
        let customer = Customer::new(name)?;
        let row: CustomerRow = sqlx::query_as(
            r#"
            INSERT INTO customers (id, shop_id, name, phone, nickname, landmark, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING id, name, phone, nickname, landmark, email, balance, total_purchases,
                      visit_count, last_visit, is_active
            "#,
        )
        .bind(customer.id.0)
        .bind(&shop_id.0)
        .bind(name)
        .bind(phone)
        .bind(nickname)
        .bind(landmark)
        .fetch_one(self.pool.raw())
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => LedgerError::Conflict,
            _ => LedgerError::Storage(e),
        })?;
        Ok(row.into())
    }

    /// `searchCustomer` — ranks candidates by the `max()` of several signals
    ///, returns the top 10.
    pub async fn search_customer(&self, shop_id: &ShopId, query: &str) -> Result<Vec<CustomerMatch>> {
        let rows: Vec<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, name, phone, nickname, landmark, email, balance, total_purchases,
                   visit_count, last_visit, is_active
            FROM customers WHERE shop_id = $1 AND is_active
            "#,
        )
        .bind(&shop_id.0)
        .fetch_all(self.pool.raw())
        .await?;

        let query_lower = query.trim().to_lowercase();
        let mut matches: Vec<CustomerMatch> = rows
            .into_iter()
            .map(Customer::from)
            .filter_map(|customer| self.rank_customer(&customer, &query_lower).map(|score| CustomerMatch { customer, score }))
            .collect();

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(10);
        Ok(matches)
    }

    fn rank_customer(&self, customer: &Customer, query_lower: &str) -> Option<f64> {
        if query_lower.is_empty() {
            return None;
        }
        let name_lower = customer.name.to_lowercase();
        let mut best = 0.0f64;

        if let Some(phone) = &customer.phone {
            if phone.contains(query_lower) {
                best = best.max(0.95);
            }
        }
        if name_lower == *query_lower {
            best = best.max(1.0);
        } else if name_lower.contains(query_lower) {
            let similarity_bonus = query_lower.len() as f64 / name_lower.len().max(1) as f64 * 0.2;
            best = best.max(0.8 + similarity_bonus.min(0.2));
        }
        if let Some(nick) = &customer.nickname {
            let nick_lower = nick.to_lowercase();
            if nick_lower == *query_lower {
                best = best.max(0.9);
            } else if nick_lower.contains(query_lower) {
                best = best.max(0.7);
            }
        }
        if let Some(landmark) = &customer.landmark {
            if landmark.to_lowercase().contains(query_lower) {
                best = best.max(0.6);
            }
        }
        if let Some(m) = self.fuzzy.match_name(query_lower, &name_lower, 0.0) {
            best = best.max((m.score * 0.75).min(0.75));
        }

        if best > 0.0 {
            Some(best)
        } else {
            None
        }
    }

    /// `searchCustomerRanked` — session-cache-aware variant: a cache hit
    /// rescans the already-fetched candidate set in-process, a miss
    /// delegates to `search_customer` and warms the cache for next time.
    pub async fn search_customer_ranked(
        &self,
        shop_id: &ShopId,
        query: &str,
        session_id: &str,
    ) -> Result<Vec<CustomerMatch>> {
        let query_lower = query.trim().to_lowercase();
        if let Some(cached) = self.search_cache.get(session_id) {
            let mut matches: Vec<CustomerMatch> = cached
                .iter()
                .filter_map(|c| self.rank_customer(c, &query_lower).map(|score| CustomerMatch { customer: c.clone(), score }))
                .collect();
            if !matches.is_empty() {
                matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
                return Ok(matches);
            }
        }

        let results = self.search_customer(shop_id, query).await?;
        let customers: Vec<Customer> = results.iter().map(|m| m.customer.clone()).collect();
        self.search_cache.insert(session_id.to_string(), customers);
        Ok(results)
    }

    pub async fn get_customer(&self, customer_id: CustomerId) -> Result<Customer> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, name, phone, nickname, landmark, email, balance, total_purchases,
                   visit_count, last_visit, is_active
            FROM customers WHERE id = $1
            "#,
        )
        .bind(customer_id.0)
        .fetch_optional(self.pool.raw())
        .await?;
        row.map(Customer::from).ok_or(LedgerError::CustomerNotFound)
    }

    /// `getBalance` — always reads through to Postgres.
    pub async fn get_balance(&self, customer_id: CustomerId) -> Result<Money> {
        let balance: Decimal = sqlx::query_scalar("SELECT balance FROM customers WHERE id = $1")
            .bind(customer_id.0)
            .fetch_optional(self.pool.raw())
            .await?
            .ok_or(LedgerError::CustomerNotFound)?;
        Ok(Money::from_decimal(balance))
    }

    /// `getBalanceFast` — served from the 30-second in-process cache when fresh.
    pub async fn get_balance_fast(&self, customer_id: CustomerId) -> Result<Money> {
        if let Some(cached) = self.balance_cache.get(customer_id) {
            return Ok(cached);
        }
        let balance = self.get_balance(customer_id).await?;
        self.balance_cache.put(customer_id, balance);
        Ok(balance)
    }

    /// `findSimilarCustomers` — Levenshtein/fuzzy similarity over the first
    /// 100 customers of the shop, used for duplicate-creation detection.
    pub async fn find_similar_customers(&self, shop_id: &ShopId, name: &str, threshold: f64) -> Result<Vec<Customer>> {
        let rows: Vec<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, name, phone, nickname, landmark, email, balance, total_purchases,
                   visit_count, last_visit, is_active
            FROM customers WHERE shop_id = $1 AND is_active ORDER BY created_at LIMIT 100
            "#,
        )
        .bind(&shop_id.0)
        .fetch_all(self.pool.raw())
        .await?;

        Ok(rows
            .into_iter()
            .map(Customer::from)
            .filter(|c| self.fuzzy.match_name(name, &c.name, threshold).is_some())
            .collect())
    }

    /// `createCustomerFast` — creates immediately, flagging a likely
    /// duplicate instead of inserting when one scores ≥0.85.
    pub async fn create_customer_fast(&self, shop_id: &ShopId, name: &str) -> Result<CreateCustomerResult> {
        let similar = self.find_similar_customers(shop_id, name, 0.85).await?;
        if !similar.is_empty() {
            return Ok(CreateCustomerResult {
                success: false,
                duplicate_found: true,
                suggestions: similar.into_iter().map(|c| c.name).collect(),
                customer: None,
            });
        }

        let customer = self.create_customer(shop_id, name, None, None, None).await?;
        Ok(CreateCustomerResult { success: true, duplicate_found: false, suggestions: Vec::new(), customer: Some(customer) })
    }

    /// `getTotalPendingAmount` — sum of positive balances across the shop.
    pub async fn get_total_pending_amount(&self, shop_id: &ShopId) -> Result<Money> {
        let total: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(balance) FROM customers WHERE shop_id = $1 AND balance > 0",
        )
        .bind(&shop_id.0)
        .fetch_one(self.pool.raw())
        .await?;
        Ok(Money::from_decimal(total.unwrap_or(dec!(0))))
    }

    /// `getAllCustomersWithPendingBalance`.
    pub async fn get_all_customers_with_pending_balance(&self, shop_id: &ShopId) -> Result<Vec<Customer>> {
        let rows: Vec<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, name, phone, nickname, landmark, email, balance, total_purchases,
                   visit_count, last_visit, is_active
            FROM customers WHERE shop_id = $1 AND balance > 0 ORDER BY balance DESC
            "#,
        )
        .bind(&shop_id.0)
        .fetch_all(self.pool.raw())
        .await?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    /// `updateCustomer`/`updateCustomerPhone` — persists any of the
    /// optional fields the shopkeeper dictated; invalidates nothing itself
    /// (session-cache invalidation is the dispatcher's job).
    #[allow(clippy::too_many_arguments)]
    pub async fn update_customer(
        &self,
        customer_id: CustomerId,
        phone: Option<&str>,
        email: Option<&str>,
        nickname: Option<&str>,
        landmark: Option<&str>,
    ) -> Result<Customer> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r#"
            UPDATE customers SET
                phone = COALESCE($2, phone),
                email = COALESCE($3, email),
                nickname = COALESCE($4, nickname),
                landmark = COALESCE($5, landmark)
            WHERE id = $1
            RETURNING id, name, phone, nickname, landmark, email, balance, total_purchases,
                      visit_count, last_visit, is_active
            "#,
        )
        .bind(customer_id.0)
        .bind(phone)
        .bind(email)
        .bind(nickname)
        .bind(landmark)
        .fetch_optional(self.pool.raw())
        .await?;
        row.map(Customer::from).ok_or(LedgerError::CustomerNotFound)
    }

    /// Explicit reconciliation: recomputes `balance` from the append-only
    /// ledger. The only operation permitted
    /// to derive the cached balance from source instead of trusting it.
    pub async fn reconcile_balance(&self, customer_id: CustomerId) -> Result<Money> {
        let mut tx = self.pool.raw().begin().await?;

        let debits: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(amount) FROM ledger_entries WHERE customer_id = $1 AND entry_type IN ('debit', 'opening_balance')",
        )
        .bind(customer_id.0)
        .fetch_one(&mut *tx)
        .await?;
        let credits: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(amount) FROM ledger_entries WHERE customer_id = $1 AND entry_type = 'credit'",
        )
        .bind(customer_id.0)
        .fetch_one(&mut *tx)
        .await?;

        let reconciled = debits.unwrap_or(dec!(0)) - credits.unwrap_or(dec!(0));
        sqlx::query("UPDATE customers SET balance = $2 WHERE id = $1")
            .bind(customer_id.0)
            .bind(reconciled)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.balance_cache.invalidate(customer_id);
        Ok(Money::from_decimal(reconciled))
    }
}
