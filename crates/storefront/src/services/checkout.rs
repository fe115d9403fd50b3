//! Cart pricing and checkout settlement.
//!
//! Settlement is read-compute-write against the credit ledger. In the
//! default mode the balance read at account resolution is the one
//! settled against, and the debit is the repository's last-writer-wins
//! UPDATE, so two concurrent checkouts can both read the same balance
//! and each debit from it - the classic double-spend window this lab
//! demonstrates. The `CARDSTOCK_ATOMIC_CHECKOUT` flag re-reads and
//! writes inside one transaction instead, closing the window without
//! touching the settlement rules, which both modes share via
//! [`decide`].

use sqlx::{SqliteConnection, SqlitePool};

use cardstock_core::{CardId, Cart, UserId};

use crate::db::{AccountRepository, CardRepository, RepositoryError};
use crate::models::{Account, Card};

/// One cart entry resolved against the catalog.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub card: Card,
    pub quantity: i64,
    pub line_total: f64,
}

/// How a settlement attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// Balance debited (or left alone for a zero total).
    Completed { total: f64, new_balance: f64 },
    /// Positive total exceeded the available balance; nothing written.
    InsufficientCredits,
    /// No resolvable account behind the claim; nothing priced or written.
    NotAuthenticated,
}

/// Resolve cart entries against the catalog and sum the total.
///
/// Entries whose key does not parse as a card id, or whose card no
/// longer exists, are skipped without comment. Negative quantities
/// price as negative line totals.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a catalog lookup fails.
pub async fn price_cart(
    pool: &SqlitePool,
    cart: &Cart,
) -> Result<(Vec<PricedLine>, f64), RepositoryError> {
    let cards = CardRepository::new(pool);
    let mut lines = Vec::new();
    let mut total = 0.0;

    for (key, quantity) in cart.entries() {
        let Ok(raw_id) = key.parse::<i32>() else {
            continue;
        };
        let Some(card) = cards.get(CardId::new(raw_id)).await? else {
            continue;
        };
        #[allow(clippy::cast_precision_loss)]
        let line_total = card.price * quantity as f64;
        total += line_total;
        lines.push(PricedLine {
            card,
            quantity,
            line_total,
        });
    }

    Ok((lines, total))
}

/// Resolve the account behind an identity claim, if any.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the lookup fails.
pub async fn resolve_account(
    pool: &SqlitePool,
    user_claim: Option<&str>,
) -> Result<Option<Account>, RepositoryError> {
    let Some(id) = user_claim.and_then(|raw| raw.parse::<i32>().ok()) else {
        return Ok(None);
    };
    AccountRepository::new(pool).get_by_id(UserId::new(id)).await
}

/// How the settlement rules resolve for a given balance and total.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Settlement {
    /// Positive total exceeds the balance; nothing may be written.
    Insufficient,
    /// Exactly-zero total; the ledger write is skipped entirely.
    NoWrite,
    /// Debit the total (negative totals credit the account).
    Write { new_balance: f64 },
}

/// The three settlement rules, in order.
#[allow(clippy::float_cmp)]
fn decide(credits: f64, total: f64) -> Settlement {
    if total > 0.0 && credits < total {
        return Settlement::Insufficient;
    }
    if total == 0.0 {
        return Settlement::NoWrite;
    }
    Settlement::Write {
        new_balance: credits - total,
    }
}

/// Settle a checkout against the credit ledger.
///
/// Both modes apply [`decide`]; they differ only in where the balance
/// is read and how the write lands. Baseline uses the balance from
/// account resolution and the repository's plain UPDATE; atomic
/// re-reads and writes inside one transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any query fails.
pub async fn settle(
    pool: &SqlitePool,
    atomic: bool,
    user_claim: Option<&str>,
    cart: &Cart,
) -> Result<CheckoutOutcome, RepositoryError> {
    let Some(account) = resolve_account(pool, user_claim).await? else {
        return Ok(CheckoutOutcome::NotAuthenticated);
    };

    let (_, total) = price_cart(pool, cart).await?;

    let settled = if atomic {
        let mut tx = pool.begin().await?;
        let settled = settle_in_tx(&mut tx, account.id, total).await?;
        tx.commit().await?;
        settled
    } else {
        match decide(account.credits, total) {
            Settlement::Insufficient => None,
            Settlement::NoWrite => Some(account.credits),
            Settlement::Write { new_balance } => {
                AccountRepository::new(pool)
                    .update_credits(account.id, new_balance)
                    .await?;
                Some(new_balance)
            }
        }
    };

    Ok(match settled {
        Some(new_balance) => CheckoutOutcome::Completed { total, new_balance },
        None => CheckoutOutcome::InsufficientCredits,
    })
}

/// Re-read the balance and settle inside the caller's transaction.
///
/// Returns `None` for the insufficient case, otherwise the balance
/// after settlement.
async fn settle_in_tx(
    conn: &mut SqliteConnection,
    account_id: UserId,
    total: f64,
) -> Result<Option<f64>, RepositoryError> {
    let credits: f64 = sqlx::query_scalar("SELECT credits FROM accounts WHERE id = ?")
        .bind(account_id.as_i32())
        .fetch_one(&mut *conn)
        .await?;

    match decide(credits, total) {
        Settlement::Insufficient => Ok(None),
        Settlement::NoWrite => Ok(Some(credits)),
        Settlement::Write { new_balance } => {
            sqlx::query("UPDATE accounts SET credits = ? WHERE id = ?")
                .bind(new_balance)
                .bind(account_id.as_i32())
                .execute(&mut *conn)
                .await?;
            Ok(Some(new_balance))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use cardstock_core::Role;
    use crate::db::create_pool_sized;

    struct Fixture {
        pool: SqlitePool,
        account: Account,
        card: Card,
    }

    async fn fixture(credits: f64, price: f64) -> Fixture {
        let pool = create_pool_sized("sqlite::memory:", 1).await.unwrap();
        let account = AccountRepository::new(&pool)
            .create("buyer", "password", Role::User, credits)
            .await
            .unwrap();
        let card = CardRepository::new(&pool)
            .create("Sparkmouse", Some("Electric"), price, None, None)
            .await
            .unwrap();
        Fixture {
            pool,
            account,
            card,
        }
    }

    fn cart(pairs: &[(&str, i64)]) -> Cart {
        let mut c = Cart::default();
        c.bulk_set(pairs.iter().map(|(k, v)| ((*k).to_owned(), *v)));
        c
    }

    async fn write_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT total_changes()")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn balance(pool: &SqlitePool, id: UserId) -> f64 {
        AccountRepository::new(pool)
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .credits
    }

    #[test]
    fn settlement_rules_apply_in_order() {
        assert_eq!(decide(40.0, 50.0), Settlement::Insufficient);
        assert_eq!(decide(40.0, 0.0), Settlement::NoWrite);
        assert_eq!(decide(100.0, 60.0), Settlement::Write { new_balance: 40.0 });
        // Negative totals are never "insufficient"; they credit.
        assert_eq!(decide(10.0, -50.0), Settlement::Write { new_balance: 60.0 });
        // Exact coverage settles to zero, not insufficient.
        assert_eq!(decide(50.0, 50.0), Settlement::Write { new_balance: 0.0 });
    }

    #[tokio::test]
    async fn baseline_debit_is_a_single_ledger_update() {
        let f = fixture(100.0, 10.0).await;
        let id = f.card.id.to_string();
        let before = write_count(&f.pool).await;

        let outcome = settle(&f.pool, false, Some("1"), &cart(&[(&id, 3)]))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CheckoutOutcome::Completed {
                total: 30.0,
                new_balance: 70.0
            }
        );
        assert_eq!(write_count(&f.pool).await, before + 1);
    }

    #[tokio::test]
    async fn missing_claim_is_not_authenticated() {
        let f = fixture(100.0, 10.0).await;
        let outcome = settle(&f.pool, false, None, &cart(&[("1", 1)]))
            .await
            .unwrap();
        assert_eq!(outcome, CheckoutOutcome::NotAuthenticated);
    }

    #[tokio::test]
    async fn non_numeric_claim_resolves_to_no_account() {
        let f = fixture(100.0, 10.0).await;
        let outcome = settle(&f.pool, false, Some("abc"), &cart(&[("1", 1)]))
            .await
            .unwrap();
        assert_eq!(outcome, CheckoutOutcome::NotAuthenticated);
    }

    #[tokio::test]
    async fn claim_for_a_deleted_account_is_not_authenticated() {
        let f = fixture(100.0, 10.0).await;
        let outcome = settle(&f.pool, false, Some("9999"), &cart(&[("1", 1)]))
            .await
            .unwrap();
        assert_eq!(outcome, CheckoutOutcome::NotAuthenticated);
    }

    #[tokio::test]
    async fn sufficient_balance_is_debited() {
        let f = fixture(100.0, 10.0).await;
        let id = f.card.id.to_string();
        let outcome = settle(&f.pool, false, Some("1"), &cart(&[(&id, 3)]))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CheckoutOutcome::Completed {
                total: 30.0,
                new_balance: 70.0
            }
        );
        assert_eq!(balance(&f.pool, f.account.id).await, 70.0);
    }

    #[tokio::test]
    async fn insufficient_balance_writes_nothing() {
        let f = fixture(5.0, 10.0).await;
        let id = f.card.id.to_string();
        let before = write_count(&f.pool).await;

        let outcome = settle(&f.pool, false, Some("1"), &cart(&[(&id, 1)]))
            .await
            .unwrap();
        assert_eq!(outcome, CheckoutOutcome::InsufficientCredits);
        assert_eq!(write_count(&f.pool).await, before);
        assert_eq!(balance(&f.pool, f.account.id).await, 5.0);
    }

    #[tokio::test]
    async fn empty_cart_settles_without_a_write() {
        let f = fixture(50.0, 10.0).await;
        let before = write_count(&f.pool).await;

        let outcome = settle(&f.pool, false, Some("1"), &Cart::default())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CheckoutOutcome::Completed {
                total: 0.0,
                new_balance: 50.0
            }
        );
        assert_eq!(write_count(&f.pool).await, before);
    }

    #[tokio::test]
    async fn unknown_and_unparseable_entries_are_skipped() {
        let f = fixture(100.0, 10.0).await;
        let id = f.card.id.to_string();
        let mixed = cart(&[(&id, 2), ("9999", 5), ("mystery", 3)]);

        let outcome = settle(&f.pool, false, Some("1"), &mixed).await.unwrap();
        assert_eq!(
            outcome,
            CheckoutOutcome::Completed {
                total: 20.0,
                new_balance: 80.0
            }
        );
    }

    #[tokio::test]
    async fn cart_of_only_unresolvable_entries_totals_zero_and_skips_the_write() {
        let f = fixture(50.0, 10.0).await;
        let before = write_count(&f.pool).await;

        let outcome = settle(&f.pool, false, Some("1"), &cart(&[("9999", 4)]))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CheckoutOutcome::Completed {
                total: 0.0,
                new_balance: 50.0
            }
        );
        assert_eq!(write_count(&f.pool).await, before);
    }

    #[tokio::test]
    async fn negative_quantities_inflate_the_balance() {
        let f = fixture(10.0, 25.0).await;
        let id = f.card.id.to_string();

        let outcome = settle(&f.pool, false, Some("1"), &cart(&[(&id, -2)]))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CheckoutOutcome::Completed {
                total: -50.0,
                new_balance: 60.0
            }
        );
        assert_eq!(balance(&f.pool, f.account.id).await, 60.0);
    }

    #[tokio::test]
    async fn offsetting_entries_total_exactly_zero_and_skip_the_write() {
        let f = fixture(40.0, 10.0).await;
        let other = CardRepository::new(&f.pool)
            .create("Embermite", Some("Fire"), 20.0, None, None)
            .await
            .unwrap();
        let a = f.card.id.to_string();
        let b = other.id.to_string();
        let before = write_count(&f.pool).await;

        // 2 * 10.0 + (-1) * 20.0 == 0.0 exactly.
        let outcome = settle(&f.pool, false, Some("1"), &cart(&[(&a, 2), (&b, -1)]))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CheckoutOutcome::Completed {
                total: 0.0,
                new_balance: 40.0
            }
        );
        assert_eq!(write_count(&f.pool).await, before);
    }

    #[tokio::test]
    async fn atomic_mode_settles_the_same_totals() {
        let f = fixture(100.0, 10.0).await;
        let id = f.card.id.to_string();

        let outcome = settle(&f.pool, true, Some("1"), &cart(&[(&id, 4)]))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CheckoutOutcome::Completed {
                total: 40.0,
                new_balance: 60.0
            }
        );
        assert_eq!(balance(&f.pool, f.account.id).await, 60.0);
    }

    #[tokio::test]
    async fn atomic_mode_still_rejects_insufficient_balances() {
        let f = fixture(5.0, 10.0).await;
        let id = f.card.id.to_string();

        let outcome = settle(&f.pool, true, Some("1"), &cart(&[(&id, 1)]))
            .await
            .unwrap();
        assert_eq!(outcome, CheckoutOutcome::InsufficientCredits);
        assert_eq!(balance(&f.pool, f.account.id).await, 5.0);
    }

    #[tokio::test]
    async fn priced_lines_carry_per_line_totals() {
        let f = fixture(0.0, 12.5).await;
        let id = f.card.id.to_string();
        let (lines, total) = price_cart(&f.pool, &cart(&[(&id, 2), ("mystery", 1)]))
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].line_total, 25.0);
        assert_eq!(total, 25.0);
    }
}
