//! Status transitions and balance arithmetic shared by every store backend.
//!
//! Each function here decides a transition and reports the balance delta;
//! persisting both halves atomically is the store's job.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::principal::Admin,
    coins::repo_types::CoinEntry,
    error::{AppError, AppResult},
    prizes::repo_types::Redemption,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ledger_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum LedgerStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn status(self) -> LedgerStatus {
        match self {
            Decision::Approve => LedgerStatus::Approved,
            Decision::Reject => LedgerStatus::Rejected,
        }
    }
}

fn ensure_pending(status: LedgerStatus, what: &str, id: Uuid) -> AppResult<()> {
    if status != LedgerStatus::Pending {
        return Err(AppError::conflict(format!(
            "{} {} was already processed ({:?})",
            what, id, status
        )));
    }
    Ok(())
}

impl CoinEntry {
    /// Moves a pending entry to its terminal state.
    /// Returns the amount to credit to the owner.
    pub fn decide(&mut self, admin: &Admin, decision: Decision) -> AppResult<i32> {
        ensure_pending(self.status, "coin request", self.id)?;
        self.status = decision.status();
        self.approved_by = Some(admin.id());
        Ok(match decision {
            Decision::Approve => self.amount,
            Decision::Reject => 0,
        })
    }

    /// Approved entries already moved coins into the balance and stay.
    pub fn ensure_deletable(&self) -> AppResult<()> {
        if self.status == LedgerStatus::Approved {
            return Err(AppError::conflict(format!(
                "coin request {} is approved and cannot be deleted",
                self.id
            )));
        }
        Ok(())
    }
}

impl Redemption {
    /// Moves a pending redemption to its terminal state.
    /// Returns the amount to refund to the owner: the cost debited at
    /// reservation, not the prize's current price.
    pub fn decide(&mut self, admin: &Admin, decision: Decision) -> AppResult<i32> {
        ensure_pending(self.status, "prize redemption", self.id)?;
        self.status = decision.status();
        self.approved_by = Some(admin.id());
        Ok(match decision {
            Decision::Approve => 0,
            Decision::Reject => self.cost,
        })
    }
}

/// Balance after crediting `amount`. Overflow is an internal failure, the
/// same outcome Postgres reports for an out-of-range integer.
pub fn credit(balance: i32, amount: i32) -> AppResult<i32> {
    balance
        .checked_add(amount)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("balance overflow: {} + {}", balance, amount)))
}

/// Balance left after reserving `cost`.
pub fn reserve(balance: i32, cost: i32) -> AppResult<i32> {
    if balance < cost {
        return Err(AppError::InsufficientFunds { balance, cost });
    }
    Ok(balance - cost)
}

#[cfg(test)]
mod ledger_tests {
    use super::*;
    use time::OffsetDateTime;

    fn admin() -> Admin {
        Admin::for_tests(Uuid::new_v4())
    }

    fn coin(amount: i32) -> CoinEntry {
        let now = OffsetDateTime::now_utc();
        CoinEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            amount,
            status: LedgerStatus::Pending,
            approved_by: None,
            message: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn redemption() -> Redemption {
        let now = OffsetDateTime::now_utc();
        Redemption {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            prize_id: Uuid::new_v4(),
            cost: 10,
            status: LedgerStatus::Pending,
            approved_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn approve_credits_amount_and_records_admin() {
        let admin = admin();
        let mut c = coin(5);
        assert_eq!(c.decide(&admin, Decision::Approve).unwrap(), 5);
        assert_eq!(c.status, LedgerStatus::Approved);
        assert_eq!(c.approved_by, Some(admin.id()));
        assert_eq!(c.amount, 5);
    }

    #[test]
    fn reject_credits_nothing() {
        let mut c = coin(5);
        assert_eq!(c.decide(&admin(), Decision::Reject).unwrap(), 0);
        assert_eq!(c.status, LedgerStatus::Rejected);
    }

    #[test]
    fn second_decision_conflicts_and_keeps_state() {
        let first = admin();
        let mut c = coin(5);
        c.decide(&first, Decision::Approve).unwrap();

        let err = c.decide(&admin(), Decision::Reject).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(c.status, LedgerStatus::Approved);
        assert_eq!(c.approved_by, Some(first.id()));
    }

    #[test]
    fn approved_coin_is_not_deletable() {
        let mut c = coin(1);
        assert!(c.ensure_deletable().is_ok());
        c.decide(&admin(), Decision::Approve).unwrap();
        assert!(matches!(c.ensure_deletable(), Err(AppError::Conflict(_))));

        let mut r = coin(1);
        r.decide(&admin(), Decision::Reject).unwrap();
        assert!(r.ensure_deletable().is_ok());
    }

    #[test]
    fn redemption_reject_refunds_cost_once() {
        let mut r = redemption();
        assert_eq!(r.decide(&admin(), Decision::Reject).unwrap(), 10);
        assert_eq!(r.status, LedgerStatus::Rejected);
        assert!(r.decide(&admin(), Decision::Reject).is_err());
    }

    #[test]
    fn redemption_approve_keeps_reservation() {
        let mut r = redemption();
        assert_eq!(r.decide(&admin(), Decision::Approve).unwrap(), 0);
        assert_eq!(r.status, LedgerStatus::Approved);
    }

    #[test]
    fn reserve_checks_balance() {
        assert_eq!(reserve(10, 10).unwrap(), 0);
        assert_eq!(reserve(12, 10).unwrap(), 2);
        match reserve(0, 10) {
            Err(AppError::InsufficientFunds { balance, cost }) => {
                assert_eq!(balance, 0);
                assert_eq!(cost, 10);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn credit_rejects_overflow() {
        assert_eq!(credit(5, 10).unwrap(), 15);
        assert!(matches!(credit(i32::MAX, 1), Err(AppError::Internal(_))));
    }

    #[test]
    fn status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&LedgerStatus::Pending).unwrap(),
            "\"PENDING\""
        );
    }
}
