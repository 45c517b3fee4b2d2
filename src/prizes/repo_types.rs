use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ledger::LedgerStatus;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Prize {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub cost: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewPrize {
    pub name: String,
    pub description: String,
    pub cost: i32,
}

#[derive(Debug, Clone, Default)]
pub struct PrizePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cost: Option<i32>,
}

impl PrizePatch {
    pub fn apply(self, prize: &mut Prize) {
        if let Some(name) = self.name {
            prize.name = name;
        }
        if let Some(description) = self.description {
            prize.description = description;
        }
        if let Some(cost) = self.cost {
            prize.cost = cost;
        }
    }
}

/// A request to spend coins on a prize.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prize_id: Uuid,
    /// Coins debited when the redemption was requested.
    pub cost: i32,
    pub status: LedgerStatus,
    pub approved_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub redemption: Redemption,
    pub user_name: String,
    pub prize_name: String,
    pub prize_cost: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RedemptionFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<LedgerStatus>,
}

impl RedemptionFilter {
    pub fn matches(&self, r: &Redemption) -> bool {
        self.user_id.map_or(true, |id| r.user_id == id)
            && self.status.map_or(true, |s| r.status == s)
    }
}
