use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ledger::LedgerStatus;

/// One reward-grant request against a task.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CoinEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub amount: i32, // copied from task.reward at creation
    pub status: LedgerStatus,
    pub approved_by: Option<Uuid>,
    pub message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Pending entry joined with the requesting user.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PendingCoin {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub coin: CoinEntry,
    pub user_name: String,
    pub user_email: String,
    pub user_department: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCoin {
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub amount: i32,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoinFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<LedgerStatus>,
}

impl CoinFilter {
    pub fn matches(&self, coin: &CoinEntry) -> bool {
        self.user_id.map_or(true, |id| coin.user_id == id)
            && self.status.map_or(true, |s| coin.status == s)
    }
}
