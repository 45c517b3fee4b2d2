//! Datastore seam. `PgStore` is the production backend, `MemoryStore` backs
//! `AppState::fake()` and the tests.
//!
//! Methods that move coins (`decide_coin`, `delete_coin`, `grant_coins`,
//! `reserve_redemption`, `decide_redemption`, `delete_user`) are atomic: they
//! either apply every write or none.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::principal::Admin,
    coins::repo_types::{CoinEntry, CoinFilter, NewCoin, PendingCoin},
    error::AppResult,
    ledger::Decision,
    prizes::repo_types::{NewPrize, Prize, PrizePatch, Redemption, RedemptionDetails, RedemptionFilter},
    tasks::repo_types::{NewTask, Task, TaskPatch},
    users::repo_types::{NewUser, Role, User, UserPatch},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    // ---- users ----
    async fn create_user(&self, new: NewUser) -> AppResult<User>;
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn list_users(&self, role: Role) -> AppResult<Vec<User>>;
    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<Option<User>>;
    /// Removes the user together with their coin entries and redemptions.
    async fn delete_user(&self, id: Uuid) -> AppResult<bool>;
    async fn approved_coin_total(&self, user_id: Uuid) -> AppResult<i64>;

    // ---- tasks ----
    async fn create_task(&self, new: NewTask) -> AppResult<Task>;
    async fn find_task(&self, id: Uuid) -> AppResult<Option<Task>>;
    /// `None` lists every task; `Some(role)` lists AMBOS tasks plus the role's own.
    async fn list_tasks(&self, visible_to: Option<Role>) -> AppResult<Vec<Task>>;
    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> AppResult<Option<Task>>;
    async fn delete_task(&self, id: Uuid) -> AppResult<bool>;

    // ---- coin ledger ----
    async fn insert_coin(&self, new: NewCoin) -> AppResult<CoinEntry>;
    async fn find_coin(&self, id: Uuid) -> AppResult<Option<CoinEntry>>;
    async fn list_coins(&self, filter: CoinFilter) -> AppResult<Vec<CoinEntry>>;
    async fn list_pending_coins(&self) -> AppResult<Vec<PendingCoin>>;
    async fn update_coin_message(&self, id: Uuid, message: String) -> AppResult<Option<CoinEntry>>;
    async fn decide_coin(&self, id: Uuid, admin: &Admin, decision: Decision) -> AppResult<CoinEntry>;
    async fn delete_coin(&self, id: Uuid) -> AppResult<()>;
    /// Creates one APPROVED entry per user and credits each balance.
    async fn grant_coins(&self, task: &Task, user_ids: &[Uuid], admin: &Admin) -> AppResult<Vec<CoinEntry>>;

    // ---- prizes ----
    async fn create_prize(&self, new: NewPrize) -> AppResult<Prize>;
    async fn find_prize(&self, id: Uuid) -> AppResult<Option<Prize>>;
    async fn list_prizes(&self) -> AppResult<Vec<Prize>>;
    async fn update_prize(&self, id: Uuid, patch: PrizePatch) -> AppResult<Option<Prize>>;
    async fn delete_prize(&self, id: Uuid) -> AppResult<bool>;

    // ---- redemption ledger ----
    /// Debits the prize cost and records a PENDING redemption.
    async fn reserve_redemption(&self, user_id: Uuid, prize_id: Uuid) -> AppResult<Redemption>;
    async fn decide_redemption(&self, id: Uuid, admin: &Admin, decision: Decision) -> AppResult<Redemption>;
    async fn list_redemptions(&self, filter: RedemptionFilter) -> AppResult<Vec<RedemptionDetails>>;
}
