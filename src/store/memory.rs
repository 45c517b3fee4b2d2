use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::Store;
use crate::{
    auth::principal::Admin,
    coins::repo_types::{CoinEntry, CoinFilter, NewCoin, PendingCoin},
    error::{AppError, AppResult},
    ledger::{self, Decision, LedgerStatus},
    prizes::repo_types::{NewPrize, Prize, PrizePatch, Redemption, RedemptionDetails, RedemptionFilter},
    tasks::repo_types::{NewTask, Task, TaskPatch},
    users::repo_types::{NewUser, Role, User, UserPatch},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tasks: Vec<Task>,
    coins: Vec<CoinEntry>,
    prizes: Vec<Prize>,
    redemptions: Vec<Redemption>,
}

impl Tables {
    fn user_mut(&mut self, id: Uuid) -> AppResult<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found(format!("user {} not found", id)))
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// In-process tables behind one lock. Each trait call holds the lock for its
/// whole duration and validates before mutating, so calls are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn duplicate(field: &str) -> AppError {
    AppError::conflict(format!("duplicate value violates unique {}", field))
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        let mut t = self.tables.lock().await;
        if t.email_taken(&new.email, None) {
            return Err(duplicate("email"));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            department: new.department,
            role: new.role,
            coins: 0,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, role: Role) -> AppResult<Vec<User>> {
        let t = self.tables.lock().await;
        let mut users: Vec<User> = t.users.iter().filter(|u| u.role == role).cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<Option<User>> {
        let mut t = self.tables.lock().await;
        if let Some(email) = &patch.email {
            if t.email_taken(email, Some(id)) {
                return Err(duplicate("email"));
            }
        }
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        patch.apply(user);
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.tables.lock().await;
        if !t.users.iter().any(|u| u.id == id) {
            return Ok(false);
        }
        t.coins.retain(|c| c.user_id != id);
        t.redemptions.retain(|r| r.user_id != id);
        for c in t.coins.iter_mut().filter(|c| c.approved_by == Some(id)) {
            c.approved_by = None;
        }
        for r in t.redemptions.iter_mut().filter(|r| r.approved_by == Some(id)) {
            r.approved_by = None;
        }
        t.users.retain(|u| u.id != id);
        Ok(true)
    }

    async fn approved_coin_total(&self, user_id: Uuid) -> AppResult<i64> {
        let t = self.tables.lock().await;
        Ok(t.coins
            .iter()
            .filter(|c| c.user_id == user_id && c.status == LedgerStatus::Approved)
            .map(|c| i64::from(c.amount))
            .sum())
    }

    async fn create_task(&self, new: NewTask) -> AppResult<Task> {
        let mut t = self.tables.lock().await;
        if t.tasks.iter().any(|x| x.name == new.name) {
            return Err(duplicate("task name"));
        }
        let now = OffsetDateTime::now_utc();
        let task = Task {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            reward: new.reward,
            visibility: new.visibility,
            created_at: now,
            updated_at: now,
        };
        t.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> AppResult<Option<Task>> {
        let t = self.tables.lock().await;
        Ok(t.tasks.iter().find(|x| x.id == id).cloned())
    }

    async fn list_tasks(&self, visible_to: Option<Role>) -> AppResult<Vec<Task>> {
        let t = self.tables.lock().await;
        Ok(t.tasks
            .iter()
            .filter(|x| visible_to.map_or(true, |role| x.visibility.visible_to(role)))
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> AppResult<Option<Task>> {
        let mut t = self.tables.lock().await;
        if let Some(name) = &patch.name {
            if t.tasks.iter().any(|x| &x.name == name && x.id != id) {
                return Err(duplicate("task name"));
            }
        }
        let Some(task) = t.tasks.iter_mut().find(|x| x.id == id) else {
            return Ok(None);
        };
        patch.apply(task);
        task.updated_at = OffsetDateTime::now_utc();
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.tables.lock().await;
        if !t.tasks.iter().any(|x| x.id == id) {
            return Ok(false);
        }
        if t.coins.iter().any(|c| c.task_id == id) {
            return Err(AppError::conflict("record is still referenced by ledger entries"));
        }
        t.tasks.retain(|x| x.id != id);
        Ok(true)
    }

    async fn insert_coin(&self, new: NewCoin) -> AppResult<CoinEntry> {
        let mut t = self.tables.lock().await;
        let now = OffsetDateTime::now_utc();
        let coin = CoinEntry {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            task_id: new.task_id,
            amount: new.amount,
            status: LedgerStatus::Pending,
            approved_by: None,
            message: new.message,
            created_at: now,
            updated_at: now,
        };
        t.coins.push(coin.clone());
        Ok(coin)
    }

    async fn find_coin(&self, id: Uuid) -> AppResult<Option<CoinEntry>> {
        let t = self.tables.lock().await;
        Ok(t.coins.iter().find(|c| c.id == id).cloned())
    }

    async fn list_coins(&self, filter: CoinFilter) -> AppResult<Vec<CoinEntry>> {
        let t = self.tables.lock().await;
        Ok(t.coins.iter().rev().filter(|c| filter.matches(c)).cloned().collect())
    }

    async fn list_pending_coins(&self) -> AppResult<Vec<PendingCoin>> {
        let t = self.tables.lock().await;
        Ok(t.coins
            .iter()
            .filter(|c| c.status == LedgerStatus::Pending)
            .filter_map(|c| {
                let user = t.users.iter().find(|u| u.id == c.user_id)?;
                Some(PendingCoin {
                    coin: c.clone(),
                    user_name: user.name.clone(),
                    user_email: user.email.clone(),
                    user_department: user.department.clone(),
                })
            })
            .collect())
    }

    async fn update_coin_message(&self, id: Uuid, message: String) -> AppResult<Option<CoinEntry>> {
        let mut t = self.tables.lock().await;
        let Some(coin) = t.coins.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        coin.message = Some(message);
        coin.updated_at = OffsetDateTime::now_utc();
        Ok(Some(coin.clone()))
    }

    async fn decide_coin(&self, id: Uuid, admin: &Admin, decision: Decision) -> AppResult<CoinEntry> {
        let mut t = self.tables.lock().await;
        let idx = t
            .coins
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| AppError::not_found(format!("coin request {} not found", id)))?;
        let mut coin = t.coins[idx].clone();
        let credit = coin.decide(admin, decision)?;
        coin.updated_at = OffsetDateTime::now_utc();
        let user = t.user_mut(coin.user_id)?;
        user.coins = ledger::credit(user.coins, credit)?;
        t.coins[idx] = coin.clone();
        Ok(coin)
    }

    async fn delete_coin(&self, id: Uuid) -> AppResult<()> {
        let mut t = self.tables.lock().await;
        let coin = t
            .coins
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::not_found(format!("coin request {} not found", id)))?;
        coin.ensure_deletable()?;
        t.coins.retain(|c| c.id != id);
        Ok(())
    }

    async fn grant_coins(&self, task: &Task, user_ids: &[Uuid], admin: &Admin) -> AppResult<Vec<CoinEntry>> {
        let mut t = self.tables.lock().await;
        if !t.tasks.iter().any(|x| x.id == task.id) {
            return Err(AppError::not_found(format!("task {} not found", task.id)));
        }
        // resolve every id and new balance before writing anything
        let mut balances: Vec<(Uuid, i32)> = Vec::with_capacity(user_ids.len());
        for &user_id in user_ids {
            let current = match balances.iter().rev().find(|(id, _)| *id == user_id) {
                Some((_, b)) => *b,
                None => {
                    t.users
                        .iter()
                        .find(|u| u.id == user_id)
                        .ok_or_else(|| AppError::not_found(format!("user {} not found", user_id)))?
                        .coins
                }
            };
            balances.push((user_id, ledger::credit(current, task.reward)?));
        }
        let now = OffsetDateTime::now_utc();
        let mut granted = Vec::with_capacity(user_ids.len());
        for (user_id, balance) in balances {
            let coin = CoinEntry {
                id: Uuid::new_v4(),
                user_id,
                task_id: task.id,
                amount: task.reward,
                status: LedgerStatus::Approved,
                approved_by: Some(admin.id()),
                message: None,
                created_at: now,
                updated_at: now,
            };
            t.user_mut(user_id)?.coins = balance;
            t.coins.push(coin.clone());
            granted.push(coin);
        }
        Ok(granted)
    }

    async fn create_prize(&self, new: NewPrize) -> AppResult<Prize> {
        let mut t = self.tables.lock().await;
        if t.prizes.iter().any(|p| p.name == new.name) {
            return Err(duplicate("prize name"));
        }
        let now = OffsetDateTime::now_utc();
        let prize = Prize {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            cost: new.cost,
            created_at: now,
            updated_at: now,
        };
        t.prizes.push(prize.clone());
        Ok(prize)
    }

    async fn find_prize(&self, id: Uuid) -> AppResult<Option<Prize>> {
        let t = self.tables.lock().await;
        Ok(t.prizes.iter().find(|p| p.id == id).cloned())
    }

    async fn list_prizes(&self) -> AppResult<Vec<Prize>> {
        let t = self.tables.lock().await;
        let mut prizes = t.prizes.clone();
        prizes.sort_by(|a, b| a.cost.cmp(&b.cost).then_with(|| a.name.cmp(&b.name)));
        Ok(prizes)
    }

    async fn update_prize(&self, id: Uuid, patch: PrizePatch) -> AppResult<Option<Prize>> {
        let mut t = self.tables.lock().await;
        if let Some(name) = &patch.name {
            if t.prizes.iter().any(|p| &p.name == name && p.id != id) {
                return Err(duplicate("prize name"));
            }
        }
        let Some(prize) = t.prizes.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        patch.apply(prize);
        prize.updated_at = OffsetDateTime::now_utc();
        Ok(Some(prize.clone()))
    }

    async fn delete_prize(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.tables.lock().await;
        if !t.prizes.iter().any(|p| p.id == id) {
            return Ok(false);
        }
        if t.redemptions.iter().any(|r| r.prize_id == id) {
            return Err(AppError::conflict("record is still referenced by ledger entries"));
        }
        t.prizes.retain(|p| p.id != id);
        Ok(true)
    }

    async fn reserve_redemption(&self, user_id: Uuid, prize_id: Uuid) -> AppResult<Redemption> {
        let mut t = self.tables.lock().await;
        t.user_mut(user_id)?;
        let cost = t
            .prizes
            .iter()
            .find(|p| p.id == prize_id)
            .map(|p| p.cost)
            .ok_or_else(|| AppError::not_found(format!("prize {} not found", prize_id)))?;
        let user = t.user_mut(user_id)?;
        user.coins = ledger::reserve(user.coins, cost)?;
        let now = OffsetDateTime::now_utc();
        let redemption = Redemption {
            id: Uuid::new_v4(),
            user_id,
            prize_id,
            cost,
            status: LedgerStatus::Pending,
            approved_by: None,
            created_at: now,
            updated_at: now,
        };
        t.redemptions.push(redemption.clone());
        Ok(redemption)
    }

    async fn decide_redemption(&self, id: Uuid, admin: &Admin, decision: Decision) -> AppResult<Redemption> {
        let mut t = self.tables.lock().await;
        let idx = t
            .redemptions
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AppError::not_found(format!("prize redemption {} not found", id)))?;
        let mut redemption = t.redemptions[idx].clone();
        let refund = redemption.decide(admin, decision)?;
        redemption.updated_at = OffsetDateTime::now_utc();
        let user = t.user_mut(redemption.user_id)?;
        user.coins = ledger::credit(user.coins, refund)?;
        t.redemptions[idx] = redemption.clone();
        Ok(redemption)
    }

    async fn list_redemptions(&self, filter: RedemptionFilter) -> AppResult<Vec<RedemptionDetails>> {
        let t = self.tables.lock().await;
        Ok(t.redemptions
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .filter_map(|r| {
                let user = t.users.iter().find(|u| u.id == r.user_id)?;
                let prize = t.prizes.iter().find(|p| p.id == r.prize_id)?;
                Some(RedemptionDetails {
                    redemption: r.clone(),
                    user_name: user.name.clone(),
                    prize_name: prize.name.clone(),
                    prize_cost: prize.cost,
                })
            })
            .collect())
    }
}
