use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::Store;
use crate::{
    auth::principal::Admin,
    coins::{
        self,
        repo_types::{CoinEntry, CoinFilter, NewCoin, PendingCoin},
    },
    config::AppConfig,
    error::{AppError, AppResult},
    ledger::{self, Decision},
    prizes::{
        self,
        repo_types::{NewPrize, Prize, PrizePatch, Redemption, RedemptionDetails, RedemptionFilter},
    },
    tasks::{
        self,
        repo_types::{NewTask, Task, TaskPatch},
    },
    users::{
        repo::{adjust_balance_tx, lock_user_tx},
        repo_types::{NewUser, Role, User, UserPatch},
    },
};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self::new(db))
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        User::create(&self.db, new).await
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        User::find_by_id(&self.db, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        User::find_by_email(&self.db, email).await
    }

    async fn list_users(&self, role: Role) -> AppResult<Vec<User>> {
        User::list_by_role(&self.db, role).await
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> AppResult<Option<User>> {
        User::update(&self.db, id, patch).await
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        User::delete_cascade(&self.db, id).await
    }

    async fn approved_coin_total(&self, user_id: Uuid) -> AppResult<i64> {
        User::approved_total(&self.db, user_id).await
    }

    async fn create_task(&self, new: NewTask) -> AppResult<Task> {
        tasks::repo::insert(&self.db, new).await
    }

    async fn find_task(&self, id: Uuid) -> AppResult<Option<Task>> {
        tasks::repo::find(&self.db, id).await
    }

    async fn list_tasks(&self, visible_to: Option<Role>) -> AppResult<Vec<Task>> {
        tasks::repo::list(&self.db, visible_to).await
    }

    async fn update_task(&self, id: Uuid, patch: TaskPatch) -> AppResult<Option<Task>> {
        tasks::repo::update(&self.db, id, patch).await
    }

    async fn delete_task(&self, id: Uuid) -> AppResult<bool> {
        tasks::repo::delete(&self.db, id).await
    }

    async fn insert_coin(&self, new: NewCoin) -> AppResult<CoinEntry> {
        coins::repo::insert(&self.db, new).await
    }

    async fn find_coin(&self, id: Uuid) -> AppResult<Option<CoinEntry>> {
        coins::repo::find(&self.db, id).await
    }

    async fn list_coins(&self, filter: CoinFilter) -> AppResult<Vec<CoinEntry>> {
        coins::repo::list(&self.db, filter).await
    }

    async fn list_pending_coins(&self) -> AppResult<Vec<PendingCoin>> {
        coins::repo::list_pending_with_user(&self.db).await
    }

    async fn update_coin_message(&self, id: Uuid, message: String) -> AppResult<Option<CoinEntry>> {
        coins::repo::update_message(&self.db, id, message).await
    }

    async fn decide_coin(&self, id: Uuid, admin: &Admin, decision: Decision) -> AppResult<CoinEntry> {
        let mut tx = self.db.begin().await?;
        let mut coin = coins::repo::lock_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("coin request {} not found", id)))?;
        let credit = coin.decide(admin, decision)?;
        let coin = coins::repo::write_decision_tx(&mut tx, &coin).await?;
        if credit != 0 {
            adjust_balance_tx(&mut tx, coin.user_id, credit).await?;
        }
        tx.commit().await?;
        debug!(coin_id = %id, credit, "coin decision committed");
        Ok(coin)
    }

    async fn delete_coin(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let coin = coins::repo::lock_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("coin request {} not found", id)))?;
        coin.ensure_deletable()?;
        coins::repo::delete_tx(&mut tx, id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn grant_coins(&self, task: &Task, user_ids: &[Uuid], admin: &Admin) -> AppResult<Vec<CoinEntry>> {
        let mut tx = self.db.begin().await?;
        let mut granted = Vec::with_capacity(user_ids.len());
        for &user_id in user_ids {
            // an unknown user aborts the batch; dropping tx rolls back earlier grants
            lock_user_tx(&mut tx, user_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("user {} not found", user_id)))?;
            let coin =
                coins::repo::insert_approved_tx(&mut tx, user_id, task.id, task.reward, admin.id())
                    .await?;
            adjust_balance_tx(&mut tx, user_id, task.reward).await?;
            granted.push(coin);
        }
        tx.commit().await?;
        Ok(granted)
    }

    async fn create_prize(&self, new: NewPrize) -> AppResult<Prize> {
        prizes::repo::insert_prize(&self.db, new).await
    }

    async fn find_prize(&self, id: Uuid) -> AppResult<Option<Prize>> {
        prizes::repo::find_prize(&self.db, id).await
    }

    async fn list_prizes(&self) -> AppResult<Vec<Prize>> {
        prizes::repo::list_prizes(&self.db).await
    }

    async fn update_prize(&self, id: Uuid, patch: PrizePatch) -> AppResult<Option<Prize>> {
        prizes::repo::update_prize(&self.db, id, patch).await
    }

    async fn delete_prize(&self, id: Uuid) -> AppResult<bool> {
        prizes::repo::delete_prize(&self.db, id).await
    }

    async fn reserve_redemption(&self, user_id: Uuid, prize_id: Uuid) -> AppResult<Redemption> {
        let mut tx = self.db.begin().await?;
        let user = lock_user_tx(&mut tx, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user {} not found", user_id)))?;
        let prize = prizes::repo::find_prize_tx(&mut tx, prize_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("prize {} not found", prize_id)))?;
        ledger::reserve(user.coins, prize.cost)?;
        adjust_balance_tx(&mut tx, user_id, -prize.cost).await?;
        let redemption = prizes::repo::insert_redemption_tx(&mut tx, user_id, prize_id, prize.cost).await?;
        tx.commit().await?;
        Ok(redemption)
    }

    async fn decide_redemption(&self, id: Uuid, admin: &Admin, decision: Decision) -> AppResult<Redemption> {
        let mut tx = self.db.begin().await?;
        let mut redemption = prizes::repo::lock_redemption_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("prize redemption {} not found", id)))?;
        let refund = redemption.decide(admin, decision)?;
        let redemption = prizes::repo::write_decision_tx(&mut tx, &redemption).await?;
        if refund != 0 {
            adjust_balance_tx(&mut tx, redemption.user_id, refund).await?;
        }
        tx.commit().await?;
        debug!(redemption_id = %id, refund, "redemption decision committed");
        Ok(redemption)
    }

    async fn list_redemptions(&self, filter: RedemptionFilter) -> AppResult<Vec<RedemptionDetails>> {
        prizes::repo::list_redemptions(&self.db, filter).await
    }
}

/// Runs against a real database: `DATABASE_URL=... cargo test -- --ignored`.
#[cfg(test)]
mod pg_store_tests {
    use super::*;
    use crate::{ledger::LedgerStatus, tasks::repo_types::Visibility};

    async fn user(store: &PgStore, email: &str, role: Role, coins: i32) -> User {
        let u = store
            .create_user(NewUser {
                name: email.into(),
                email: email.into(),
                password_hash: String::new(),
                department: None,
                role,
            })
            .await
            .unwrap();
        store
            .update_user(
                u.id,
                UserPatch {
                    coins: Some(coins),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap()
    }

    async fn task(store: &PgStore, reward: i32) -> Task {
        store
            .create_task(NewTask {
                name: "cleanup".into(),
                description: "clean the desk".into(),
                reward,
                visibility: Visibility::Both,
            })
            .await
            .unwrap()
    }

    async fn balance(store: &PgStore, id: Uuid) -> i32 {
        store.find_user(id).await.unwrap().unwrap().coins
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn coin_decision_credits_once(pool: PgPool) {
        let store = PgStore::new(pool);
        let u = user(&store, "u@example.com", Role::User, 0).await;
        let admin = Admin::from_user(&user(&store, "a@example.com", Role::Admin, 0).await).unwrap();
        let t = task(&store, 5).await;

        let coin = store
            .insert_coin(NewCoin {
                user_id: u.id,
                task_id: t.id,
                amount: t.reward,
                message: None,
            })
            .await
            .unwrap();
        let approved = store.decide_coin(coin.id, &admin, Decision::Approve).await.unwrap();
        assert_eq!(approved.status, LedgerStatus::Approved);
        assert!(matches!(
            store.decide_coin(coin.id, &admin, Decision::Reject).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(balance(&store, u.id).await, 5);
        assert!(matches!(store.delete_coin(coin.id).await, Err(AppError::Conflict(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn batch_grant_rolls_back_on_unknown_user(pool: PgPool) {
        let store = PgStore::new(pool);
        let u = user(&store, "u@example.com", Role::User, 0).await;
        let admin = Admin::from_user(&user(&store, "a@example.com", Role::Admin, 0).await).unwrap();
        let t = task(&store, 3).await;

        let err = store
            .grant_coins(&t, &[u.id, Uuid::new_v4()], &admin)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(balance(&store, u.id).await, 0);
        assert!(store.list_coins(CoinFilter::default()).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn redemption_refund_uses_reserved_cost(pool: PgPool) {
        let store = PgStore::new(pool);
        let u = user(&store, "u@example.com", Role::User, 10).await;
        let admin = Admin::from_user(&user(&store, "a@example.com", Role::Admin, 0).await).unwrap();
        let prize = store
            .create_prize(NewPrize {
                name: "mug".into(),
                description: "a mug".into(),
                cost: 10,
            })
            .await
            .unwrap();

        let r = store.reserve_redemption(u.id, prize.id).await.unwrap();
        assert_eq!(balance(&store, u.id).await, 0);
        assert!(matches!(
            store.reserve_redemption(u.id, prize.id).await,
            Err(AppError::InsufficientFunds { balance: 0, cost: 10 })
        ));

        store
            .update_prize(
                prize.id,
                PrizePatch {
                    cost: Some(1000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let rejected = store.decide_redemption(r.id, &admin, Decision::Reject).await.unwrap();
        assert_eq!(rejected.status, LedgerStatus::Rejected);
        assert_eq!(balance(&store, u.id).await, 10);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn delete_user_cascades_ledger_rows(pool: PgPool) {
        let store = PgStore::new(pool);
        let u = user(&store, "u@example.com", Role::User, 10).await;
        let t = task(&store, 5).await;
        let prize = store
            .create_prize(NewPrize {
                name: "pen".into(),
                description: "a pen".into(),
                cost: 5,
            })
            .await
            .unwrap();
        store
            .insert_coin(NewCoin {
                user_id: u.id,
                task_id: t.id,
                amount: t.reward,
                message: None,
            })
            .await
            .unwrap();
        store.reserve_redemption(u.id, prize.id).await.unwrap();

        assert!(matches!(store.delete_prize(prize.id).await, Err(AppError::Conflict(_))));
        assert!(store.delete_user(u.id).await.unwrap());
        assert!(store.find_user(u.id).await.unwrap().is_none());
        assert!(store.list_coins(CoinFilter::default()).await.unwrap().is_empty());
        assert!(store
            .list_redemptions(RedemptionFilter::default())
            .await
            .unwrap()
            .is_empty());
        assert!(store.delete_prize(prize.id).await.unwrap());
    }
}
