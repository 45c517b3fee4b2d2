use tracing::info;
use uuid::Uuid;

use crate::{
    auth::principal::Admin,
    error::{AppError, AppResult},
    ledger::{Decision, LedgerStatus},
    prizes::{
        dto::CreatePrizeRequest,
        repo_types::{NewPrize, Prize, PrizePatch, Redemption, RedemptionDetails, RedemptionFilter},
    },
    state::AppState,
};

fn prize_not_found(id: Uuid) -> AppError {
    AppError::not_found(format!("prize {} not found", id))
}

fn check_cost(cost: i32) -> AppResult<()> {
    if cost <= 0 {
        return Err(AppError::validation("cost must be a positive number"));
    }
    Ok(())
}

// ---- catalog ----

pub async fn create_prize(st: &AppState, req: CreatePrizeRequest) -> AppResult<Prize> {
    let name = req.name.trim().to_string();
    let description = req.description.trim().to_string();
    if name.is_empty() || description.is_empty() {
        return Err(AppError::validation("name and description are required"));
    }
    check_cost(req.cost)?;
    let prize = st
        .store
        .create_prize(NewPrize {
            name,
            description,
            cost: req.cost,
        })
        .await?;
    info!(prize_id = %prize.id, cost = prize.cost, "prize created");
    Ok(prize)
}

pub async fn list_prizes(st: &AppState) -> AppResult<Vec<Prize>> {
    st.store.list_prizes().await
}

pub async fn get_prize(st: &AppState, id: Uuid) -> AppResult<Prize> {
    st.store.find_prize(id).await?.ok_or_else(|| prize_not_found(id))
}

pub async fn update_prize(st: &AppState, id: Uuid, patch: PrizePatch) -> AppResult<Prize> {
    if let Some(cost) = patch.cost {
        check_cost(cost)?;
    }
    if matches!(&patch.name, Some(n) if n.trim().is_empty()) {
        return Err(AppError::validation("name cannot be empty"));
    }
    st.store
        .update_prize(id, patch)
        .await?
        .ok_or_else(|| prize_not_found(id))
}

pub async fn delete_prize(st: &AppState, id: Uuid) -> AppResult<()> {
    if !st.store.delete_prize(id).await? {
        return Err(prize_not_found(id));
    }
    info!(prize_id = %id, "prize deleted");
    Ok(())
}

// ---- redemptions ----

/// Debit the prize cost right away and open a PENDING redemption.
pub async fn request_redemption(st: &AppState, user_id: Uuid, prize_id: Uuid) -> AppResult<Redemption> {
    let redemption = st.store.reserve_redemption(user_id, prize_id).await?;
    info!(redemption_id = %redemption.id, %user_id, %prize_id, "prize redemption requested");
    Ok(redemption)
}

/// Coins were reserved at request time; approval only closes the request.
pub async fn approve_redemption(st: &AppState, id: Uuid, admin: &Admin) -> AppResult<Redemption> {
    let redemption = st.store.decide_redemption(id, admin, Decision::Approve).await?;
    info!(redemption_id = %id, admin_id = %admin.id(), "prize redemption approved");
    Ok(redemption)
}

/// Refund the reserved cost and close the request.
pub async fn reject_redemption(st: &AppState, id: Uuid, admin: &Admin) -> AppResult<Redemption> {
    let redemption = st.store.decide_redemption(id, admin, Decision::Reject).await?;
    info!(redemption_id = %id, admin_id = %admin.id(), "prize redemption rejected");
    Ok(redemption)
}

pub async fn list_pending_redemptions(st: &AppState) -> AppResult<Vec<RedemptionDetails>> {
    st.store
        .list_redemptions(RedemptionFilter {
            user_id: None,
            status: Some(LedgerStatus::Pending),
        })
        .await
}

pub async fn list_user_redemptions(st: &AppState, user_id: Uuid) -> AppResult<Vec<RedemptionDetails>> {
    st.store
        .list_redemptions(RedemptionFilter {
            user_id: Some(user_id),
            status: None,
        })
        .await
}

#[cfg(test)]
mod redemption_tests {
    use super::*;
    use crate::users::repo_types::{NewUser, Role, User, UserPatch};

    async fn user(st: &AppState, email: &str, role: Role, coins: i32) -> User {
        let u = st
            .store
            .create_user(NewUser {
                name: email.into(),
                email: email.into(),
                password_hash: String::new(),
                department: None,
                role,
            })
            .await
            .unwrap();
        st.store
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

    async fn prize(st: &AppState, name: &str, cost: i32) -> Prize {
        create_prize(
            st,
            CreatePrizeRequest {
                name: name.into(),
                description: "a prize".into(),
                cost,
            },
        )
        .await
        .unwrap()
    }

    async fn balance(st: &AppState, id: Uuid) -> i32 {
        st.store.find_user(id).await.unwrap().unwrap().coins
    }

    async fn admin(st: &AppState) -> Admin {
        Admin::from_user(&user(st, "boss@example.com", Role::Admin, 0).await).unwrap()
    }

    #[tokio::test]
    async fn insufficient_balance_is_rejected_untouched() {
        let st = AppState::fake();
        let u = user(&st, "u@example.com", Role::User, 0).await;
        let p = prize(&st, "mug", 10).await;

        let err = request_redemption(&st, u.id, p.id).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientFunds { balance: 0, cost: 10 }));
        assert_eq!(balance(&st, u.id).await, 0);
        assert!(list_user_redemptions(&st, u.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reserve_then_reject_restores_balance() {
        let st = AppState::fake();
        let u = user(&st, "u@example.com", Role::User, 10).await;
        let p = prize(&st, "mug", 10).await;
        let admin = admin(&st).await;

        let r = request_redemption(&st, u.id, p.id).await.unwrap();
        assert_eq!(r.status, LedgerStatus::Pending);
        assert_eq!(balance(&st, u.id).await, 0);

        let rejected = reject_redemption(&st, r.id, &admin).await.unwrap();
        assert_eq!(rejected.status, LedgerStatus::Rejected);
        assert_eq!(rejected.approved_by, Some(admin.id()));
        assert_eq!(balance(&st, u.id).await, 10);

        let err = reject_redemption(&st, r.id, &admin).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(balance(&st, u.id).await, 10);
    }

    #[tokio::test]
    async fn approve_keeps_reservation() {
        let st = AppState::fake();
        let u = user(&st, "u@example.com", Role::User, 15).await;
        let p = prize(&st, "mug", 10).await;
        let admin = admin(&st).await;

        let r = request_redemption(&st, u.id, p.id).await.unwrap();
        assert_eq!(balance(&st, u.id).await, 5);
        let approved = approve_redemption(&st, r.id, &admin).await.unwrap();
        assert_eq!(approved.status, LedgerStatus::Approved);
        assert_eq!(balance(&st, u.id).await, 5);

        assert!(matches!(
            reject_redemption(&st, r.id, &admin).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(balance(&st, u.id).await, 5);
    }

    #[tokio::test]
    async fn reject_refunds_reserved_cost_after_price_change() {
        let st = AppState::fake();
        let u = user(&st, "u@example.com", Role::User, 10).await;
        let p = prize(&st, "mug", 10).await;
        let admin = admin(&st).await;

        let r = request_redemption(&st, u.id, p.id).await.unwrap();
        assert_eq!(r.cost, 10);
        assert_eq!(balance(&st, u.id).await, 0);

        update_prize(
            &st,
            p.id,
            PrizePatch {
                cost: Some(1000),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let rejected = reject_redemption(&st, r.id, &admin).await.unwrap();
        assert_eq!(rejected.cost, 10);
        assert_eq!(balance(&st, u.id).await, 10);
    }

    #[tokio::test]
    async fn unknown_user_or_prize_is_not_found() {
        let st = AppState::fake();
        let u = user(&st, "u@example.com", Role::User, 50).await;
        let p = prize(&st, "mug", 10).await;
        let admin = admin(&st).await;

        assert!(matches!(
            request_redemption(&st, Uuid::new_v4(), p.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            request_redemption(&st, u.id, Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            approve_redemption(&st, Uuid::new_v4(), &admin).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(balance(&st, u.id).await, 50);
    }

    #[tokio::test]
    async fn listings_carry_prize_and_user_names() {
        let st = AppState::fake();
        let u = user(&st, "u@example.com", Role::User, 30).await;
        let mug = prize(&st, "mug", 10).await;
        let pen = prize(&st, "pen", 5).await;
        let admin = admin(&st).await;

        let first = request_redemption(&st, u.id, mug.id).await.unwrap();
        request_redemption(&st, u.id, pen.id).await.unwrap();
        approve_redemption(&st, first.id, &admin).await.unwrap();

        let pending = list_pending_redemptions(&st).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].prize_name, "pen");
        assert_eq!(pending[0].prize_cost, 5);
        assert_eq!(pending[0].user_name, "u@example.com");

        assert_eq!(list_user_redemptions(&st, u.id).await.unwrap().len(), 2);
        assert!(matches!(
            delete_prize(&st, mug.id).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn catalog_validation() {
        let st = AppState::fake();
        let err = create_prize(
            &st,
            CreatePrizeRequest {
                name: "free".into(),
                description: "zero cost".into(),
                cost: 0,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let p = prize(&st, "mug", 10).await;
        assert!(matches!(
            create_prize(
                &st,
                CreatePrizeRequest {
                    name: "mug".into(),
                    description: "again".into(),
                    cost: 3,
                },
            )
            .await,
            Err(AppError::Conflict(_))
        ));

        let updated = update_prize(
            &st,
            p.id,
            PrizePatch {
                cost: Some(12),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.cost, 12);
        assert_eq!(updated.name, "mug");
        assert_eq!(get_prize(&st, p.id).await.unwrap().cost, 12);
    }
}
