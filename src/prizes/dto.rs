use serde::Deserialize;
use uuid::Uuid;

use crate::prizes::repo_types::PrizePatch;

#[derive(Debug, Deserialize)]
pub struct CreatePrizeRequest {
    pub name: String,
    pub description: String,
    pub cost: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePrizeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cost: Option<i32>,
}

impl From<UpdatePrizeRequest> for PrizePatch {
    fn from(r: UpdatePrizeRequest) -> Self {
        Self {
            name: r.name,
            description: r.description,
            cost: r.cost,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRequest {
    pub user_id: Uuid,
    pub prize_id: Uuid,
}
