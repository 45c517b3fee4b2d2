use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCoinRequest {
    pub user_id: Uuid,
    pub task_id: Uuid,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMessageRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGrantRequest {
    pub task_id: Uuid,
    pub user_ids: Vec<Uuid>,
    pub admin_id: Option<Uuid>,
}

#[cfg(test)]
mod dto_tests {
    use super::*;

    #[test]
    fn create_request_reads_camel_case() {
        let user_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();
        let body = format!(r#"{{"userId":"{}","taskId":"{}"}}"#, user_id, task_id);
        let req: CreateCoinRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(req.user_id, user_id);
        assert_eq!(req.task_id, task_id);
        assert!(req.message.is_none());
    }

    #[test]
    fn create_request_rejects_non_uuid_ids() {
        let body = r#"{"userId":12,"taskId":"x"}"#;
        assert!(serde_json::from_str::<CreateCoinRequest>(body).is_err());
    }
}
