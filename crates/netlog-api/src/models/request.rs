use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct AskRequest {
    pub upload_id: Uuid,
    pub question: String,
}
