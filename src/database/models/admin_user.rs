use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::database::dynamic::DynamicValue;
use crate::error::ApiError;
use crate::types::{text_field, Decodable, Encodable};

pub const COLLECTION: &str = "admin_users";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub session_id: String,
    /// Epoch millis
    pub created_at: i64,
}

impl AdminUser {
    pub fn new(name: String, username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            username,
            password_hash,
            session_id: Uuid::new_v4().to_string(),
            created_at: Utc::now().timestamp_millis(),
        }
    }

    /// Client-facing view without credentials or session state
    pub fn public_view(&self) -> Result<DynamicValue, ApiError> {
        Ok(DynamicValue::from_serializable(self, &["passwordHash", "sessionId"])?)
    }
}

impl Encodable for AdminUser {
    fn encode(&self) -> DynamicValue {
        DynamicValue::map()
            .with("_id", self.id.as_str())
            .with("name", self.name.as_str())
            .with("username", self.username.as_str())
            .with("passwordHash", self.password_hash.as_str())
            .with("sessionId", self.session_id.as_str())
            .with("createdAt", self.created_at)
    }
}

impl Decodable for AdminUser {
    fn decode(value: &DynamicValue) -> Result<Self, ApiError> {
        let id = text_field(value, "_id");
        if id.is_empty() {
            return Err(ApiError::malformed_payload("Admin record is missing its id"));
        }

        Ok(Self {
            id,
            name: text_field(value, "name"),
            username: text_field(value, "username"),
            // hashes are stored verbatim
            password_hash: value["passwordHash"].string_value(),
            session_id: text_field(value, "sessionId"),
            created_at: value["createdAt"].int_value(),
        })
    }
}
