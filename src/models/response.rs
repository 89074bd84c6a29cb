use crate::models::user::PublicUser;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generic success envelope shared by all CRUD endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Payload returned on successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginSuccess {
    pub success: bool,
    pub message: String,
    pub data: LoginData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginData {
    pub access_token: String,
    pub token_type: String,
    pub user: PublicUser,
}

impl LoginSuccess {
    pub fn new(access_token: String, user: PublicUser) -> Self {
        Self {
            success: true,
            message: "Login successful".to_string(),
            data: LoginData {
                access_token,
                token_type: "bearer".to_string(),
                user,
            },
        }
    }
}
