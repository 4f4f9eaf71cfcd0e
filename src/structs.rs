use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::{errors::AppError, utils::slugify};

#[derive(Clone, FromRow)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Admin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Admin")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct Item {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub amount: i64,
    pub last_button_clicked: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// The read-back button an item was last announced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonNumber {
    One = 1,
    Two = 2,
    Three = 3,
}

impl ButtonNumber {
    pub fn get(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for ButtonNumber {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ButtonNumber::One),
            2 => Ok(ButtonNumber::Two),
            3 => Ok(ButtonNumber::Three),
            _ => Err(AppError::InvalidInput(
                "Invalid button number: must be 1, 2 or 3".into(),
            )),
        }
    }
}

/// A validated tenant ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantDraft {
    pub name: String,
    pub slug: String,
    pub description: String,
}

impl TenantDraft {
    pub fn new(name: &str, description: Option<&str>) -> Result<Self, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Tenant name is required".into()));
        }
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(AppError::InvalidInput(
                "Tenant name must contain at least one letter or digit".into(),
            ));
        }
        Ok(Self {
            name: name.to_owned(),
            slug,
            description: description.unwrap_or_default().to_owned(),
        })
    }
}

/// A validated item ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub amount: i64,
}

impl ItemDraft {
    pub fn new(name: &str, amount: i64) -> Result<Self, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid_item_payload());
        }
        Ok(Self {
            name: name.to_owned(),
            amount,
        })
    }
}

fn invalid_item_payload() -> AppError {
    AppError::InvalidInput(
        "Invalid payload: require name (string) and amount (integer)".into(),
    )
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AdminSummary {
    pub id: i64,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub admin: AdminSummary,
}

#[derive(Deserialize)]
pub struct CreateTenantRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CreateTenantRequest {
    pub fn into_draft(self) -> Result<TenantDraft, AppError> {
        TenantDraft::new(
            self.name.as_deref().unwrap_or_default(),
            self.description.as_deref(),
        )
    }
}

// Fields stay loosely typed so a wrong JSON type is reported as an invalid
// payload rather than a deserialization failure.
#[derive(Deserialize)]
pub struct AddItemRequest {
    pub name: Option<Value>,
    pub amount: Option<Value>,
}

impl AddItemRequest {
    pub fn into_draft(self) -> Result<ItemDraft, AppError> {
        let name = match self.name {
            Some(Value::String(name)) => name,
            _ => return Err(invalid_item_payload()),
        };
        let amount = self
            .amount
            .as_ref()
            .and_then(Value::as_i64)
            .ok_or_else(invalid_item_payload)?;
        ItemDraft::new(&name, amount)
    }
}

#[derive(Deserialize)]
pub struct ButtonClickRequest {
    #[serde(rename = "buttonNumber")]
    pub button_number: Option<Value>,
}

impl ButtonClickRequest {
    pub fn button(&self) -> Result<ButtonNumber, AppError> {
        self.button_number
            .as_ref()
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                AppError::InvalidInput("Invalid button number: must be 1, 2 or 3".into())
            })
            .and_then(ButtonNumber::try_from)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ButtonClickResponse {
    pub message: String,
    pub last_button_clicked: i64,
}
