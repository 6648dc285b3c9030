use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const PRODUCT_CREATED: &str = "Product created successfully!";
pub const PRODUCT_CREATE_FAILED: &str = "Failed to create product.";
pub const PRODUCT_UPDATE_FAILED: &str = "Failed to update product.";
pub const PRODUCTS_DELETED: &str = "Products deleted successfully!";
pub const PRODUCT_DELETE_FAILED: &str = "Failed to delete product.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient status message shown after a user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub issued_at: DateTime<Utc>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn field_updated(field: impl std::fmt::Display) -> Self {
        Self::success(format!("Updated {} successfully!", field))
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }

    /// Whether the notice should have hidden itself by `now`.
    pub fn is_expired(&self, auto_hide: Duration, now: DateTime<Utc>) -> bool {
        now - self.issued_at >= auto_hide
    }
}
