use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 用户认证会话
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    #[builder(into)]
    pub session_id: String,
    #[builder(into)]
    pub user_id: String,
    #[builder(into)]
    pub username: String,
    #[builder(into)]
    pub access_token: String,
    #[builder(into)]
    pub refresh_token: String,
    /// 访问令牌过期时间
    pub expires_at: DateTime<Utc>,
    /// 刷新令牌过期时间
    pub refresh_expiry: DateTime<Utc>,
    #[builder(into, default)]
    pub user_agent: String,
    #[builder(into, default)]
    pub ip_address: String,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_refresh_expired(&self) -> bool {
        self.is_refresh_expired_at(Utc::now())
    }

    pub fn is_refresh_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.refresh_expiry
    }
}
