//! 配置加载（ConfigLoader）
//!
//! 默认值与环境变量合并（后者覆盖前者）：
//!
//! | 环境变量 | 配置项 | 默认值 |
//! |---|---|---|
//! | `DOMAIN_EVENT_PROVIDER_TYPE` | `events.provider_type` | `in-memory` |
//! | `DOMAIN_EVENT_BUFFER_SIZE` | `events.buffer_size` | `100` |
//! | `DOMAIN_EVENT_WORKERS` | `events.workers` | `8` |
//! | `LOGGER_TYPE` | `logging.kind` | `tracing` |
//! | `LOG_LEVEL` | `logging.level` | `INFO` |
//! | `SESSION_REFRESH_TTL_SECS` | `session.refresh_ttl_secs` | 30 天 |
//!
use crate::error::AppResult;
use chrono::{DateTime, TimeDelta, Utc};
use figment::Figment;
use figment::providers::{Env, Serialized};
use figment::value::{Uncased, UncasedStr};
use herald_domain::error::DomainError;
use herald_domain::eventing::InMemoryDispatcherConfig;
use herald_domain::logging::LogLevel;
use serde::{Deserialize, Serialize};

const DEFAULT_REFRESH_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    pub events: EventsConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
}

/// 事件分发器配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// 分发器实现类型，目前仅支持 `in-memory`
    pub provider_type: String,
    pub buffer_size: usize,
    pub workers: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        let dispatcher = InMemoryDispatcherConfig::default();
        Self {
            provider_type: "in-memory".to_string(),
            buffer_size: dispatcher.buffer_size,
            workers: dispatcher.workers,
        }
    }
}

impl EventsConfig {
    pub fn dispatcher(&self) -> InMemoryDispatcherConfig {
        InMemoryDispatcherConfig::new(self.buffer_size, self.workers)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志实现类型：`tracing` 或 `memory`
    pub kind: String,
    /// 日志级别名称，无法识别时按 INFO 处理
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            kind: "tracing".to_string(),
            level: LogLevel::Info.as_str().to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level(&self) -> LogLevel {
        LogLevel::parse_lenient(&self.level)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 刷新令牌有效期（秒）
    pub refresh_ttl_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
        }
    }
}

impl SessionConfig {
    pub fn refresh_ttl(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.refresh_ttl_secs)
            .unwrap_or_else(|| TimeDelta::seconds(DEFAULT_REFRESH_TTL_SECS))
    }

    /// 自 `from` 起的刷新过期时间，超出 `DateTime` 可表示范围时返回 `None`
    pub fn refresh_expiry_from(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        TimeDelta::try_seconds(self.refresh_ttl_secs)
            .and_then(|ttl| from.checked_add_signed(ttl))
    }
}

impl HeraldConfig {
    pub fn validate(&self) -> AppResult<()> {
        self.events.dispatcher().validate()?;
        if self.session.refresh_ttl_secs <= 0
            || self.session.refresh_expiry_from(Utc::now()).is_none()
        {
            return Err(DomainError::invalid_config(format!(
                "session refresh ttl out of range: {}",
                self.session.refresh_ttl_secs
            ))
            .into());
        }
        Ok(())
    }
}

/// 配置加载器
#[derive(Clone, Debug)]
pub struct ConfigLoader {
    figment: Figment,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::from_figment(Self::default_figment())
    }

    /// 使用自定义来源（测试或嵌入场景）
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn default_figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(HeraldConfig::default()))
            .merge(Env::prefixed("DOMAIN_EVENT_").map(events_key))
            .merge(
                Env::raw()
                    .only(&["LOGGER_TYPE"])
                    .map(|_| "logging.kind".into()),
            )
            .merge(
                Env::raw()
                    .only(&["LOG_LEVEL"])
                    .map(|_| "logging.level".into()),
            )
            .merge(
                Env::raw()
                    .only(&["SESSION_REFRESH_TTL_SECS"])
                    .map(|_| "session.refresh_ttl_secs".into()),
            )
    }

    pub fn figment(&self) -> &Figment {
        &self.figment
    }

    /// 抽取并校验配置
    pub fn load(&self) -> AppResult<HeraldConfig> {
        let config: HeraldConfig = self.figment.extract()?;
        config.validate()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }
}

// DOMAIN_EVENT_BUFFER_SIZE -> events.buffer_size
fn events_key(key: &UncasedStr) -> Uncased<'_> {
    let field = key.as_str().to_ascii_lowercase();
    format!("events.{field}").into()
}
