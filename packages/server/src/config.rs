//! Relay configuration.

use std::time::Duration;

use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),

    /// Pings must be sent before the peer's read deadline expires
    #[error("ping period ({ping_period:?}) must be shorter than pong wait ({pong_wait:?})")]
    PingNotBeforePongWait {
        ping_period: Duration,
        pong_wait: Duration,
    },
}

/// Keepalive and deadline settings of every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveConfig {
    /// Read deadline; reset by any inbound frame
    pub pong_wait: Duration,
    /// Interval between ping frames
    pub ping_period: Duration,
    /// Deadline of a single frame write
    pub write_wait: Duration,
}

impl KeepaliveConfig {
    /// Derive the ping period as 9/10 of `pong_wait`.
    pub fn from_pong_wait(pong_wait: Duration, write_wait: Duration) -> Self {
        Self {
            pong_wait,
            ping_period: pong_wait * 9 / 10,
            write_wait,
        }
    }
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self::from_pong_wait(Duration::from_secs(60), Duration::from_secs(10))
    }
}

/// Size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Largest accepted inbound frame, in bytes
    pub max_message_size: usize,
    /// Outbound mailbox capacity per connection
    pub mailbox_capacity: usize,
    /// Command queue capacity of the hub and of each room
    pub command_capacity: usize,
    /// Coalesce messages queued at wake time into one frame, separated by `\n`
    pub coalesce_frames: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_message_size: 10_000,
            mailbox_capacity: 256,
            command_capacity: 1024,
            coalesce_frames: true,
        }
    }
}

/// Top-level configuration of the relay server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub keepalive: KeepaliveConfig,
    pub limits: Limits,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            keepalive: KeepaliveConfig::default(),
            limits: Limits::default(),
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let keepalive = &self.keepalive;
        for (name, value) in [
            ("pong wait", keepalive.pong_wait),
            ("ping period", keepalive.ping_period),
            ("write wait", keepalive.write_wait),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration(name));
            }
        }
        if keepalive.ping_period >= keepalive.pong_wait {
            return Err(ConfigError::PingNotBeforePongWait {
                ping_period: keepalive.ping_period,
                pong_wait: keepalive.pong_wait,
            });
        }

        for (name, value) in [
            ("max message size", self.limits.max_message_size),
            ("mailbox capacity", self.limits.mailbox_capacity),
            ("command capacity", self.limits.command_capacity),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroLimit(name));
            }
        }
        Ok(())
    }

    /// `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        // テスト項目: デフォルト設定は妥当で、ping 間隔は pong 待ちの 9/10
        // given (前提条件):
        let config = RelayConfig::default();

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(config.keepalive.ping_period, Duration::from_secs(54));
        assert_eq!(config.limits.max_message_size, 10_000);
        assert!(config.limits.coalesce_frames);
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_ping_period_must_be_shorter_than_pong_wait() {
        // テスト項目: ping 間隔が pong 待ち以上の場合はエラーになる
        // given (前提条件):
        let mut config = RelayConfig::default();
        config.keepalive.ping_period = config.keepalive.pong_wait;

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(ConfigError::PingNotBeforePongWait { .. })
        ));
    }

    #[test]
    fn test_zero_values_are_rejected() {
        // テスト項目: 0 の時間・容量は拒否される
        // given (前提条件):
        let mut zero_write = RelayConfig::default();
        zero_write.keepalive.write_wait = Duration::ZERO;
        let mut zero_mailbox = RelayConfig::default();
        zero_mailbox.limits.mailbox_capacity = 0;

        // when (操作):
        let write_result = zero_write.validate();
        let mailbox_result = zero_mailbox.validate();

        // then (期待する結果):
        assert_eq!(write_result, Err(ConfigError::ZeroDuration("write wait")));
        assert_eq!(mailbox_result, Err(ConfigError::ZeroLimit("mailbox capacity")));
    }
}
