use chrono::FixedOffset;

use super::EmailConfig;

/// SMTPサブミッションポート
pub const SMTP_PORT: u16 = 587;

/// NTPサーバー（カンマ区切り）
pub const DEFAULT_NTP_SERVERS: &str = "pool.ntp.org,time.nist.gov";

/// GMTからのオフセット（時間）
pub const DEFAULT_GMT_OFFSET_HOURS: i32 = 7;

/// 夏時間オフセット（時間）
pub const DEFAULT_DAYLIGHT_OFFSET_HOURS: i32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host_name: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginConfig {
    pub email: String,
    pub password: String,
    /// EHLOで名乗るドメイン
    pub user_domain: String,
}

/// 時刻同期の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeConfig {
    pub ntp_server: String,
    pub gmt_offset_hours: i32,
    pub daylight_offset_hours: i32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            ntp_server: DEFAULT_NTP_SERVERS.to_string(),
            gmt_offset_hours: DEFAULT_GMT_OFFSET_HOURS,
            daylight_offset_hours: DEFAULT_DAYLIGHT_OFFSET_HOURS,
        }
    }
}

impl TimeConfig {
    /// NTPサーバーの一覧
    pub fn ntp_servers(&self) -> impl Iterator<Item = &str> {
        self.ntp_server
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// ローカル時刻のUTCオフセット。範囲外の場合は `None`
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        let hours = self.gmt_offset_hours.checked_add(self.daylight_offset_hours)?;
        FixedOffset::east_opt(hours.checked_mul(3600)?)
    }
}

/// SMTPセッション設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub server: ServerConfig,
    pub login: LoginConfig,
    pub time: TimeConfig,
}

impl SessionConfig {
    pub fn from_email_config(email: &EmailConfig) -> Self {
        Self {
            server: ServerConfig {
                host_name: email.server.clone(),
                port: SMTP_PORT,
            },
            login: LoginConfig {
                email: email.username.clone(),
                password: email.password.clone(),
                user_domain: email.server.clone(),
            },
            time: TimeConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_email_config() {
        let email = EmailConfig::new("smtp.example.com", "user", "secret", "me@example.com");
        let session = SessionConfig::from_email_config(&email);

        assert_eq!(session.server.host_name, "smtp.example.com");
        assert_eq!(session.server.port, 587);
        assert_eq!(session.login.email, "user");
        assert_eq!(session.login.password, "secret");
        assert_eq!(session.login.user_domain, "smtp.example.com");
    }

    #[test]
    fn test_ntp_servers_split() {
        let time = TimeConfig::default();
        let servers: Vec<&str> = time.ntp_servers().collect();
        assert_eq!(servers, vec!["pool.ntp.org", "time.nist.gov"]);
    }

    #[test]
    fn test_utc_offset() {
        let time = TimeConfig::default();
        assert_eq!(time.utc_offset(), FixedOffset::east_opt(7 * 3600));

        let out_of_range = TimeConfig {
            gmt_offset_hours: 30,
            ..TimeConfig::default()
        };
        assert!(out_of_range.utc_offset().is_none());
    }
}
