use std::time::Duration;

use crate::core::EmailConfig;
use crate::hardware::camera::FrameSize;

/// アプリケーション設定
///
/// この構造体はビルド時に`cfg.toml`ファイルから読み込まれた設定を保持します。
/// メール関連の値は初回起動時にプリファレンスへ書き込むデフォルト値で、
/// 実行時はプリファレンス側の値が優先されます。
#[toml_cfg::toml_config]
pub struct Config {
    #[default("")]
    wifi_ssid: &'static str,

    #[default("")]
    wifi_password: &'static str,

    #[default("")]
    email_server: &'static str,

    #[default("")]
    email_username: &'static str,

    #[default("")]
    email_password: &'static str,

    #[default("")] // 空欄可
    email_recipient: &'static str,

    #[default(15)] // 写真を自動送信する間隔（分）
    email_period_minutes: u32,

    #[default(false)] // 撮影時にフラッシュLEDを点灯する
    flash_led: bool,

    #[default("SVGA")]
    frame_size: &'static str,
}

/// 設定エラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("WiFi SSIDが設定されていません")]
    MissingWifiSsid,
    #[error("email_period_minutes の値が無効です (1以上): {0}")]
    InvalidSendPeriod(u32),
    #[error("frame_size の値が無効です: {0}")]
    InvalidFrameSize(String),
}

/// アプリケーション設定を表す構造体
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// WiFi SSID
    pub wifi_ssid: String,

    /// WiFi パスワード（空の場合はオープンネットワーク）
    pub wifi_password: String,

    /// プリファレンスに書き込むメール設定のデフォルト値
    pub default_email: EmailConfig,

    /// 写真の送信間隔（分）
    pub email_period_minutes: u32,

    /// 撮影時にフラッシュLEDを点灯するか
    pub flash_led: bool,

    /// フレームサイズ
    pub frame_size: FrameSize,
}

impl AppConfig {
    /// 設定ファイルから設定をロードします
    pub fn load() -> Result<Self, ConfigError> {
        // toml_cfg によって生成された定数
        Self::from_config(&CONFIG)
    }

    fn from_config(config: &Config) -> Result<Self, ConfigError> {
        validate_wifi_ssid(config.wifi_ssid)?;
        let email_period_minutes = parse_send_period(config.email_period_minutes)?;
        let frame_size = parse_frame_size(config.frame_size)?;

        let default_email = EmailConfig::new(
            config.email_server,
            config.email_username,
            config.email_password,
            config.email_recipient,
        );

        Ok(AppConfig {
            wifi_ssid: config.wifi_ssid.to_string(),
            // Password can be empty for open networks, so no check for emptiness here.
            wifi_password: config.wifi_password.to_string(),
            default_email,
            email_period_minutes,
            flash_led: config.flash_led,
            frame_size,
        })
    }

    /// 送信間隔
    pub fn send_period(&self) -> Duration {
        Duration::from_secs(u64::from(self.email_period_minutes) * 60)
    }
}

pub fn validate_wifi_ssid(ssid: &str) -> Result<(), ConfigError> {
    if ssid.trim().is_empty() {
        Err(ConfigError::MissingWifiSsid)
    } else {
        Ok(())
    }
}

pub fn parse_send_period(minutes: u32) -> Result<u32, ConfigError> {
    if minutes == 0 {
        Err(ConfigError::InvalidSendPeriod(minutes))
    } else {
        Ok(minutes)
    }
}

pub fn parse_frame_size(value: &str) -> Result<FrameSize, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidFrameSize(value.to_string()))
}
