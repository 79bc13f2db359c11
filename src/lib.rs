/*!
 * # Picture Mailer Library
 *
 * ESP32カメラ画像を撮影し、base64エンコードしてSMTPでメール送信するためのライブラリ
 *
 * ## モジュール構成
 * - `core`: アプリケーションの核となる機能（メール設定、セッション、メッセージ、送信制御）
 * - `hardware`: ハードウェア制御（カメラ、LED）
 * - `communication`: 通信機能（SMTP、ホスト名、WiFi、時刻同期）
 * - `storage`: 永続化された設定（NVSプリファレンス）
 * - `config`: ビルド時設定（cfg.toml）
 */

// 公開モジュール
pub mod communication;
pub mod config;
pub mod core;
pub mod hardware;
pub mod storage;

// Mock実装（テストとnon-espビルドで使用可能）
#[cfg(not(feature = "esp"))]
pub mod mock;

// 内部で使用する型をまとめてエクスポート
pub use communication::{HostNameProvider, LettreTransport, MailTransport, StaticHostName, TransportError};
pub use config::{AppConfig, ConfigError};
pub use core::{EmailConfig, EmailMessage, EncodedPayload, PictureMailer, SendOutcome, SessionConfig};
pub use hardware::camera::{Camera, Frame, FrameSize};
pub use storage::{PreferenceError, PreferenceSession, PreferenceStore};

/// ライブラリのバージョン情報
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
