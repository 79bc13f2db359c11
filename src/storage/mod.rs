/// 永続化設定（プリファレンス）モジュール
#[cfg(feature = "esp")]
pub mod nvs;

#[cfg(feature = "esp")]
pub use nvs::EspNvsPreferences;

use log::{info, warn};

use crate::core::EmailConfig;

/// メール設定を保存するプリファレンスの名前空間
pub const PREFS_NAMESPACE: &str = "camera-prefs";

/// 送信先メールアドレス
pub const KEY_EMAIL_RECIPIENT: &str = "email_recipient";
/// メール送信に使うユーザー名
pub const KEY_EMAIL_USERNAME: &str = "email_username";
/// メール送信ユーザーのパスワード
pub const KEY_EMAIL_PASSWORD: &str = "email_password";
/// メール送信に使うSMTPサーバー
pub const KEY_EMAIL_SERVER: &str = "email_server";

/// プリファレンス操作のエラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreferenceError {
    #[error("プリファレンスを開けませんでした ({namespace}): {reason}")]
    Open { namespace: String, reason: String },

    #[error("プリファレンスの読み込みに失敗しました ({key}): {reason}")]
    Read { key: String, reason: String },

    #[error("プリファレンスの書き込みに失敗しました ({key}): {reason}")]
    Write { key: String, reason: String },
}

/// 名前空間単位で開かれたプリファレンスのセッション
///
/// セッションはDropされた時点で閉じられます。
pub trait PreferenceSession {
    /// 文字列値を読み込む。キーが存在しない場合は `Ok(None)`
    fn get_string(&self, key: &str) -> Result<Option<String>, PreferenceError>;

    /// 文字列値を書き込む
    fn put_string(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// 永続キーバリューストアのトレイト
///
/// このトレイトを実装することで、実機用(NVS)とテスト用(Mock)の
/// 実装を切り替えることができます。
pub trait PreferenceStore {
    type Session: PreferenceSession;

    /// 名前空間を指定してセッションを開始する
    fn begin(&mut self, namespace: &str, read_only: bool) -> Result<Self::Session, PreferenceError>;
}

/// 文字列値を読み込み、存在しない場合や読み込みエラーの場合は空文字列を返す
pub fn read_string_or_empty<S: PreferenceSession>(session: &S, key: &str) -> String {
    match session.get_string(key) {
        Ok(Some(value)) => value,
        Ok(None) => String::new(),
        Err(e) => {
            warn!("{}", e);
            String::new()
        }
    }
}

/// 未設定のキーにだけビルド時のデフォルト値を書き込む
///
/// 既に保存されている値は上書きしません。空のデフォルト値は書き込みません。
/// 書き込んだキーの数を返します。
pub fn seed_defaults<P: PreferenceStore>(
    store: &mut P,
    defaults: &EmailConfig,
) -> Result<usize, PreferenceError> {
    let mut session = store.begin(PREFS_NAMESPACE, false)?;
    let mut written = 0;

    for (key, value) in defaults.entries() {
        if value.is_empty() {
            continue;
        }
        if session.get_string(key)?.is_none() {
            session.put_string(key, value)?;
            info!("プリファレンスにデフォルト値を設定しました: {}", key);
            written += 1;
        }
    }

    Ok(written)
}
