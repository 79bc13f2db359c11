use crate::storage::{
    read_string_or_empty, PreferenceStore, KEY_EMAIL_PASSWORD, KEY_EMAIL_RECIPIENT,
    KEY_EMAIL_SERVER, KEY_EMAIL_USERNAME, PREFS_NAMESPACE,
};
use log::warn;

/// メール送信に必要な認証情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailConfig {
    /// SMTPサーバーのホスト名
    pub server: String,
    /// ログインユーザー名
    pub username: String,
    /// ログインパスワード
    pub password: String,
    /// 送信先（送信元としても使用）
    pub recipient: String,
}

impl EmailConfig {
    pub fn new(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            username: username.into(),
            password: password.into(),
            recipient: recipient.into(),
        }
    }

    /// プリファレンスストアから読み込む
    ///
    /// セッションはこの関数内で開始・終了します。存在しないキーや
    /// ストアのエラーは空文字列として扱います。
    pub fn load<P: PreferenceStore>(store: &mut P) -> Self {
        // 初回起動で名前空間がまだ無い場合も作成して空として読む
        let session = match store.begin(PREFS_NAMESPACE, false) {
            Ok(session) => session,
            Err(e) => {
                warn!("{}", e);
                return Self::default();
            }
        };

        Self {
            recipient: read_string_or_empty(&session, KEY_EMAIL_RECIPIENT),
            username: read_string_or_empty(&session, KEY_EMAIL_USERNAME),
            password: read_string_or_empty(&session, KEY_EMAIL_PASSWORD),
            server: read_string_or_empty(&session, KEY_EMAIL_SERVER),
        }
    }

    /// プリファレンスのキーと値の組
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            (KEY_EMAIL_RECIPIENT, self.recipient.as_str()),
            (KEY_EMAIL_USERNAME, self.username.as_str()),
            (KEY_EMAIL_PASSWORD, self.password.as_str()),
            (KEY_EMAIL_SERVER, self.server.as_str()),
        ]
    }

    /// 空のままになっているキー
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.entries()
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(key, _)| *key)
            .collect()
    }

    /// 4項目すべてが設定されているか
    pub fn is_complete(&self) -> bool {
        self.entries().iter().all(|(_, value)| !value.is_empty())
    }
}
