use crate::core::{EmailMessage, SessionConfig};

/// SMTP通信のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("SMTP接続エラー: {0}")]
    Connect(String),

    #[error("メッセージ作成エラー: {0}")]
    Message(String),

    #[error("メール送信エラー: {0}")]
    Send(String),

    #[error("SMTPセッションが接続されていません")]
    NotConnected,
}

impl TransportError {
    /// トランスポートが報告したエラー理由
    pub fn reason(&self) -> String {
        match self {
            TransportError::Connect(reason)
            | TransportError::Message(reason)
            | TransportError::Send(reason) => reason.clone(),
            TransportError::NotConnected => "not connected".to_string(),
        }
    }
}

/// SMTPトランスポートのトレイト
///
/// このトレイトを実装することで、実際のSMTPクライアントと
/// テスト用(Mock)の実装を切り替えることができます。
pub trait MailTransport {
    /// セッション設定に従ってSMTPサーバーへ接続する
    fn connect(&mut self, session: &SessionConfig) -> Result<(), TransportError>;

    /// メッセージを送信し、完了するまでブロックする
    fn send(&mut self, message: &EmailMessage<'_>) -> Result<(), TransportError>;
}
