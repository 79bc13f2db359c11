//! テスト用のMock実装
//!
//! 実際のハードウェアやネットワークを使わずに、カメラ・プリファレンス・
//! SMTPの各コラボレーターをシミュレートします。呼び出し回数と送信内容を
//! 記録し、テストで検証できます。

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::communication::{MailTransport, TransportError};
use crate::core::{EmailConfig, EmailMessage, SessionConfig, TransferEncoding};
use crate::hardware::camera::{Camera, Frame};
use crate::storage::{PreferenceError, PreferenceSession, PreferenceStore, PREFS_NAMESPACE};

type Namespaces = HashMap<String, HashMap<String, String>>;

/// メモリ上のプリファレンスストア
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    data: Arc<Mutex<Namespaces>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    fail_open: Arc<Mutex<bool>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// `camera-prefs` に4項目を設定した状態で作成
    pub fn with_email_config(config: &EmailConfig) -> Self {
        let prefs = Self::new();
        for (key, value) in config.entries() {
            prefs.set(PREFS_NAMESPACE, key, value);
        }
        prefs
    }

    /// テスト用: 値を直接設定
    pub fn set(&self, namespace: &str, key: &str, value: &str) {
        self.data
            .lock()
            .unwrap()
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    /// テスト用: 値を直接取得
    pub fn get(&self, namespace: &str, key: &str) -> Option<String> {
        self.data
            .lock()
            .unwrap()
            .get(namespace)
            .and_then(|ns| ns.get(key).cloned())
    }

    /// 名前空間が作成済みか
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.data.lock().unwrap().contains_key(namespace)
    }

    /// 開始されたセッション数
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// 終了したセッション数
    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// テスト用: セッション開始エラーをシミュレート
    pub fn set_open_error(&self, enable: bool) {
        *self.fail_open.lock().unwrap() = enable;
    }
}

impl PreferenceStore for MemoryPreferences {
    type Session = MemorySession;

    fn begin(&mut self, namespace: &str, read_only: bool) -> Result<MemorySession, PreferenceError> {
        if *self.fail_open.lock().unwrap() {
            return Err(PreferenceError::Open {
                namespace: namespace.to_string(),
                reason: "Simulated open error".to_string(),
            });
        }

        // NVSと同様に、読み込み専用では未作成の名前空間を開けない
        {
            let mut data = self.data.lock().unwrap();
            if read_only && !data.contains_key(namespace) {
                return Err(PreferenceError::Open {
                    namespace: namespace.to_string(),
                    reason: "ESP_ERR_NVS_NOT_FOUND".to_string(),
                });
            }
            data.entry(namespace.to_string()).or_default();
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MemorySession {
            data: Arc::clone(&self.data),
            closed: Arc::clone(&self.closed),
            namespace: namespace.to_string(),
            read_only,
        })
    }
}

/// `MemoryPreferences` のセッション。Dropで終了がカウントされる
#[derive(Debug)]
pub struct MemorySession {
    data: Arc<Mutex<Namespaces>>,
    closed: Arc<AtomicUsize>,
    namespace: String,
    read_only: bool,
}

impl PreferenceSession for MemorySession {
    fn get_string(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .get(&self.namespace)
            .and_then(|ns| ns.get(key).cloned()))
    }

    fn put_string(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        if self.read_only {
            return Err(PreferenceError::Write {
                key: key.to_string(),
                reason: "read-only session".to_string(),
            });
        }
        self.data
            .lock()
            .unwrap()
            .entry(self.namespace.clone())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
struct QueuedFrame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

/// テスト用のカメラ
///
/// キューに積まれたフレームを先頭から返し、キューが空の場合は `None` を返します。
#[derive(Debug, Clone, Default)]
pub struct MockCamera {
    frames: Arc<Mutex<VecDeque<QueuedFrame>>>,
    captures: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト用: 次に返すフレームを追加
    pub fn queue_frame(&self, width: usize, height: usize, data: Vec<u8>) {
        self.frames
            .lock()
            .unwrap()
            .push_back(QueuedFrame { width, height, data });
    }

    /// `capture` が呼ばれた回数
    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    /// 返却されたフレーム数
    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl Camera for MockCamera {
    type Frame = MockFrame;

    fn capture(&mut self) -> Option<MockFrame> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        let frame = self.frames.lock().unwrap().pop_front()?;
        Some(MockFrame {
            frame,
            released: Arc::clone(&self.released),
        })
    }
}

/// `MockCamera` のフレーム。Dropで返却がカウントされる
#[derive(Debug)]
pub struct MockFrame {
    frame: QueuedFrame,
    released: Arc<AtomicUsize>,
}

impl Frame for MockFrame {
    fn width(&self) -> usize {
        self.frame.width
    }

    fn height(&self) -> usize {
        self.frame.height
    }

    fn data(&self) -> &[u8] {
        &self.frame.data
    }
}

impl Drop for MockFrame {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// 送信された添付ファイルの記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentAttachment {
    pub filename: String,
    pub mime: String,
    pub transfer_encoding: TransferEncoding,
    pub content_encoding: TransferEncoding,
    pub data: Vec<u8>,
}

/// 送信されたメールの記録
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub sender_name: String,
    pub sender_email: String,
    pub subject: String,
    pub recipients: Vec<String>,
    pub text: String,
    pub text_encoding: TransferEncoding,
    pub attachments: Vec<SentAttachment>,
}

impl From<&EmailMessage<'_>> for SentMail {
    fn from(message: &EmailMessage<'_>) -> Self {
        Self {
            sender_name: message.sender.name.clone(),
            sender_email: message.sender.email.clone(),
            subject: message.subject.clone(),
            recipients: message.recipients.iter().map(|r| r.email.clone()).collect(),
            text: message.text.clone(),
            text_encoding: message.text_encoding,
            attachments: message
                .attachments
                .iter()
                .map(|a| SentAttachment {
                    filename: a.filename.clone(),
                    mime: a.mime.clone(),
                    transfer_encoding: a.transfer_encoding,
                    content_encoding: a.content_encoding,
                    data: a.data.to_vec(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
struct TransportState {
    sessions: Vec<SessionConfig>,
    send_calls: usize,
    sent: Vec<SentMail>,
    connect_error: Option<String>,
    send_error: Option<String>,
    gate: Option<(Sender<()>, Receiver<()>)>,
}

/// テスト用のSMTPトランスポート
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<TransportState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト用: 接続エラーをシミュレート
    pub fn set_connect_error(&self, reason: Option<&str>) {
        self.state.lock().unwrap().connect_error = reason.map(str::to_string);
    }

    /// テスト用: 送信エラーをシミュレート
    pub fn set_send_error(&self, reason: Option<&str>) {
        self.state.lock().unwrap().send_error = reason.map(str::to_string);
    }

    /// テスト用: 次の `send` を呼び出し側が解放するまでブロックさせる
    ///
    /// 戻り値は (送信開始の通知, 送信の解放) のチャネルです。
    pub fn block_next_send(&self) -> (Receiver<()>, Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        self.state.lock().unwrap().gate = Some((started_tx, release_rx));
        (started_rx, release_tx)
    }

    pub fn connect_count(&self) -> usize {
        self.state.lock().unwrap().sessions.len()
    }

    pub fn send_count(&self) -> usize {
        self.state.lock().unwrap().send_calls
    }

    /// 最後に接続したセッション設定
    pub fn last_session(&self) -> Option<SessionConfig> {
        self.state.lock().unwrap().sessions.last().cloned()
    }

    /// 送信に成功したメール
    pub fn sent_mails(&self) -> Vec<SentMail> {
        self.state.lock().unwrap().sent.clone()
    }
}

impl MailTransport for MockTransport {
    fn connect(&mut self, session: &SessionConfig) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.sessions.push(session.clone());
        match &state.connect_error {
            Some(reason) => Err(TransportError::Connect(reason.clone())),
            None => Ok(()),
        }
    }

    fn send(&mut self, message: &EmailMessage<'_>) -> Result<(), TransportError> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.send_calls += 1;
            state.gate.take()
        };
        if let Some((started, release)) = gate {
            let _ = started.send(());
            let _ = release.recv();
        }

        let mut state = self.state.lock().unwrap();
        if let Some(reason) = &state.send_error {
            return Err(TransportError::Send(reason.clone()));
        }
        state.sent.push(SentMail::from(message));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_camera_empty_queue() {
        let mut camera = MockCamera::new();
        assert!(camera.capture().is_none());
        assert_eq!(camera.capture_count(), 1);
        assert_eq!(camera.release_count(), 0);
    }

    #[test]
    fn test_mock_frame_released_on_drop() {
        let mut camera = MockCamera::new();
        camera.queue_frame(2, 2, vec![1, 2, 3, 4]);

        let frame = camera.capture().unwrap();
        assert_eq!(frame.len(), 4);
        assert_eq!(camera.release_count(), 0);
        drop(frame);
        assert_eq!(camera.release_count(), 1);
    }

    #[test]
    fn test_memory_session_counts() {
        let mut prefs = MemoryPreferences::new();
        prefs.set(PREFS_NAMESPACE, "email_server", "smtp.example.com");
        {
            let session = prefs.begin(PREFS_NAMESPACE, true).unwrap();
            assert_eq!(
                session.get_string("email_server").unwrap(),
                Some("smtp.example.com".to_string())
            );
            assert_eq!(session.get_string("email_password").unwrap(), None);
            assert_eq!(prefs.close_count(), 0);
        }
        assert_eq!(prefs.open_count(), 1);
        assert_eq!(prefs.close_count(), 1);
    }

    #[test]
    fn test_read_only_open_of_missing_namespace() {
        let mut prefs = MemoryPreferences::new();
        assert!(matches!(
            prefs.begin(PREFS_NAMESPACE, true),
            Err(PreferenceError::Open { .. })
        ));
        assert!(!prefs.has_namespace(PREFS_NAMESPACE));

        assert!(prefs.begin(PREFS_NAMESPACE, false).is_ok());
        assert!(prefs.has_namespace(PREFS_NAMESPACE));
    }

    #[test]
    fn test_read_only_session_rejects_write() {
        let mut prefs = MemoryPreferences::new();
        prefs.set(PREFS_NAMESPACE, "email_server", "smtp.example.com");
        let mut session = prefs.begin(PREFS_NAMESPACE, true).unwrap();
        assert!(matches!(
            session.put_string("email_server", "smtp.example.com"),
            Err(PreferenceError::Write { .. })
        ));
    }
}
