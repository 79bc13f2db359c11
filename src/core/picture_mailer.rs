use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

use log::{error, info, warn};

use super::{EmailConfig, EmailMessage, EncodedPayload, SessionConfig};
use crate::communication::{HostNameProvider, MailTransport};
use crate::hardware::camera::{Camera, Frame};
use crate::storage::PreferenceStore;

/// `send_picture` 1回分の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// 送信完了
    Sent { encoded_len: usize },
    /// 設定が揃っていないため何もしなかった
    IncompleteConfig { missing: Vec<&'static str> },
    /// 画像を取得できなかった
    NoFrame,
    /// SMTP接続に失敗した
    ConnectFailed(String),
    /// メール送信に失敗した
    SendFailed(String),
    /// 前回の送信がまだ実行中
    Busy,
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent { .. })
    }

    /// 撮影または送信の失敗
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SendOutcome::NoFrame | SendOutcome::ConnectFailed(_) | SendOutcome::SendFailed(_)
        )
    }
}

impl fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendOutcome::Sent { encoded_len } => write!(f, "sent ({} bytes)", encoded_len),
            SendOutcome::IncompleteConfig { missing } => {
                write!(f, "incomplete config (missing: {})", missing.join(", "))
            }
            SendOutcome::NoFrame => write!(f, "no image captured"),
            SendOutcome::ConnectFailed(reason) => write!(f, "connect failed: {}", reason),
            SendOutcome::SendFailed(reason) => write!(f, "send failed: {}", reason),
            SendOutcome::Busy => write!(f, "busy"),
        }
    }
}

/// 一度だけ読み込まれるメール設定とSMTPセッション設定
#[derive(Debug, Clone)]
struct LoadedConfig {
    email: EmailConfig,
    session: SessionConfig,
}

impl LoadedConfig {
    fn load<P: PreferenceStore>(prefs: &mut P) -> Self {
        info!("send_picture: 初期化中...");
        let email = EmailConfig::load(prefs);
        let session = SessionConfig::from_email_config(&email);
        Self { email, session }
    }
}

struct Inner<P, C, T, H> {
    prefs: P,
    camera: C,
    transport: T,
    host_name: H,
    /// `None` は未初期化
    loaded: Option<LoadedConfig>,
}

impl<P, C, T, H> Inner<P, C, T, H>
where
    P: PreferenceStore,
    C: Camera,
    T: MailTransport,
    H: HostNameProvider,
{
    fn ensure_initialized(&mut self) -> bool {
        if self.loaded.is_some() {
            return false;
        }
        self.loaded = Some(LoadedConfig::load(&mut self.prefs));
        true
    }

    fn send_picture(&mut self) -> SendOutcome {
        let Inner {
            prefs,
            camera,
            transport,
            host_name,
            loaded,
        } = self;
        let config = loaded.get_or_insert_with(|| LoadedConfig::load(prefs));

        if !config.email.is_complete() {
            return SendOutcome::IncompleteConfig {
                missing: config.email.missing_fields(),
            };
        }

        let payload = {
            let frame = match camera.capture() {
                Some(frame) => frame,
                None => {
                    warn!("send_picture: 画像を取得できませんでした");
                    return SendOutcome::NoFrame;
                }
            };
            info!(
                "send_picture: {} X {} の画像を送信します ({} bytes)",
                frame.width(),
                frame.height(),
                frame.len()
            );

            let payload = EncodedPayload::encode(frame.data());
            // エンコードが終わったらすぐにフレームバッファを返却する
            drop(frame);
            payload
        };
        info!("エンコード後の画像サイズ: {} bytes", payload.len());

        let message = EmailMessage::picture(&host_name.host_name(), &config.email.recipient, &payload);

        if let Err(e) = transport.connect(&config.session) {
            error!("SMTP接続に失敗しました: {}", e.reason());
            return SendOutcome::ConnectFailed(e.reason());
        }
        if let Err(e) = transport.send(&message) {
            error!("メール送信に失敗しました: {}", e.reason());
            return SendOutcome::SendFailed(e.reason());
        }

        info!("send_picture: 送信しました");
        SendOutcome::Sent {
            encoded_len: payload.len(),
        }
    }
}

/// 写真を撮影してメールで送る
///
/// 設定は最初の呼び出し時にプリファレンスから一度だけ読み込まれ、
/// `reset` を呼ぶまで再読み込みされません。送信中に重ねて呼ばれた場合は
/// 何もせずに `SendOutcome::Busy` を返します。
pub struct PictureMailer<P, C, T, H> {
    inner: Mutex<Inner<P, C, T, H>>,
}

impl<P, C, T, H> PictureMailer<P, C, T, H>
where
    P: PreferenceStore,
    C: Camera,
    T: MailTransport,
    H: HostNameProvider,
{
    pub fn new(prefs: P, camera: C, transport: T, host_name: H) -> Self {
        Self {
            inner: Mutex::new(Inner {
                prefs,
                camera,
                transport,
                host_name,
                loaded: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<P, C, T, H>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 未初期化であればプリファレンスから設定を読み込む
    ///
    /// この呼び出しで読み込みを行った場合に `true` を返します。
    pub fn ensure_initialized(&self) -> bool {
        self.lock().ensure_initialized()
    }

    /// 写真を1枚撮影してメール送信する
    pub fn send_picture(&self) -> SendOutcome {
        match self.inner.try_lock() {
            Ok(mut inner) => inner.send_picture(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().send_picture(),
            Err(TryLockError::WouldBlock) => {
                warn!("send_picture: 前回の送信が完了していないためスキップします");
                SendOutcome::Busy
            }
        }
    }

    /// 読み込み済みの設定を破棄し、次回の呼び出しで再読み込みさせる
    pub fn reset(&self) {
        self.lock().loaded = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().loaded.is_some()
    }

    pub fn email_config(&self) -> Option<EmailConfig> {
        self.lock().loaded.as_ref().map(|l| l.email.clone())
    }

    pub fn session_config(&self) -> Option<SessionConfig> {
        self.lock().loaded.as_ref().map(|l| l.session.clone())
    }
}
