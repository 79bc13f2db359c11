use std::time::Duration;

use chrono::Utc;
use lettre::message::header::{ContentDisposition, ContentTransferEncoding, ContentType};
use lettre::message::{Body, Mailbox as LettreMailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::extension::ClientId;
use lettre::transport::smtp::PoolConfig;
use lettre::{Address, Message, SmtpTransport, Transport};
use log::{debug, info};

use super::smtp::{MailTransport, TransportError};
use crate::core::encoding::wrap_mime_lines;
use crate::core::message::{Attachment, Mailbox, TransferEncoding};
use crate::core::{EmailMessage, SessionConfig, TimeConfig};

/// SMTP通信のタイムアウト
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// 接続確認から送信までSMTPセッションを保持する時間
const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// 1本の接続だけを保持するプール設定
///
/// `connect` で確立した接続を `send` がそのまま使う。
fn single_session_pool() -> PoolConfig {
    PoolConfig::new()
        .min_idle(0)
        .max_size(1)
        .idle_timeout(SESSION_IDLE_TIMEOUT)
}

/// lettre のブロッキングSMTPクライアントを使うトランスポート
///
/// `connect` でSTARTTLSリレーを組み立ててセッション (TLS + 認証) を確立し、
/// `send` はそのセッション上でメッセージを送信してから閉じます。
pub struct LettreTransport {
    timeout: Duration,
    transport: Option<SmtpTransport>,
    time: TimeConfig,
}

impl Default for LettreTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LettreTransport {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            transport: None,
            time: TimeConfig::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    fn relay(&self, session: &SessionConfig) -> Result<SmtpTransport, TransportError> {
        Ok(SmtpTransport::starttls_relay(&session.server.host_name)
            .map_err(|e| TransportError::Connect(e.to_string()))?
            .port(session.server.port)
            .credentials(Credentials::new(
                session.login.email.clone(),
                session.login.password.clone(),
            ))
            .hello_name(ClientId::Domain(session.login.user_domain.clone()))
            .timeout(Some(self.timeout))
            .pool_config(single_session_pool())
            .build())
    }

    /// セッションを確立し、プールに保持する
    fn open(&mut self, transport: SmtpTransport, session: &SessionConfig) -> Result<(), TransportError> {
        match transport.test_connection() {
            Ok(true) => {
                debug!(
                    "SMTPサーバーに接続しました: {}:{}",
                    session.server.host_name, session.server.port
                );
                self.transport = Some(transport);
                self.time = session.time.clone();
                Ok(())
            }
            Ok(false) => Err(TransportError::Connect(
                "server did not accept the connection".to_string(),
            )),
            Err(e) => Err(TransportError::Connect(e.to_string())),
        }
    }
}

impl MailTransport for LettreTransport {
    fn connect(&mut self, session: &SessionConfig) -> Result<(), TransportError> {
        self.transport = None;
        let transport = self.relay(session)?;
        self.open(transport, session)
    }

    fn send(&mut self, message: &EmailMessage<'_>) -> Result<(), TransportError> {
        // 送信が終わるとtransportと一緒にセッションも閉じられる
        let transport = self.transport.take().ok_or(TransportError::NotConnected)?;
        let mail = build_message(message)?;

        transport
            .send(&mail)
            .map_err(|e| TransportError::Send(e.to_string()))?;

        let recipients: Vec<&str> = message.recipients.iter().map(|r| r.email.as_str()).collect();
        let attached: usize = message.attachments.iter().map(Attachment::size).sum();
        let sent_at = match self.time.utc_offset() {
            Some(offset) => Utc::now().with_timezone(&offset).format("%Y/%m/%d %H:%M:%S").to_string(),
            None => Utc::now().format("%Y/%m/%d %H:%M:%S UTC").to_string(),
        };
        info!(
            "メール送信完了: 宛先={}, 件名={}, 添付={} bytes, 日時={}",
            recipients.join(","),
            message.subject,
            attached,
            sent_at
        );
        Ok(())
    }
}

fn to_mailbox(mailbox: &Mailbox) -> Result<LettreMailbox, TransportError> {
    let address: Address = mailbox
        .email
        .parse()
        .map_err(|e| TransportError::Message(format!("{}: {}", mailbox.email, e)))?;
    let name = (!mailbox.name.is_empty()).then(|| mailbox.name.clone());
    Ok(LettreMailbox::new(name, address))
}

fn to_lettre_encoding(encoding: TransferEncoding) -> ContentTransferEncoding {
    match encoding {
        TransferEncoding::SevenBit => ContentTransferEncoding::SevenBit,
        TransferEncoding::Base64 => ContentTransferEncoding::Base64,
    }
}

fn text_part(message: &EmailMessage<'_>) -> SinglePart {
    SinglePart::builder()
        .header(ContentType::TEXT_PLAIN)
        .header(to_lettre_encoding(message.text_encoding))
        .body(message.text.clone())
}

fn attachment_part(attachment: &Attachment<'_>) -> Result<SinglePart, TransportError> {
    let content_type = ContentType::parse(&attachment.mime)
        .map_err(|e| TransportError::Message(format!("{}: {:?}", attachment.mime, e)))?;

    let builder = SinglePart::builder()
        .header(content_type)
        .header(ContentDisposition::attachment(&attachment.filename));

    let part = match attachment.content_encoding {
        // エンコード済みのデータは行の折り返しだけ行う
        TransferEncoding::Base64 => builder.body(Body::dangerous_pre_encoded(
            wrap_mime_lines(attachment.data),
            ContentTransferEncoding::Base64,
        )),
        TransferEncoding::SevenBit => builder
            .header(to_lettre_encoding(attachment.transfer_encoding))
            .body(attachment.data.to_vec()),
    };
    Ok(part)
}

/// ドメインのメッセージを lettre の MIME メッセージに変換する
pub fn build_message(message: &EmailMessage<'_>) -> Result<Message, TransportError> {
    let mut builder = Message::builder()
        .from(to_mailbox(&message.sender)?)
        .subject(message.subject.clone());
    for recipient in &message.recipients {
        builder = builder.to(to_mailbox(recipient)?);
    }

    let mut parts = MultiPart::mixed().singlepart(text_part(message));
    for attachment in &message.attachments {
        parts = parts.singlepart(attachment_part(attachment)?);
    }

    builder
        .multipart(parts)
        .map_err(|e| TransportError::Message(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EmailConfig, EncodedPayload};
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    /// 受け付けた接続数と受信したメッセージ数を数えるだけのSMTPサーバー
    fn spawn_smtp_server() -> (u16, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let connections = Arc::new(AtomicUsize::new(0));
        let messages = Arc::new(AtomicUsize::new(0));

        let accepted = Arc::clone(&connections);
        let received = Arc::clone(&messages);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                accepted.fetch_add(1, Ordering::SeqCst);
                let received = Arc::clone(&received);
                thread::spawn(move || serve_smtp(stream, &received));
            }
        });

        (port, connections, messages)
    }

    fn serve_smtp(stream: TcpStream, received: &AtomicUsize) {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        let _ = writer.write_all(b"220 localhost ESMTP\r\n");

        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                return;
            }
            let command = line.trim_end().to_ascii_uppercase();

            let reply: &[u8] = if command.starts_with("EHLO") || command.starts_with("HELO") {
                b"250 localhost\r\n"
            } else if command == "DATA" {
                let _ = writer.write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n");
                loop {
                    line.clear();
                    if reader.read_line(&mut line).unwrap_or(0) == 0 {
                        return;
                    }
                    if line.trim_end() == "." {
                        break;
                    }
                }
                received.fetch_add(1, Ordering::SeqCst);
                b"250 queued\r\n"
            } else if command == "QUIT" {
                let _ = writer.write_all(b"221 bye\r\n");
                return;
            } else {
                b"250 ok\r\n"
            };

            if writer.write_all(reply).is_err() {
                return;
            }
        }
    }

    fn local_session(port: u16) -> SessionConfig {
        let mut session = SessionConfig::from_email_config(&EmailConfig::new(
            "127.0.0.1",
            "camera",
            "secret",
            "me@example.com",
        ));
        session.server.port = port;
        session
    }

    #[test]
    fn test_send_without_connect() {
        let payload = EncodedPayload::encode(b"image");
        let message = EmailMessage::picture("unit-cam", "me@example.com", &payload);
        let mut transport = LettreTransport::new();

        assert!(!transport.is_connected());
        assert_eq!(transport.send(&message), Err(TransportError::NotConnected));
    }

    #[test]
    fn test_invalid_recipient_address() {
        let payload = EncodedPayload::encode(b"image");
        let message = EmailMessage::picture("unit-cam", "not-an-address", &payload);

        assert!(matches!(build_message(&message), Err(TransportError::Message(_))));
    }

    #[test]
    fn test_connect_and_send_share_one_session() {
        let (port, connections, messages) = spawn_smtp_server();
        let session = local_session(port);

        // 平文のローカルサーバー向け。プール設定は実機と同じ
        let smtp = SmtpTransport::builder_dangerous("127.0.0.1")
            .port(port)
            .timeout(Some(Duration::from_secs(5)))
            .pool_config(single_session_pool())
            .build();

        let mut transport = LettreTransport::new();
        transport.open(smtp, &session).unwrap();
        assert!(transport.is_connected());
        assert_eq!(connections.load(Ordering::SeqCst), 1);

        let payload = EncodedPayload::encode(b"image");
        let message = EmailMessage::picture("unit-cam", "me@example.com", &payload);
        transport.send(&message).unwrap();

        assert_eq!(connections.load(Ordering::SeqCst), 1);
        assert_eq!(messages.load(Ordering::SeqCst), 1);
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_connect_failure_is_reported_as_connect() {
        // 接続を受け付けないポート
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let session = local_session(port);
        let smtp = SmtpTransport::builder_dangerous("127.0.0.1")
            .port(port)
            .timeout(Some(Duration::from_secs(5)))
            .pool_config(single_session_pool())
            .build();

        let mut transport = LettreTransport::new();
        assert!(matches!(
            transport.open(smtp, &session),
            Err(TransportError::Connect(_))
        ));
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_unencoded_attachment_encoded_by_lettre() {
        let message = EmailMessage {
            sender: Mailbox::new("unit-cam", "me@example.com"),
            subject: "log".to_string(),
            recipients: vec![Mailbox::new("", "me@example.com")],
            text: "Picture".to_string(),
            text_encoding: TransferEncoding::SevenBit,
            attachments: vec![Attachment {
                filename: "boot.txt".to_string(),
                mime: "text/plain".to_string(),
                transfer_encoding: TransferEncoding::Base64,
                content_encoding: TransferEncoding::SevenBit,
                data: b"foobar",
            }],
        };

        let formatted = String::from_utf8(build_message(&message).unwrap().formatted()).unwrap();
        assert!(formatted.contains("filename=\"boot.txt\""));
        assert!(formatted.contains("Zm9vYmFy"));
    }
}
