/// コアシステムモジュール
pub mod email_config;
pub mod encoding;
pub mod message;
pub mod picture_mailer;
pub mod session;

pub use email_config::EmailConfig;
pub use encoding::{encoded_len, EncodedPayload};
pub use message::{Attachment, EmailMessage, Mailbox, TransferEncoding};
pub use picture_mailer::{PictureMailer, SendOutcome};
pub use session::{LoginConfig, ServerConfig, SessionConfig, TimeConfig, SMTP_PORT};
