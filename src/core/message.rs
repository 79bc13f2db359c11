use super::EncodedPayload;

/// 送信する写真の件名
pub const PICTURE_SUBJECT: &str = "A Photo";
/// 送信する写真の本文
pub const PICTURE_BODY: &str = "Picture";
/// 添付ファイル名
pub const PICTURE_FILENAME: &str = "critter.png";
/// 添付ファイルのMIMEタイプ
pub const PICTURE_MIME: &str = "image/png";

/// 本文・添付データのエンコーディング
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    SevenBit,
    Base64,
}

/// 送信者・受信者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub name: String,
    pub email: String,
}

impl Mailbox {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// 添付ファイル。データは呼び出し側が所有するバッファを参照する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment<'a> {
    pub filename: String,
    pub mime: String,
    pub transfer_encoding: TransferEncoding,
    /// `data` が既にどのエンコーディングで格納されているか
    pub content_encoding: TransferEncoding,
    pub data: &'a [u8],
}

impl Attachment<'_> {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// 1回の送信ごとに組み立てるメール
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage<'a> {
    pub sender: Mailbox,
    pub subject: String,
    pub recipients: Vec<Mailbox>,
    pub text: String,
    pub text_encoding: TransferEncoding,
    pub attachments: Vec<Attachment<'a>>,
}

impl<'a> EmailMessage<'a> {
    /// 撮影した写真を添付したメールを組み立てる
    ///
    /// 送信元・送信先ともに `recipient` を使用し、送信者名にはホスト名を使います。
    pub fn picture(host_name: &str, recipient: &str, payload: &'a EncodedPayload) -> Self {
        Self {
            sender: Mailbox::new(host_name, recipient),
            subject: PICTURE_SUBJECT.to_string(),
            recipients: vec![Mailbox::new("", recipient)],
            text: PICTURE_BODY.to_string(),
            text_encoding: TransferEncoding::SevenBit,
            attachments: vec![Attachment {
                filename: PICTURE_FILENAME.to_string(),
                mime: PICTURE_MIME.to_string(),
                transfer_encoding: TransferEncoding::Base64,
                content_encoding: TransferEncoding::Base64,
                data: payload.as_bytes(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picture_message() {
        let payload = EncodedPayload::encode(&[1, 2, 3]);
        let message = EmailMessage::picture("unit-cam", "me@example.com", &payload);

        assert_eq!(message.sender, Mailbox::new("unit-cam", "me@example.com"));
        assert_eq!(message.subject, "A Photo");
        assert_eq!(message.text, "Picture");
        assert_eq!(message.text_encoding, TransferEncoding::SevenBit);
        assert_eq!(message.recipients, vec![Mailbox::new("", "me@example.com")]);

        let attachment = &message.attachments[0];
        assert_eq!(attachment.filename, "critter.png");
        assert_eq!(attachment.mime, "image/png");
        assert_eq!(attachment.transfer_encoding, TransferEncoding::Base64);
        assert_eq!(attachment.content_encoding, TransferEncoding::Base64);
        assert_eq!(attachment.size(), 4);
    }
}
