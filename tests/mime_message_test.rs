/// MIME Message Rendering Tests
///
/// 写真メールを lettre のメッセージに変換し、送信される形式を確認します。
use picture_mailer::communication::lettre_transport::build_message;
use picture_mailer::core::encoding::MIME_LINE_LENGTH;
use picture_mailer::{EmailMessage, EncodedPayload};

fn render(raw: &[u8]) -> (String, EncodedPayload) {
    let payload = EncodedPayload::encode(raw);
    let message = EmailMessage::picture("unit-cam-01", "owner@example.com", &payload);
    let formatted = build_message(&message).unwrap().formatted();
    (String::from_utf8(formatted).unwrap(), payload)
}

#[test]
fn test_headers() {
    let (text, _) = render(&[0xFF, 0xD8, 0xFF, 0xE0]);

    assert!(text.contains("Subject: A Photo"));
    assert!(text.contains("<owner@example.com>"));
    assert!(text.contains("multipart/mixed"));
    assert!(text.contains("Picture"));
}

#[test]
fn test_text_part_is_seven_bit() {
    let (text, _) = render(&[0xFF, 0xD8, 0xFF, 0xE0]);

    assert!(text.contains("Content-Type: text/plain"));
    assert!(text.contains("Content-Transfer-Encoding: 7bit"));
}

#[test]
fn test_attachment_part() {
    let (text, _) = render(&[0xFF, 0xD8, 0xFF, 0xE0]);

    assert!(text.contains("Content-Type: image/png"));
    assert!(text.contains("filename=\"critter.png\""));
    assert!(text.contains("Content-Transfer-Encoding: base64"));
}

#[test]
fn test_attachment_body_wrapped() {
    let raw: Vec<u8> = (0..600).map(|i| (i % 251) as u8).collect();
    let (text, payload) = render(&raw);
    let encoded = std::str::from_utf8(payload.as_bytes()).unwrap();

    // 1行目は76文字で折り返され、エンコード済みデータが再エンコードされずに入る
    assert!(text.contains(&format!("{}\r\n", &encoded[..MIME_LINE_LENGTH])));
    assert!(!text.contains(encoded));
    assert!(text.lines().all(|line| line.len() <= 998));
}
