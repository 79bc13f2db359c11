use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// MIME本文の1行あたりの最大文字数 (RFC 2045)
pub const MIME_LINE_LENGTH: usize = 76;

/// base64エンコード済みの画像データ
///
/// 送信が終わるまで保持され、Dropで解放されます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    data: Vec<u8>,
}

impl EncodedPayload {
    /// 生データをbase64エンコードする
    pub fn encode(raw: &[u8]) -> Self {
        Self {
            data: BASE64.encode(raw).into_bytes(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 元のバイト列に戻す
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.data)
    }

    /// MIME本文向けに76文字ごとにCRLFで折り返す
    pub fn to_mime_lines(&self) -> Vec<u8> {
        wrap_mime_lines(&self.data)
    }
}

/// base64文字列を76文字ごとにCRLFで区切る
pub fn wrap_mime_lines(encoded: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded.len() + encoded.len() / MIME_LINE_LENGTH * 2);
    for (i, line) in encoded.chunks(MIME_LINE_LENGTH).enumerate() {
        if i > 0 {
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(line);
    }
    out
}

/// base64エンコード後のサイズ
pub fn encoded_len(raw_len: usize) -> usize {
    raw_len.div_ceil(3) * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        let payload = EncodedPayload::encode(b"foobar");
        assert_eq!(payload.as_bytes(), b"Zm9vYmFy");
    }

    #[test]
    fn test_round_trip() {
        let raw: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let payload = EncodedPayload::encode(&raw);
        assert_eq!(payload.decode().unwrap(), raw);
    }

    #[test]
    fn test_encoded_len_matches_payload() {
        for len in [0usize, 1, 2, 3, 4, 12_000] {
            let payload = EncodedPayload::encode(&vec![0xAB; len]);
            assert_eq!(payload.len(), encoded_len(len));
        }
        assert_eq!(encoded_len(12_000), 16_000);
    }

    #[test]
    fn test_mime_lines_wrapped() {
        let payload = EncodedPayload::encode(&[0x42; 200]);
        let wrapped = payload.to_mime_lines();
        let text = String::from_utf8(wrapped).unwrap();

        assert!(text.split("\r\n").all(|line| line.len() <= MIME_LINE_LENGTH));
        assert_eq!(text.replace("\r\n", "").as_bytes(), payload.as_bytes());
    }
}
