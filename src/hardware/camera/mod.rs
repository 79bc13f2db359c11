/// カメラ制御モジュール
///
/// フレームの取得はトレイトで抽象化し、実機用(ESP32カメラ)と
/// テスト用(Mock)の実装を切り替えられるようにしています。
#[cfg(feature = "esp")]
pub mod esp;

#[cfg(feature = "esp")]
pub use esp::{EspCamera, EspFrame};

use std::str::FromStr;

/// カメラ関連のエラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CameraError {
    #[error("カメラの初期化に失敗しました: {0}")]
    InitFailed(String),

    #[error("無効なフレームサイズ: {0}")]
    InvalidFrameSize(String),

    #[error("フラッシュLEDの制御に失敗しました: {0}")]
    FlashFailed(String),
}

/// キャプチャされた1枚のフレーム
///
/// フレームバッファはDropでドライバに返却されます。
pub trait Frame {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn data(&self) -> &[u8];

    fn len(&self) -> usize {
        self.data().len()
    }

    fn is_empty(&self) -> bool {
        self.data().is_empty()
    }
}

/// フレームを1枚取得するカメラ
pub trait Camera {
    type Frame: Frame;

    /// フレームを取得する。取得できなかった場合は `None`
    fn capture(&mut self) -> Option<Self::Frame>;
}

/// フレームサイズ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSize {
    QVGA, // 320x240
    VGA,  // 640x480
    SVGA, // 800x600
    XGA,  // 1024x768
    UXGA, // 1600x1200
}

impl FrameSize {
    pub fn dimensions(&self) -> (u16, u16) {
        match self {
            FrameSize::QVGA => (320, 240),
            FrameSize::VGA => (640, 480),
            FrameSize::SVGA => (800, 600),
            FrameSize::XGA => (1024, 768),
            FrameSize::UXGA => (1600, 1200),
        }
    }
}

impl FromStr for FrameSize {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QVGA" => Ok(FrameSize::QVGA),
            "VGA" => Ok(FrameSize::VGA),
            "SVGA" => Ok(FrameSize::SVGA),
            "XGA" => Ok(FrameSize::XGA),
            "UXGA" => Ok(FrameSize::UXGA),
            _ => Err(CameraError::InvalidFrameSize(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_size() {
        assert_eq!("SVGA".parse::<FrameSize>(), Ok(FrameSize::SVGA));
        assert_eq!(" qvga ".parse::<FrameSize>(), Ok(FrameSize::QVGA));
        assert_eq!(FrameSize::QVGA.dimensions(), (320, 240));
    }

    #[test]
    fn test_parse_invalid_frame_size() {
        assert!(matches!(
            "HD".parse::<FrameSize>(),
            Err(CameraError::InvalidFrameSize(_))
        ));
    }
}
