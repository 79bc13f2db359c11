use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, PinDriver};

/// エラー表示の点滅回数
const ERROR_BLINK_COUNT: u32 = 3;
/// エラー表示の点灯・消灯時間
const ERROR_BLINK_MS: u32 = 300;

#[derive(Debug, thiserror::Error)]
pub enum LedError {
    #[error("LEDのGPIOを出力に設定できませんでした: {0}")]
    InitFailed(String),

    #[error("LEDのGPIO出力に失敗しました: {0}")]
    ControlFailed(String),
}

/// Unit Cam 基板のGPIO4 LED
///
/// LOW で点灯します。`flash_led` が有効なら撮影時のフラッシュとして
/// カメラに渡し、無効なら送信失敗を知らせる点滅に使います。
pub struct StatusLed {
    pin: PinDriver<'static, AnyOutputPin, Output>,
}

impl StatusLed {
    pub fn new(pin: AnyOutputPin) -> Result<Self, LedError> {
        let pin = PinDriver::output(pin).map_err(|e| LedError::InitFailed(format!("{:?}", e)))?;
        Ok(Self { pin })
    }

    pub fn turn_on(&mut self) -> Result<(), LedError> {
        self.pin
            .set_low()
            .map_err(|e| LedError::ControlFailed(format!("{:?}", e)))
    }

    pub fn turn_off(&mut self) -> Result<(), LedError> {
        self.pin
            .set_high()
            .map_err(|e| LedError::ControlFailed(format!("{:?}", e)))
    }

    /// 送信失敗時の点滅。終了時は消灯状態
    pub fn blink_error(&mut self) -> Result<(), LedError> {
        for _ in 0..ERROR_BLINK_COUNT {
            self.turn_on()?;
            FreeRtos::delay_ms(ERROR_BLINK_MS);
            self.turn_off()?;
            FreeRtos::delay_ms(ERROR_BLINK_MS);
        }
        Ok(())
    }
}
