use std::ptr::NonNull;

use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_sys::camera;
use log::{info, warn};

use super::{Camera, CameraError, Frame, FrameSize};
use crate::hardware::led::StatusLed;

/// フラッシュ点灯から撮影までの待ち時間
const FLASH_SETTLE_MS: u32 = 150;

/// カメラのピン番号 (-1 は未接続)
#[derive(Debug, Clone, Copy)]
pub struct CameraPinMap {
    pub pwdn: i32,
    pub reset: i32,
    pub xclk: i32,
    pub sda: i32,
    pub scl: i32,
    pub data: [i32; 8], // D0-D7
    pub vsync: i32,
    pub href: i32,
    pub pclk: i32,
}

impl CameraPinMap {
    /// M5Stack Unit Cam (OV2640)
    pub const M5STACK_UNIT_CAM: CameraPinMap = CameraPinMap {
        pwdn: -1,
        reset: 15,
        xclk: 27,
        sda: 25,
        scl: 23,
        data: [32, 35, 34, 5, 39, 18, 36, 19],
        vsync: 22,
        href: 26,
        pclk: 21,
    };
}

fn to_framesize(frame_size: FrameSize) -> camera::framesize_t {
    match frame_size {
        FrameSize::QVGA => camera::framesize_t_FRAMESIZE_QVGA,
        FrameSize::VGA => camera::framesize_t_FRAMESIZE_VGA,
        FrameSize::SVGA => camera::framesize_t_FRAMESIZE_SVGA,
        FrameSize::XGA => camera::framesize_t_FRAMESIZE_XGA,
        FrameSize::UXGA => camera::framesize_t_FRAMESIZE_UXGA,
    }
}

/// esp32-camera ドライバを使うカメラ
pub struct EspCamera {
    flash: Option<StatusLed>,
}

impl EspCamera {
    /// カメラドライバを初期化する
    ///
    /// `flash` を渡した場合は撮影のたびにLEDを点灯させます。
    pub fn init(
        pins: &CameraPinMap,
        frame_size: FrameSize,
        flash: Option<StatusLed>,
    ) -> Result<Self, CameraError> {
        let config = camera::camera_config_t {
            pin_pwdn: pins.pwdn,
            pin_reset: pins.reset,
            pin_xclk: pins.xclk,
            __bindgen_anon_1: camera::camera_config_t__bindgen_ty_1 {
                pin_sccb_sda: pins.sda,
            },
            __bindgen_anon_2: camera::camera_config_t__bindgen_ty_2 {
                pin_sccb_scl: pins.scl,
            },
            pin_d0: pins.data[0],
            pin_d1: pins.data[1],
            pin_d2: pins.data[2],
            pin_d3: pins.data[3],
            pin_d4: pins.data[4],
            pin_d5: pins.data[5],
            pin_d6: pins.data[6],
            pin_d7: pins.data[7],
            pin_vsync: pins.vsync,
            pin_href: pins.href,
            pin_pclk: pins.pclk,
            xclk_freq_hz: 20_000_000, // 20MHz
            ledc_timer: esp_idf_sys::ledc_timer_t_LEDC_TIMER_0,
            ledc_channel: esp_idf_sys::ledc_channel_t_LEDC_CHANNEL_0,
            pixel_format: camera::pixformat_t_PIXFORMAT_JPEG,
            frame_size: to_framesize(frame_size),
            jpeg_quality: 12,
            fb_count: 1,
            fb_location: camera::camera_fb_location_t_CAMERA_FB_IN_PSRAM,
            grab_mode: camera::camera_grab_mode_t_CAMERA_GRAB_LATEST,
            ..Default::default()
        };

        esp_idf_sys::esp!(unsafe { camera::esp_camera_init(&config) })
            .map_err(|e| CameraError::InitFailed(format!("esp_camera_init: {}", e)))?;

        let (width, height) = frame_size.dimensions();
        info!("カメラを初期化しました: {:?} ({}x{})", frame_size, width, height);
        Ok(Self { flash })
    }

    fn set_flash(&mut self, on: bool) {
        if let Some(led) = self.flash.as_mut() {
            let result = if on { led.turn_on() } else { led.turn_off() };
            if let Err(e) = result {
                warn!("{}", CameraError::FlashFailed(e.to_string()));
            }
        }
    }
}

impl Camera for EspCamera {
    type Frame = EspFrame;

    fn capture(&mut self) -> Option<EspFrame> {
        if self.flash.is_some() {
            self.set_flash(true);
            FreeRtos::delay_ms(FLASH_SETTLE_MS);
        }

        let fb = unsafe { camera::esp_camera_fb_get() };

        self.set_flash(false);
        NonNull::new(fb).map(|fb| EspFrame { fb })
    }
}

/// ドライバから借りたフレームバッファ。Dropでドライバへ返却する
pub struct EspFrame {
    fb: NonNull<camera::camera_fb_t>,
}

// フレームバッファは取得したタスクだけが所有する
unsafe impl Send for EspFrame {}

impl Frame for EspFrame {
    fn width(&self) -> usize {
        unsafe { self.fb.as_ref().width }
    }

    fn height(&self) -> usize {
        unsafe { self.fb.as_ref().height }
    }

    fn data(&self) -> &[u8] {
        unsafe {
            let fb = self.fb.as_ref();
            std::slice::from_raw_parts(fb.buf, fb.len)
        }
    }
}

impl Drop for EspFrame {
    fn drop(&mut self) {
        unsafe { camera::esp_camera_fb_return(self.fb.as_ptr()) };
    }
}
