use std::time::Duration;

use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::{delay::FreeRtos, gpio::OutputPin, peripherals::Peripherals},
    nvs::EspDefaultNvsPartition,
};
use log::{error, info, warn};

use picture_mailer::communication::{LettreTransport, NetworkManager, TimeSync};
use picture_mailer::core::{PictureMailer, TimeConfig};
use picture_mailer::hardware::camera::{CameraPinMap, EspCamera};
use picture_mailer::hardware::led::StatusLed;
use picture_mailer::storage::{seed_defaults, EspNvsPreferences};
use picture_mailer::AppConfig;

/// 起動時のSNTP同期待ち時間
const SNTP_TIMEOUT: Duration = Duration::from_secs(10);

/// アプリケーションのメインエントリーポイント
fn main() -> anyhow::Result<()> {
    // ESP-IDFの基本初期化
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    // 設定ファイル読み込み
    let app_config = AppConfig::load().map_err(|e| {
        error!("設定ファイルの読み込みに失敗しました: {}", e);
        anyhow::anyhow!("設定ファイルの読み込みエラー: {}", e)
    })?;

    // ペリフェラルとシステムリソースの初期化
    info!("ペリフェラルを初期化しています");
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ネットワーク（WiFi）初期化
    let wifi = NetworkManager::connect_wifi(
        peripherals.modem,
        &sysloop,
        &nvs_partition,
        &app_config.wifi_ssid,
        &app_config.wifi_password,
    )?;
    let host_name = NetworkManager::host_name(&wifi)?;

    // 時刻同期（Dateヘッダー用）
    let _time_sync = TimeSync::start(&TimeConfig::default(), SNTP_TIMEOUT)?;

    // GPIO4のLEDはフラッシュまたはステータス表示に使う
    let mut led = StatusLed::new(peripherals.pins.gpio4.downgrade_output())?;
    led.turn_off()?;
    let (flash, mut status_led) = if app_config.flash_led {
        (Some(led), None)
    } else {
        (None, Some(led))
    };

    let camera = EspCamera::init(&CameraPinMap::M5STACK_UNIT_CAM, app_config.frame_size, flash)?;

    // cfg.toml のデフォルト値を未設定のプリファレンスへ書き込む
    let mut prefs = EspNvsPreferences::new(nvs_partition.clone());
    match seed_defaults(&mut prefs, &app_config.default_email) {
        Ok(0) => {}
        Ok(written) => info!("プリファレンスに {} 件のデフォルト値を書き込みました", written),
        Err(e) => warn!("デフォルト値の書き込みに失敗しました: {}", e),
    }

    let mailer = PictureMailer::new(prefs, camera, LettreTransport::new(), host_name);

    let period = app_config.send_period();
    let period_ms = u32::try_from(period.as_millis()).unwrap_or(u32::MAX);
    info!("写真の送信間隔: {}分", app_config.email_period_minutes);

    loop {
        let outcome = mailer.send_picture();
        info!("send_picture: {}", outcome);

        if outcome.is_failure() {
            if let Some(led) = status_led.as_mut() {
                if let Err(e) = led.blink_error() {
                    warn!("{}", e);
                }
            }
        }

        FreeRtos::delay_ms(period_ms);
    }
}
