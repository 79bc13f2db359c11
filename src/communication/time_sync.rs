use std::time::{Duration, Instant};

use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::sntp::{EspSntp, SntpConf, SyncStatus};
use log::{info, warn};

use crate::core::TimeConfig;

/// SNTPによる時刻同期
///
/// メールのDateヘッダーに正しい時刻を入れるため、送信前に起動しておきます。
/// Dropされると同期が停止するため、プロセスの間保持してください。
pub struct TimeSync {
    _sntp: EspSntp<'static>,
}

impl TimeSync {
    /// SNTPを開始し、最初の同期を `timeout` まで待つ
    pub fn start(time: &TimeConfig, timeout: Duration) -> anyhow::Result<Self> {
        let servers: Vec<&str> = time.ntp_servers().collect();

        let mut conf = SntpConf::default();
        for (slot, server) in conf.servers.iter_mut().zip(servers.iter().copied()) {
            *slot = server;
        }
        info!("SNTPを開始します: {:?}", servers);

        let sntp = EspSntp::new(&conf)?;

        let started = Instant::now();
        while sntp.get_sync_status() != SyncStatus::Completed {
            if started.elapsed() >= timeout {
                warn!("SNTP同期がタイムアウトしました。時刻が不正確な可能性があります");
                return Ok(Self { _sntp: sntp });
            }
            FreeRtos::delay_ms(200);
        }

        match time.utc_offset() {
            Some(offset) => info!(
                "時刻同期完了: {}",
                chrono::Utc::now().with_timezone(&offset).format("%Y/%m/%d %H:%M:%S")
            ),
            None => info!("時刻同期完了"),
        }
        Ok(Self { _sntp: sntp })
    }
}
