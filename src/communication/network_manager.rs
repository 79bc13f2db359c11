use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};
use log::info;

use super::StaticHostName;

/// WiFi接続を管理するモジュール
pub struct NetworkManager;

impl NetworkManager {
    /// WiFiをSTAモードで起動し、IPアドレスを取得するまで待機する
    pub fn connect_wifi(
        modem: Modem,
        sysloop: &EspSystemEventLoop,
        nvs_partition: &EspDefaultNvsPartition,
        ssid: &str,
        password: &str,
    ) -> anyhow::Result<BlockingWifi<EspWifi<'static>>> {
        info!("WiFiをSTAモードで準備します。SSID: {}", ssid);

        let mut wifi = BlockingWifi::wrap(
            EspWifi::new(modem, sysloop.clone(), Some(nvs_partition.clone()))?,
            sysloop.clone(),
        )?;

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| anyhow::anyhow!("SSIDが長すぎます: {}", ssid))?,
            password: password
                .try_into()
                .map_err(|_| anyhow::anyhow!("WiFiパスワードが長すぎます"))?,
            auth_method,
            ..Default::default()
        }))?;

        wifi.start()?;
        info!("WiFiを起動しました。接続中...");
        wifi.connect()?;
        wifi.wait_netif_up()?;

        let ip_info = wifi.wifi().sta_netif().get_ip_info()?;
        info!("WiFi接続完了。IPアドレス: {}", ip_info.ip);

        Ok(wifi)
    }

    /// STAインターフェースのホスト名を取得する
    pub fn host_name(wifi: &BlockingWifi<EspWifi<'static>>) -> anyhow::Result<StaticHostName> {
        let host_name = wifi.wifi().sta_netif().get_hostname()?;
        info!("ホスト名: {}", host_name);
        Ok(StaticHostName::new(host_name.as_str()))
    }
}
