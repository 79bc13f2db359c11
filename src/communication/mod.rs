/// 通信モジュール
pub mod host_name;
pub mod lettre_transport;
#[cfg(feature = "esp")]
pub mod network_manager;
pub mod smtp;
#[cfg(feature = "esp")]
pub mod time_sync;

pub use host_name::{HostNameProvider, StaticHostName};
pub use lettre_transport::LettreTransport;
#[cfg(feature = "esp")]
pub use network_manager::NetworkManager;
pub use smtp::{MailTransport, TransportError};
#[cfg(feature = "esp")]
pub use time_sync::TimeSync;
