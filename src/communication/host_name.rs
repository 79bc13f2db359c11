/// デバイスのホスト名を返すトレイト（メール送信者名に使用）
pub trait HostNameProvider {
    fn host_name(&self) -> String;
}

/// 起動時に一度だけ取得したホスト名を保持する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticHostName(String);

impl StaticHostName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl HostNameProvider for StaticHostName {
    fn host_name(&self) -> String {
        self.0.clone()
    }
}
