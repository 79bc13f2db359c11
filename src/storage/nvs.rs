use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

use super::{PreferenceError, PreferenceSession, PreferenceStore};

/// NVS文字列読み込み用の最大バッファサイズ
const MAX_STRING_LEN: usize = 256;

/// デフォルトNVSパーティション上のプリファレンスストア
pub struct EspNvsPreferences {
    partition: EspDefaultNvsPartition,
}

impl EspNvsPreferences {
    pub fn new(partition: EspDefaultNvsPartition) -> Self {
        Self { partition }
    }
}

impl PreferenceStore for EspNvsPreferences {
    type Session = EspNvsSession;

    fn begin(&mut self, namespace: &str, read_only: bool) -> Result<Self::Session, PreferenceError> {
        let nvs = EspNvs::new(self.partition.clone(), namespace, !read_only).map_err(|e| {
            PreferenceError::Open {
                namespace: namespace.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(EspNvsSession { nvs })
    }
}

/// NVSハンドル。Dropでハンドルが閉じられる
pub struct EspNvsSession {
    nvs: EspNvs<NvsDefault>,
}

impl PreferenceSession for EspNvsSession {
    fn get_string(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let read_error = |e: esp_idf_svc::sys::EspError| PreferenceError::Read {
            key: key.to_string(),
            reason: e.to_string(),
        };

        let len = match self.nvs.str_len(key).map_err(read_error)? {
            Some(len) => len,
            None => return Ok(None),
        };
        if len > MAX_STRING_LEN {
            return Err(PreferenceError::Read {
                key: key.to_string(),
                reason: format!("値が長すぎます ({} bytes)", len),
            });
        }

        let mut buf = [0u8; MAX_STRING_LEN];
        let value = self.nvs.get_str(key, &mut buf).map_err(read_error)?;
        Ok(value.map(|v| v.trim_end_matches('\0').to_string()))
    }

    fn put_string(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.nvs.set_str(key, value).map_err(|e| PreferenceError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}
