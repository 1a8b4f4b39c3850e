//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`]: the [`SystemConfig`] lives as one `postcard`
//! blob under `rainwatch/syscfg`. A missing, corrupt or out-of-range blob
//! loads as [`SystemConfig::default()`]; saving validates first and never
//! persists an invalid config.
//!
//! On the host the blob lives in an in-memory map.

use crate::app::ports::ConfigPort;
use crate::config::SystemConfig;
use crate::error::ConfigError;
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "rainwatch";
#[cfg(not(target_os = "espidf"))]
const CONFIG_KEY: &str = "syscfg";
#[cfg(target_os = "espidf")]
const CONFIG_KEY_C: &[u8] = b"syscfg\0";

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create the adapter and initialise NVS flash.
    ///
    /// On first boot or after a layout change the partition is erased and
    /// re-initialised. Returns [`ConfigError::IoError`] if that fails too.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS use.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    /// Host: overwrite the stored blob with arbitrary bytes.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_put_raw(&self, bytes: &[u8]) {
        self.store
            .borrow_mut()
            .insert(Self::composite_key(), bytes.to_vec());
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key() -> String {
        format!("{}::{}", CONFIG_NAMESPACE, CONFIG_KEY)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Vec<u8>, ConfigError> {
        self.store
            .borrow()
            .get(&Self::composite_key())
            .cloned()
            .ok_or(ConfigError::NotFound)
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&self, bytes: Vec<u8>) -> Result<(), ConfigError> {
        self.store.borrow_mut().insert(Self::composite_key(), bytes);
        Ok(())
    }

    /// Open the config namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns = CONFIG_NAMESPACE.as_bytes();
        ns_buf[..ns.len()].copy_from_slice(ns);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        // SAFETY: ns_buf is NUL-terminated; handle is closed below.
        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Vec<u8>, ConfigError> {
        let result = Self::with_nvs_handle(false, |handle| {
            let mut size: usize = 0;
            // SAFETY: size query with a null buffer.
            let ret = unsafe {
                nvs_get_blob(handle, CONFIG_KEY_C.as_ptr() as *const _, core::ptr::null_mut(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(ESP_ERR_NVS_INVALID_LENGTH);
            }
            let mut buf = vec![0u8; size];
            // SAFETY: buf holds exactly `size` bytes.
            let ret = unsafe {
                nvs_get_blob(handle, CONFIG_KEY_C.as_ptr() as *const _, buf.as_mut_ptr() as *mut _, &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(buf)
        });
        match result {
            Ok(buf) => Ok(buf),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(ConfigError::NotFound),
            Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => Err(ConfigError::Corrupted),
            Err(e) => {
                warn!("NvsAdapter: NVS read error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, bytes: Vec<u8>) -> Result<(), ConfigError> {
        let result = Self::with_nvs_handle(true, |handle| {
            // SAFETY: bytes outlives the call; commit makes the write atomic.
            let ret = unsafe {
                nvs_set_blob(handle, CONFIG_KEY_C.as_ptr() as *const _, bytes.as_ptr() as *const _, bytes.len())
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(|e| {
            warn!("NvsAdapter: NVS write error {}", e);
            ConfigError::IoError
        })
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let bytes = match self.read_blob() {
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound) => {
                info!("NvsAdapter: no stored config, using defaults");
                return Ok(SystemConfig::default());
            }
            Err(ConfigError::Corrupted) => {
                warn!("NvsAdapter: stored config has bad length, using defaults");
                return Ok(SystemConfig::default());
            }
            Err(e) => return Err(e),
        };

        let cfg: SystemConfig = match postcard::from_bytes(&bytes) {
            Ok(cfg) => cfg,
            Err(_) => {
                warn!("NvsAdapter: stored config corrupt ({} bytes), using defaults", bytes.len());
                return Ok(SystemConfig::default());
            }
        };
        if let Err(e) = cfg.validate() {
            warn!("NvsAdapter: stored config rejected ({}), using defaults", e);
            return Ok(SystemConfig::default());
        }
        info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        let len = bytes.len();
        self.write_blob(bytes)?;
        info!("NvsAdapter: config saved ({} bytes)", len);
        Ok(())
    }
}
