use std::net::SocketAddr;

use serde::Deserialize;
use bytemeter_core::error::{BytemeterError, Result};

use crate::meter::key::HeaderKey;
use crate::meter::layer::{KeyErrorPolicy, DEFAULT_RECORD_BUFFER};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub meter: MeterConfig,

    #[serde(default)]
    pub key: KeyConfig,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(BytemeterError::Config(format!(
                "unsupported config version {} (expected 1)",
                self.version
            )));
        }

        self.gateway.validate()?;
        self.meter.validate()?;
        self.key.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            BytemeterError::Config(format!("gateway.listen must be a valid SocketAddr: {e}"))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

/// `meter` section: record channel and key failure handling.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeterConfig {
    /// Capacity of the record channel. A full channel stalls accumulation
    /// tasks, never response writes.
    #[serde(default = "default_record_buffer")]
    pub record_buffer: usize,

    /// `abandon` unless set; `pass_through` serves unkeyed requests unmetered.
    #[serde(default)]
    pub on_key_error: KeyErrorPolicy,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            record_buffer: default_record_buffer(),
            on_key_error: KeyErrorPolicy::default(),
        }
    }
}

impl MeterConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1_000_000).contains(&self.record_buffer) {
            return Err(BytemeterError::Config(
                "meter.record_buffer must be between 1 and 1000000".into(),
            ));
        }
        Ok(())
    }
}

fn default_record_buffer() -> usize {
    DEFAULT_RECORD_BUFFER
}

/// `key` section: which request header names the metering key.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyConfig {
    #[serde(default = "default_key_header")]
    pub header: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            header: default_key_header(),
        }
    }
}

impl KeyConfig {
    pub fn validate(&self) -> Result<()> {
        self.extractor().map(|_| ())
    }

    pub fn extractor(&self) -> Result<HeaderKey> {
        HeaderKey::from_name(&self.header)
    }
}

fn default_key_header() -> String {
    "x-client-id".into()
}
