use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde_derive::Deserialize;

use crate::messages::Role;

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub hub: HubConfig,
    pub device: Option<DeviceConfig>,
    pub liveness: Option<LivenessConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct HubConfig {
    pub url: String,
    pub reconnect_interval_ms: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct DeviceConfig {
    pub name: Option<String>,
    pub role: Option<Role>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct LivenessConfig {
    pub interval_ms: Option<u64>,
    pub include_role: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct DisplayConfig {
    pub columns: Option<usize>,
    pub rows: Option<usize>,
    pub header: Option<String>,
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::de::from_str(contents)?)
    }
}

impl HubConfig {
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms.unwrap_or(2000))
    }
}

impl DeviceConfig {
    pub fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "ESP-MASTER".to_string())
    }

    pub fn role(&self) -> Role {
        self.role.unwrap_or(Role::Master)
    }
}

impl LivenessConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.unwrap_or(3000))
    }

    pub fn include_role(&self) -> bool {
        self.include_role.unwrap_or(false)
    }
}

impl DisplayConfig {
    pub fn columns(&self) -> usize {
        self.columns.unwrap_or(16)
    }

    pub fn rows(&self) -> usize {
        self.rows.unwrap_or(2)
    }

    pub fn header(&self) -> String {
        self.header.clone().unwrap_or_else(|| " STATUS ".to_string())
    }
}
