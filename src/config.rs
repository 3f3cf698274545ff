// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Driver configuration.
//!
//! Values are taken from the built-in defaults, an optional TOML, YAML or
//! JSON file and finally from environment variables prefixed `TRACER_`,
//! later sources overriding earlier ones.

use std::{collections::BTreeMap, path::Path, time::Duration};

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    register::catalog,
    retry::RetryPolicy,
};

/// Prefix of environment variables overriding the configuration.
pub const ENV_PREFIX: &str = "TRACER_";

/// Unit system tag attached to packets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    Us,
    #[default]
    Metric,
    MetricWx,
}

impl UnitSystem {
    /// Numeric code as understood by weather station software.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Us => 0x01,
            Self::Metric => 0x10,
            Self::MetricWx => 0x11,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Reported as hardware name.
    pub model: String,
    pub port: String,
    /// Slave address on the bus.
    pub address: u8,
    pub baud_rate: u32,
    /// Response timeout in seconds.
    pub timeout: f64,
    /// Pause between poll cycles in seconds.
    pub poll_interval: u64,
    pub max_tries: u32,
    /// Pause after a failed attempt in seconds.
    pub retry_wait: u64,
    pub unit_system: UnitSystem,
    /// Host name to hardware field name, merged over the identity map.
    pub sensor_map: BTreeMap<String, String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            model: "EPEVER".to_owned(),
            port: "/dev/ttyUSB0".to_owned(),
            address: 1,
            baud_rate: 115_200,
            timeout: 6.0,
            poll_interval: 10,
            max_tries: 3,
            retry_wait: 5,
            unit_system: UnitSystem::default(),
            sensor_map: BTreeMap::new(),
        }
    }
}

fn file_provider(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| Error::Config(format!("{}: missing file extension", path.display())))?;
    let figment = match extension {
        "toml" => figment.merge(Toml::file(path)),
        "yaml" | "yml" => figment.merge(Yaml::file(path)),
        "json" => figment.merge(Json::file(path)),
        _ => {
            return Err(Error::Config(format!(
                "unsupported config file format: {extension}"
            )))
        }
    };
    Ok(figment)
}

impl DriverConfig {
    /// Defaults overridden by the file at `path`, if any.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!("{}: no such file", path.display())));
                }
                file_provider(figment, path)
            }
            None => Ok(figment),
        }
    }

    /// Load from `path` without consulting the environment.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_figment(Self::figment(Some(path.as_ref()))?)
    }

    /// Load from the optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path)?.merge(Env::prefixed(ENV_PREFIX)))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_tries == 0 {
            return Err(Error::Config("max_tries must be at least 1".into()));
        }
        if !(1..=247).contains(&self.address) {
            return Err(Error::Config(format!(
                "address {} out of range 1..=247",
                self.address
            )));
        }
        if self.baud_rate == 0 {
            return Err(Error::Config("baud_rate must not be 0".into()));
        }
        self.timeout()?;
        Ok(())
    }

    /// The response timeout, which must be positive and representable.
    pub fn timeout(&self) -> Result<Duration> {
        match Duration::try_from_secs_f64(self.timeout) {
            Ok(timeout) if !timeout.is_zero() => Ok(timeout),
            _ => Err(Error::Config(format!("invalid timeout {}", self.timeout))),
        }
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_tries, Duration::from_secs(self.retry_wait))
    }

    /// Every catalog field under its own name, overridden and extended by
    /// the configured entries.
    #[must_use]
    pub fn sensor_map(&self) -> BTreeMap<String, String> {
        let mut map: BTreeMap<_, _> = catalog::field_names()
            .map(|name| (name.to_owned(), name.to_owned()))
            .collect();
        map.extend(
            self.sensor_map
                .iter()
                .map(|(host, hardware)| (host.clone(), hardware.clone())),
        );
        map
    }

    #[cfg(feature = "rtu")]
    pub fn rtu_connector(&self) -> Result<crate::client::rtu::RtuConnector> {
        Ok(crate::client::rtu::RtuConnector {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            address: self.address,
            timeout: self.timeout()?,
        })
    }
}
