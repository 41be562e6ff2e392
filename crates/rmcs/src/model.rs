//! Record types for device types, events, and deployed devices.
//!
//! Stored records carry their store-assigned id. The `New*` types are what the
//! record-creation boundary hands to storage, with every default already
//! resolved to a concrete value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default metrics endpoint path for a device type.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Default exporter port for a device type.
pub const DEFAULT_PORT: u16 = 9100;

/// A catalog entry describing a class of monitored device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceType {
    /// Store-assigned identifier.
    pub id: i64,
    /// Unique display name (e.g. "Camera").
    pub name: String,
    /// Prometheus job name for devices of this type.
    pub job_name: String,
    /// HTTP path the exporter serves metrics on.
    pub metrics_path: String,
    /// Port the exporter listens on.
    pub port: u16,
}

/// A named occasion that owns a set of deployed devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Free-form date text. Not parsed or validated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// A deployed instance of a device type within an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Store-assigned identifier.
    pub id: i64,
    /// The owning event.
    pub event_id: i64,
    /// The device type this device is an instance of.
    pub device_type_id: i64,
    /// Address the exporter is reachable on. Not validated.
    pub ip_address: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// An event together with its devices, in insertion order.
///
/// This is an immutable snapshot; it does not track later changes to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSnapshot {
    /// The event record.
    pub event: Event,
    /// Devices belonging to the event.
    pub devices: Vec<Device>,
}

impl EventSnapshot {
    /// Number of devices deployed at this event.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

/// Fallback values applied when a device type is created without them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Metrics path used when none (or an empty one) is given.
    pub metrics_path: String,
    /// Port used when none is given.
    pub port: u16,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Raw device type fields as entered by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceTypeInput {
    /// Display name.
    pub name: String,
    /// Prometheus job name.
    pub job_name: String,
    /// Optional metrics path; empty counts as absent.
    pub metrics_path: Option<String>,
    /// Optional exporter port.
    pub port: Option<u16>,
}

impl DeviceTypeInput {
    /// Resolve defaults and validate required fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the name or job name is blank, if an
    /// explicit metrics path does not start with `/`, or if an explicit port
    /// is 0.
    pub fn resolve(self, defaults: &Defaults) -> Result<NewDeviceType> {
        let name = required("name", self.name)?;
        let job_name = required("job_name", self.job_name)?;

        let metrics_path = self
            .metrics_path
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| defaults.metrics_path.clone());
        if !metrics_path.starts_with('/') {
            return Err(Error::invalid_input(
                "metrics_path",
                format!("must start with '/', got '{metrics_path}'"),
            ));
        }

        let port = self.port.unwrap_or(defaults.port);
        if port == 0 {
            return Err(Error::invalid_input("port", "must be greater than 0"));
        }

        Ok(NewDeviceType {
            name,
            job_name,
            metrics_path,
            port,
        })
    }
}

fn required(field: &'static str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_input(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// A fully resolved device type ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeviceType {
    /// Display name.
    pub name: String,
    /// Prometheus job name.
    pub job_name: String,
    /// Metrics endpoint path.
    pub metrics_path: String,
    /// Exporter port.
    pub port: u16,
}

/// A new event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    /// Display name.
    pub name: String,
    /// Free-form date text.
    pub date: Option<String>,
}

impl NewEvent {
    /// Build a new event, rejecting a blank name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the name is blank.
    pub fn new(name: impl Into<String>, date: Option<String>) -> Result<Self> {
        Ok(Self {
            name: required("name", name.into())?,
            date: date.filter(|d| !d.trim().is_empty()),
        })
    }
}

/// A new device deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDevice {
    /// The owning event.
    pub event_id: i64,
    /// The device type.
    pub device_type_id: i64,
    /// Exporter address.
    pub ip_address: String,
}

impl NewDevice {
    /// Build a new device, rejecting a blank address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the address is blank.
    pub fn new(event_id: i64, device_type_id: i64, ip_address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            event_id,
            device_type_id,
            ip_address: required("ip_address", ip_address.into())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(metrics_path: Option<&str>, port: Option<u16>) -> DeviceTypeInput {
        DeviceTypeInput {
            name: "Camera".to_string(),
            job_name: "camera".to_string(),
            metrics_path: metrics_path.map(str::to_string),
            port,
        }
    }

    #[test]
    fn test_resolve_applies_defaults() {
        let resolved = input(None, None).resolve(&Defaults::default()).unwrap();
        assert_eq!(resolved.metrics_path, "/metrics");
        assert_eq!(resolved.port, 9100);
    }

    #[test]
    fn test_resolve_empty_metrics_path_uses_default() {
        let resolved = input(Some("  "), None)
            .resolve(&Defaults::default())
            .unwrap();
        assert_eq!(resolved.metrics_path, "/metrics");
    }

    #[test]
    fn test_resolve_keeps_explicit_values() {
        let resolved = input(Some(" /exporter "), Some(9115))
            .resolve(&Defaults::default())
            .unwrap();
        assert_eq!(resolved.metrics_path, "/exporter");
        assert_eq!(resolved.port, 9115);
    }

    #[test]
    fn test_resolve_rejects_relative_metrics_path() {
        let err = input(Some("metrics"), None)
            .resolve(&Defaults::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput {
                field: "metrics_path",
                ..
            }
        ));
    }

    #[test]
    fn test_resolve_rejects_zero_port() {
        let err = input(None, Some(0))
            .resolve(&Defaults::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { field: "port", .. }));
    }

    #[test]
    fn test_resolve_uses_custom_defaults() {
        let defaults = Defaults {
            metrics_path: "/stats".to_string(),
            port: 8080,
        };
        let resolved = input(None, None).resolve(&defaults).unwrap();
        assert_eq!(resolved.metrics_path, "/stats");
        assert_eq!(resolved.port, 8080);
    }

    #[test]
    fn test_resolve_trims_names() {
        let mut raw = input(None, None);
        raw.name = "  Camera ".to_string();
        let resolved = raw.resolve(&Defaults::default()).unwrap();
        assert_eq!(resolved.name, "Camera");
    }

    #[test]
    fn test_resolve_rejects_blank_name() {
        let mut raw = input(None, None);
        raw.name = String::new();
        let err = raw.resolve(&Defaults::default()).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_resolve_rejects_blank_job_name() {
        let mut raw = input(None, None);
        raw.job_name = "   ".to_string();
        let err = raw.resolve(&Defaults::default()).unwrap_err();
        assert!(err.to_string().contains("job_name"));
    }

    #[test]
    fn test_new_event_drops_blank_date() {
        let event = NewEvent::new("Expo", Some(String::new())).unwrap();
        assert!(event.date.is_none());

        let event = NewEvent::new("Expo", Some("2024-01-01".to_string())).unwrap();
        assert_eq!(event.date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_new_event_rejects_blank_name() {
        assert!(NewEvent::new(" ", None).is_err());
    }

    #[test]
    fn test_new_device_rejects_blank_address() {
        assert!(NewDevice::new(1, 1, "").is_err());
        assert!(NewDevice::new(1, 1, "10.0.0.1").is_ok());
    }

    #[test]
    fn test_default_defaults() {
        let defaults = Defaults::default();
        assert_eq!(defaults.metrics_path, DEFAULT_METRICS_PATH);
        assert_eq!(defaults.port, DEFAULT_PORT);
    }
}
