//! Prometheus scrape configuration generation.
//!
//! The builder groups an event's devices by device type and emits one scrape
//! job per type that has at least one device. It is a pure function of its
//! inputs: nothing is cached and nothing is mutated, so a fresh document is
//! built on every call.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{Device, DeviceType, EventSnapshot};

/// A scrape configuration document.
///
/// Serializes to the `scrape_configs` section of a Prometheus configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeDocument {
    /// One job per device type in use, in catalog order.
    pub scrape_configs: Vec<ScrapeJob>,
}

impl ScrapeDocument {
    /// Check whether the document contains no jobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scrape_configs.is_empty()
    }

    /// Total number of targets across all jobs.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.scrape_configs
            .iter()
            .flat_map(|job| &job.static_configs)
            .map(|group| group.targets.len())
            .sum()
    }
}

/// A single scrape job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeJob {
    /// Job name, taken from the device type.
    pub job_name: String,
    /// Metrics path, taken from the device type.
    pub metrics_path: String,
    /// Target groups. The builder always emits exactly one.
    pub static_configs: Vec<StaticConfig>,
}

/// A static target group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticConfig {
    /// `host:port` targets in device insertion order.
    pub targets: Vec<String>,
}

/// Build the scrape configuration for an event.
///
/// `catalog` is iterated in the order given; the catalog accessor in
/// [`crate::Storage`] returns it by ascending id. Devices whose device type is
/// not in `catalog` match no job and are left out of the document; each one is
/// reported as a warning.
#[must_use]
pub fn build_scrape_config(catalog: &[DeviceType], snapshot: &EventSnapshot) -> ScrapeDocument {
    for device in dangling_devices(catalog, &snapshot.devices) {
        warn!(
            event_id = snapshot.event.id,
            device_id = device.id,
            device_type_id = device.device_type_id,
            "Device references unknown device type, leaving it out of scrape config"
        );
    }
    group_by_type(catalog, &snapshot.devices)
}

/// Build the scrape configuration, rejecting devices with unknown types.
///
/// # Errors
///
/// Returns [`Error::DanglingDeviceType`] for the first device (in insertion
/// order) whose device type is not in `catalog`.
pub fn build_scrape_config_strict(
    catalog: &[DeviceType],
    snapshot: &EventSnapshot,
) -> Result<ScrapeDocument> {
    if let Some(device) = dangling_devices(catalog, &snapshot.devices).next() {
        return Err(Error::DanglingDeviceType {
            device_id: device.id,
            device_type_id: device.device_type_id,
        });
    }
    Ok(group_by_type(catalog, &snapshot.devices))
}

fn group_by_type(catalog: &[DeviceType], devices: &[Device]) -> ScrapeDocument {
    let scrape_configs: Vec<ScrapeJob> = catalog
        .iter()
        .filter_map(|device_type| {
            let targets: Vec<String> = devices
                .iter()
                .filter(|d| d.device_type_id == device_type.id)
                .map(|d| format!("{}:{}", d.ip_address, device_type.port))
                .collect();

            if targets.is_empty() {
                return None;
            }

            Some(ScrapeJob {
                job_name: device_type.job_name.clone(),
                metrics_path: device_type.metrics_path.clone(),
                static_configs: vec![StaticConfig { targets }],
            })
        })
        .collect();

    debug!("Built scrape config with {} jobs", scrape_configs.len());
    ScrapeDocument { scrape_configs }
}

fn dangling_devices<'a>(
    catalog: &[DeviceType],
    devices: &'a [Device],
) -> impl Iterator<Item = &'a Device> {
    let known: HashSet<i64> = catalog.iter().map(|t| t.id).collect();
    devices
        .iter()
        .filter(move |d| !known.contains(&d.device_type_id))
}

/// Text format for a rendered scrape document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeFormat {
    /// YAML, as Prometheus reads it.
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

/// Render a scrape document as text.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render(document: &ScrapeDocument, format: ScrapeFormat) -> Result<String> {
    let text = match format {
        ScrapeFormat::Yaml => serde_yaml::to_string(document)?,
        ScrapeFormat::Json => serde_json::to_string_pretty(document)?,
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use super::*;
    use crate::model::Event;

    fn device_type(id: i64, name: &str, port: u16) -> DeviceType {
        DeviceType {
            id,
            name: name.to_string(),
            job_name: name.to_lowercase(),
            metrics_path: "/metrics".to_string(),
            port,
        }
    }

    fn device(id: i64, device_type_id: i64, ip: &str) -> Device {
        Device {
            id,
            event_id: 1,
            device_type_id,
            ip_address: ip.to_string(),
            created_at: Utc::now(),
        }
    }

    fn snapshot(devices: Vec<Device>) -> EventSnapshot {
        EventSnapshot {
            event: Event {
                id: 1,
                name: "Test Event".to_string(),
                date: Some("2024-01-01".to_string()),
                created_at: Utc::now(),
            },
            devices,
        }
    }

    #[test]
    fn test_single_camera() {
        let catalog = vec![device_type(1, "Camera", 9100)];
        let event = snapshot(vec![device(1, 1, "192.168.0.10")]);

        let document = build_scrape_config(&catalog, &event);

        let expected = serde_json::json!({
            "scrape_configs": [{
                "job_name": "camera",
                "metrics_path": "/metrics",
                "static_configs": [{"targets": ["192.168.0.10:9100"]}]
            }]
        });
        assert_eq!(serde_json::to_value(&document).unwrap(), expected);
    }

    #[test]
    fn test_unused_type_has_no_entry() {
        let catalog = vec![device_type(1, "Camera", 9100), device_type(2, "Switch", 9116)];
        let event = snapshot(vec![device(1, 2, "10.0.0.2")]);

        let document = build_scrape_config(&catalog, &event);

        assert_eq!(document.scrape_configs.len(), 1);
        assert_eq!(document.scrape_configs[0].job_name, "switch");
        assert_eq!(
            document.scrape_configs[0].static_configs[0].targets,
            vec!["10.0.0.2:9116"]
        );
    }

    #[test]
    fn test_no_devices() {
        let catalog = vec![device_type(1, "Camera", 9100)];
        let document = build_scrape_config(&catalog, &snapshot(Vec::new()));

        assert!(document.is_empty());
        assert_eq!(
            serde_json::to_value(&document).unwrap(),
            serde_json::json!({"scrape_configs": []})
        );
    }

    #[test]
    fn test_empty_catalog() {
        let event = snapshot(vec![device(1, 1, "10.0.0.1")]);
        let document = build_scrape_config(&[], &event);
        assert!(document.is_empty());
    }

    #[test]
    fn test_job_order_follows_catalog() {
        let catalog = vec![
            device_type(1, "Camera", 9100),
            device_type(2, "Switch", 9116),
            device_type(3, "Sensor", 9200),
        ];
        // Devices inserted in reverse type order.
        let event = snapshot(vec![
            device(1, 3, "10.0.0.3"),
            device(2, 2, "10.0.0.2"),
            device(3, 1, "10.0.0.1"),
        ]);

        let document = build_scrape_config(&catalog, &event);

        let jobs: Vec<&str> = document
            .scrape_configs
            .iter()
            .map(|j| j.job_name.as_str())
            .collect();
        assert_eq!(jobs, vec!["camera", "switch", "sensor"]);
    }

    #[test]
    fn test_target_order_follows_insertion() {
        let catalog = vec![device_type(1, "Camera", 9100), device_type(2, "Switch", 9116)];
        let event = snapshot(vec![
            device(1, 1, "10.0.0.9"),
            device(2, 2, "10.0.1.1"),
            device(3, 1, "10.0.0.1"),
            device(4, 1, "10.0.0.5"),
        ]);

        let document = build_scrape_config(&catalog, &event);

        assert_eq!(
            document.scrape_configs[0].static_configs[0].targets,
            vec!["10.0.0.9:9100", "10.0.0.1:9100", "10.0.0.5:9100"]
        );
        assert_eq!(document.target_count(), 4);
    }

    #[test]
    fn test_entry_count_matches_types_in_use() {
        let catalog: Vec<DeviceType> = (1..=5)
            .map(|id| device_type(id, &format!("Type{id}"), 9100))
            .collect();
        let event = snapshot(vec![
            device(1, 2, "10.0.0.1"),
            device(2, 4, "10.0.0.2"),
            device(3, 2, "10.0.0.3"),
        ]);

        let document = build_scrape_config(&catalog, &event);

        assert_eq!(document.scrape_configs.len(), 2);
        for job in &document.scrape_configs {
            assert_eq!(job.static_configs.len(), 1);
            assert!(!job.static_configs[0].targets.is_empty());
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let catalog = vec![device_type(1, "Camera", 9100), device_type(2, "Switch", 9116)];
        let event = snapshot(vec![device(1, 1, "10.0.0.1"), device(2, 2, "10.0.0.2")]);

        let first = build_scrape_config(&catalog, &event);
        let second = build_scrape_config(&catalog, &event);
        assert_eq!(first, second);
    }

    #[test]
    fn test_dangling_device_is_left_out() {
        let catalog = vec![device_type(1, "Camera", 9100)];
        let event = snapshot(vec![device(1, 1, "10.0.0.1"), device(2, 42, "10.0.0.2")]);

        let document = build_scrape_config(&catalog, &event);

        assert_eq!(document.scrape_configs.len(), 1);
        assert_eq!(document.target_count(), 1);
    }

    struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_dangling_device_is_logged() {
        let catalog = vec![device_type(1, "Camera", 9100)];
        let event = snapshot(vec![device(1, 1, "10.0.0.1"), device(2, 42, "10.0.0.2")]);

        let captured = Arc::new(Mutex::new(Vec::new()));
        let writer = Arc::clone(&captured);
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || CapturedWriter(Arc::clone(&writer)))
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let document =
            tracing::subscriber::with_default(subscriber, || build_scrape_config(&catalog, &event));
        assert_eq!(document.target_count(), 1);

        let output = String::from_utf8(captured.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("unknown device type").count(), 1);
        assert!(output.contains("WARN"));
        assert!(output.contains("device_id=2"));
        assert!(output.contains("device_type_id=42"));
    }

    #[test]
    fn test_strict_does_not_log_dangling_device() {
        let catalog = vec![device_type(1, "Camera", 9100)];
        let event = snapshot(vec![device(2, 42, "10.0.0.2")]);

        let captured = Arc::new(Mutex::new(Vec::new()));
        let writer = Arc::clone(&captured);
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || CapturedWriter(Arc::clone(&writer)))
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let result = tracing::subscriber::with_default(subscriber, || {
            build_scrape_config_strict(&catalog, &event)
        });
        assert!(result.is_err());
        assert!(captured.lock().unwrap().is_empty());
    }

    #[test]
    fn test_strict_rejects_dangling_device() {
        let catalog = vec![device_type(1, "Camera", 9100)];
        let event = snapshot(vec![device(7, 42, "10.0.0.2"), device(8, 43, "10.0.0.3")]);

        let err = build_scrape_config_strict(&catalog, &event).unwrap_err();
        assert!(matches!(
            err,
            Error::DanglingDeviceType {
                device_id: 7,
                device_type_id: 42
            }
        ));
    }

    #[test]
    fn test_strict_matches_lenient_without_dangling() {
        let catalog = vec![device_type(1, "Camera", 9100)];
        let event = snapshot(vec![device(1, 1, "10.0.0.1")]);

        let strict = build_scrape_config_strict(&catalog, &event).unwrap();
        assert_eq!(strict, build_scrape_config(&catalog, &event));
    }

    #[test]
    fn test_render_yaml() {
        let catalog = vec![device_type(1, "Camera", 9100)];
        let event = snapshot(vec![device(1, 1, "192.168.0.10")]);
        let document = build_scrape_config(&catalog, &event);

        let yaml = render(&document, ScrapeFormat::Yaml).unwrap();
        assert!(yaml.starts_with("scrape_configs:"));
        assert!(yaml.contains("job_name: camera"));

        let parsed: ScrapeDocument = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, document);
    }

    #[test]
    fn test_render_yaml_empty() {
        let yaml = render(&ScrapeDocument::default(), ScrapeFormat::Yaml).unwrap();
        assert_eq!(yaml.trim(), "scrape_configs: []");
    }

    #[test]
    fn test_render_yaml_field_order() {
        let catalog = vec![device_type(1, "Camera", 9100)];
        let event = snapshot(vec![device(1, 1, "10.0.0.1")]);
        let yaml = render(&build_scrape_config(&catalog, &event), ScrapeFormat::Yaml).unwrap();

        let job = yaml.find("job_name").unwrap();
        let path = yaml.find("metrics_path").unwrap();
        let statics = yaml.find("static_configs").unwrap();
        assert!(job < path && path < statics);
    }

    #[test]
    fn test_render_json() {
        let json = render(&ScrapeDocument::default(), ScrapeFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!({"scrape_configs": []}));
    }
}
