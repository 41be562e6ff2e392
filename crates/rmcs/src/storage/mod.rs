//! Storage layer for rmcs.
//!
//! This module provides `SQLite`-based persistent storage for device types,
//! events, and deployed devices. Readers get owned snapshots back, never live
//! handles, so callers such as the scrape builder work on plain values.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Device, DeviceType, Event, EventSnapshot, NewDevice, NewDeviceType, NewEvent};
use crate::scrape::{self, ScrapeDocument};

/// Record store for the device type catalog, events, and devices.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // === Device types ===

    /// Add a device type to the catalog and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateDeviceType`] if the name is taken, or an error
    /// if the database operation fails.
    pub fn insert_device_type(&self, device_type: &NewDeviceType) -> Result<i64> {
        self.ensure_name_free(&device_type.name, None)?;

        self.conn.execute(
            r"
            INSERT INTO device_types (name, job_name, metrics_path, port)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![
                device_type.name,
                device_type.job_name,
                device_type.metrics_path,
                device_type.port,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!("Created device type {} ({})", id, device_type.name);
        Ok(id)
    }

    /// Replace every field of an existing device type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceTypeNotFound`] for an unknown id,
    /// [`Error::DuplicateDeviceType`] if another type already has the name, or
    /// an error if the database operation fails.
    pub fn update_device_type(&self, id: i64, device_type: &NewDeviceType) -> Result<()> {
        if self.get_device_type(id)?.is_none() {
            return Err(Error::DeviceTypeNotFound { id });
        }
        self.ensure_name_free(&device_type.name, Some(id))?;

        self.conn.execute(
            r"
            UPDATE device_types
            SET name = ?1, job_name = ?2, metrics_path = ?3, port = ?4
            WHERE id = ?5
            ",
            params![
                device_type.name,
                device_type.job_name,
                device_type.metrics_path,
                device_type.port,
                id,
            ],
        )?;

        info!("Updated device type {} ({})", id, device_type.name);
        Ok(())
    }

    fn ensure_name_free(&self, name: &str, except_id: Option<i64>) -> Result<()> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM device_types WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(id) if Some(id) != except_id => Err(Error::DuplicateDeviceType {
                name: name.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Get a device type by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_device_type(&self, id: i64) -> Result<Option<DeviceType>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, name, job_name, metrics_path, port FROM device_types WHERE id = ?1",
                [id],
                Self::row_to_device_type,
            )
            .optional()?;
        Ok(result)
    }

    /// The full device type catalog, by ascending id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_device_types(&self) -> Result<Vec<DeviceType>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, job_name, metrics_path, port FROM device_types ORDER BY id ASC",
        )?;

        let types = stmt
            .query_map([], Self::row_to_device_type)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(types)
    }

    // === Events ===

    /// Create an event and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_event(&self, event: &NewEvent) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO events (name, date, created_at) VALUES (?1, ?2, ?3)",
            params![event.name, event.date, Utc::now().to_rfc3339()],
        )?;

        let id = self.conn.last_insert_rowid();
        info!("Created event {} ({})", id, event.name);
        Ok(id)
    }

    /// Get an event by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_event(&self, id: i64) -> Result<Option<Event>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, name, date, created_at FROM events WHERE id = ?1",
                [id],
                Self::row_to_event,
            )
            .optional()?;
        Ok(result)
    }

    /// All events, by ascending id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_events(&self) -> Result<Vec<Event>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, date, created_at FROM events ORDER BY id ASC")?;

        let events = stmt
            .query_map([], Self::row_to_event)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    // === Devices ===

    /// Deploy a device at an event and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventNotFound`] or [`Error::DeviceTypeNotFound`] if
    /// either reference is unknown, or an error if the database operation fails.
    pub fn add_device(&self, device: &NewDevice) -> Result<i64> {
        if self.get_event(device.event_id)?.is_none() {
            return Err(Error::EventNotFound {
                id: device.event_id,
            });
        }
        if self.get_device_type(device.device_type_id)?.is_none() {
            return Err(Error::DeviceTypeNotFound {
                id: device.device_type_id,
            });
        }

        self.conn.execute(
            r"
            INSERT INTO devices (event_id, device_type_id, ip_address, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![
                device.event_id,
                device.device_type_id,
                device.ip_address,
                Utc::now().to_rfc3339(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!(
            "Added device {} ({}) to event {}",
            id, device.ip_address, device.event_id
        );
        Ok(id)
    }

    /// Devices deployed at an event, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn devices_for_event(&self, event_id: i64) -> Result<Vec<Device>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, event_id, device_type_id, ip_address, created_at
            FROM devices WHERE event_id = ?1 ORDER BY id ASC
            ",
        )?;

        let devices = stmt
            .query_map([event_id], Self::row_to_device)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(devices)
    }

    /// An event together with its devices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventNotFound`] for an unknown id, or an error if the
    /// database operation fails.
    pub fn event_snapshot(&self, event_id: i64) -> Result<EventSnapshot> {
        let event = self
            .get_event(event_id)?
            .ok_or(Error::EventNotFound { id: event_id })?;
        let devices = self.devices_for_event(event_id)?;
        Ok(EventSnapshot { event, devices })
    }

    /// Build the scrape config for an event from the current store contents.
    ///
    /// With `strict` set, a device whose device type is missing fails the
    /// build instead of being left out.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventNotFound`] for an unknown id,
    /// [`Error::DanglingDeviceType`] in strict mode, or an error if the
    /// database operation fails.
    pub fn scrape_config_for_event(&self, event_id: i64, strict: bool) -> Result<ScrapeDocument> {
        let snapshot = self.event_snapshot(event_id)?;
        let catalog = self.list_device_types()?;

        if strict {
            scrape::build_scrape_config_strict(&catalog, &snapshot)
        } else {
            Ok(scrape::build_scrape_config(&catalog, &snapshot))
        }
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let count = |table: &str| -> Result<i64> {
            let n = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?;
            Ok(n)
        };

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            device_types: count("device_types")?,
            events: count("events")?,
            devices: count("devices")?,
            db_size_bytes,
        })
    }

    fn row_to_device_type(row: &rusqlite::Row) -> rusqlite::Result<DeviceType> {
        Ok(DeviceType {
            id: row.get(0)?,
            name: row.get(1)?,
            job_name: row.get(2)?,
            metrics_path: row.get(3)?,
            port: row.get(4)?,
        })
    }

    fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<Event> {
        let created_at: String = row.get(3)?;
        Ok(Event {
            id: row.get(0)?,
            name: row.get(1)?,
            date: row.get(2)?,
            created_at: parse_timestamp(&created_at),
        })
    }

    fn row_to_device(row: &rusqlite::Row) -> rusqlite::Result<Device> {
        let created_at: String = row.get(4)?;
        Ok(Device {
            id: row.get(0)?,
            event_id: row.get(1)?,
            device_type_id: row.get(2)?,
            ip_address: row.get(3)?,
            created_at: parse_timestamp(&created_at),
        })
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

/// Record counts and file size of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of device types in the catalog.
    pub device_types: i64,
    /// Number of events.
    pub events: i64,
    /// Number of deployed devices across all events.
    pub devices: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
