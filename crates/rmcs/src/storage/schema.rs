//! `SQLite` schema definitions for rmcs.

/// SQL statement to create the device type catalog.
pub const CREATE_DEVICE_TYPES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS device_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    job_name TEXT NOT NULL,
    metrics_path TEXT NOT NULL DEFAULT '/metrics',
    port INTEGER NOT NULL DEFAULT 9100
)
";

/// SQL statement to create the events table.
pub const CREATE_EVENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    date TEXT,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the devices table.
pub const CREATE_DEVICES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS devices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id INTEGER NOT NULL REFERENCES events(id),
    device_type_id INTEGER NOT NULL REFERENCES device_types(id),
    ip_address TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to index devices by owning event.
pub const CREATE_DEVICE_EVENT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_devices_event ON devices(event_id)
";

/// SQL statement to index devices by device type.
pub const CREATE_DEVICE_TYPE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_devices_type ON devices(device_type_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_DEVICE_TYPES_TABLE,
    CREATE_EVENTS_TABLE,
    CREATE_DEVICES_TABLE,
    CREATE_DEVICE_EVENT_INDEX,
    CREATE_DEVICE_TYPE_INDEX,
    CREATE_METADATA_TABLE,
];
