//! `rmcs` - CLI for event device records and scrape config generation

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;

use rmcs::cli::{
    Cli, Command, ConfigCommand, DeviceCommand, DeviceTypeCommand, EventCommand,
    ScrapeConfigCommand,
};
use rmcs::model::{DeviceTypeInput, NewDevice, NewEvent};
use rmcs::{init_logging, scrape, Config, Storage};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::DeviceType(cmd) => handle_device_type(&config, cmd),
        Command::Event(cmd) => handle_event(&config, cmd),
        Command::Device(cmd) => handle_device(&config, &cmd),
        Command::ScrapeConfig(cmd) => handle_scrape_config(&config, &cmd),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_storage(config: &Config) -> Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("failed to open {}", path.display()))
}

fn handle_device_type(config: &Config, cmd: DeviceTypeCommand) -> Result<()> {
    let storage = open_storage(config)?;

    match cmd {
        DeviceTypeCommand::List { json } => {
            let types = storage.list_device_types()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&types)?);
            } else if types.is_empty() {
                println!("No device types.");
            } else {
                println!("  ID  NAME                 JOB                  PATH              PORT");
                for t in types {
                    println!(
                        "{:>4}  {:<20} {:<20} {:<16} {:>5}",
                        t.id, t.name, t.job_name, t.metrics_path, t.port
                    );
                }
            }
        }
        DeviceTypeCommand::Add(args) => {
            let new_type = DeviceTypeInput::from(args).resolve(&config.defaults)?;
            let id = storage.insert_device_type(&new_type)?;
            println!("Created device type {id} ({})", new_type.name);
        }
        DeviceTypeCommand::Edit { id, fields } => {
            let new_type = DeviceTypeInput::from(fields).resolve(&config.defaults)?;
            storage.update_device_type(id, &new_type)?;
            println!("Updated device type {id}");
        }
    }
    Ok(())
}

fn handle_event(config: &Config, cmd: EventCommand) -> Result<()> {
    let storage = open_storage(config)?;

    match cmd {
        EventCommand::List { json } => {
            let events = storage.list_events()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else if events.is_empty() {
                println!("No events.");
            } else {
                println!("  ID  NAME                             DATE");
                for e in events {
                    println!(
                        "{:>4}  {:<32} {}",
                        e.id,
                        e.name,
                        e.date.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        EventCommand::Add { name, date } => {
            let id = storage.insert_event(&NewEvent::new(name, date)?)?;
            println!("Created event {id}");
        }
        EventCommand::Show { id, json } => {
            let snapshot = storage.event_snapshot(id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
                return Ok(());
            }

            let catalog = storage.list_device_types()?;
            println!("Event {}: {}", snapshot.event.id, snapshot.event.name);
            println!(
                "Date:    {}",
                snapshot.event.date.as_deref().unwrap_or("-")
            );
            println!("Devices: {}", snapshot.device_count());
            for device in &snapshot.devices {
                let type_name = catalog
                    .iter()
                    .find(|t| t.id == device.device_type_id)
                    .map_or("<unknown type>", |t| t.name.as_str());
                println!("  {:>4}  {:<20} {}", device.id, type_name, device.ip_address);
            }
        }
    }
    Ok(())
}

fn handle_device(config: &Config, cmd: &DeviceCommand) -> Result<()> {
    let storage = open_storage(config)?;

    match cmd {
        DeviceCommand::Add {
            event_id,
            type_id,
            ip,
        } => {
            let id = storage.add_device(&NewDevice::new(*event_id, *type_id, ip.as_str())?)?;
            println!("Added device {id} to event {event_id}");
        }
    }
    Ok(())
}

fn handle_scrape_config(config: &Config, cmd: &ScrapeConfigCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let strict = config.strict_scrape(cmd.strict);

    let document = storage.scrape_config_for_event(cmd.event_id, strict)?;
    print!("{}", scrape::render(&document, cmd.format.into())?);
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "device_types": stats.device_types,
            "events": stats.events,
            "devices": stats.devices,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("rmcs status");
        println!("-----------");
        println!("Database:      {}", storage.path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Device types:  {}", stats.device_types);
        println!("Events:        {}", stats.events);
        println!("Devices:       {}", stats.devices);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Defaults]");
                println!("  Metrics path:       {}", config.defaults.metrics_path);
                println!("  Port:               {}", config.defaults.port);
                println!();
                println!("[Scrape]");
                println!(
                    "  Strict references:  {}",
                    config.scrape.strict_references
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
