//! Sysbus CLI
//!
//! Talks to the sysbus interface of a Livebox router. Provides:
//! - Default: print the device time
//! - Generic calls: `sysbus <target> [name=value ...]`
//! - Shortcuts and subcommands for common queries and settings

mod commands;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use sysbus_core::config::{Config, Directories, Overrides};
use sysbus_core::shortcuts;
use sysbus_rpc::{Authenticator, HttpTransport, SessionStore, SysbusClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Sysbus CLI
#[derive(Parser, Debug)]
#[command(name = "sysbus")]
#[command(about = "Query and configure a Livebox router through its sysbus interface")]
#[command(version)]
#[command(after_help = "\
Examples:
  sysbus config --password 1234ABCD      Save the connection settings
  sysbus                                  Print the device time
  sysbus sysbus.DeviceInfo:get            Call a method
  sysbus Devices.Device.HGW:get flag=     Call with parameters
  sysbus 'NeMo.Intf.wl1.getParameters(name=\"NetDevIndex\", traverse=\"down\")'
  sysbus --raw NMC:getWANStatus           Print the body as received
  sysbus list                             List the shortcuts
  sysbus wifistate                        Run a shortcut
  sysbus model NeMo.Intf.lan 1            Show part of the datamodel
")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Base URL of the device
    #[arg(long, global = true)]
    url: Option<String>,

    /// Login user
    #[arg(long, global = true)]
    user: Option<String>,

    /// Login password
    #[arg(long, global = true)]
    password: Option<String>,

    /// Configuration file to use instead of the per-user one
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Do not authenticate before sending requests
    #[arg(long, global = true)]
    noauth: bool,

    /// Print response bodies as received
    #[arg(long, global = true)]
    raw: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Write the configuration file (with --url, --user, --password)
    Config,

    /// List the shortcut calls
    List,

    /// List sysbus references found in scripts.js
    Scan {
        /// Files to scan instead of scripts.js
        files: Vec<PathBuf>,
    },

    /// Split scripts.js into its modules under web/js/
    Files,

    /// Show software version, uptime, addresses and phone numbers
    Info,

    /// Show the Wi-Fi networks and their passphrases
    Wifi,

    /// Rename a device
    Setname {
        mac: String,
        name: String,
        /// Name sources to update (all by default)
        sources: Vec<String>,
    },

    /// Show a device
    Getdev { mac: String },

    /// Show the static DHCP leases
    Dhcp,

    /// Add a static DHCP lease
    Adddhcp { mac: String, ip: String },

    /// Remove static DHCP leases ("all" removes every lease)
    Deldhcp {
        #[arg(required = true)]
        macs: Vec<String>,
    },

    /// List the hosts, or show those matching a MAC, client id or IP
    Hosts { filters: Vec<String> },

    /// List the hosts with a global IPv6 address
    Ipv6,

    /// Show the datamodel ("raw" saves it to model.json)
    Model {
        /// Object under sysbus, or "raw"
        path: Option<String>,
        /// Levels to descend (unlimited by default)
        #[arg(allow_negative_numbers = true)]
        depth: Option<i32>,
    },

    /// Query interface MIBs: show, dump, save, or INTF [MIB]
    Mibs {
        target: Option<String>,
        mib: Option<String>,
    },

    /// Forward UDP port 1701 (L2TP) to an internal address
    Add1701 { ip: String },

    /// Draw the interface graph as a DOT file
    Graph,

    /// Draw the network topology (devices.dot)
    Topo {
        /// Label devices with their name only
        #[arg(long)]
        simple: bool,
    },

    /// Shortcut name, or call target followed by name=value parameters
    #[command(external_subcommand)]
    Call(Vec<String>),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,sysbus={level},sysbus_rpc={level},sysbus_core={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .init();
}

/// 2 for configuration problems, 1 for everything else.
fn exit_status(err: &anyhow::Error) -> u8 {
    let config_error = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sysbus_core::Error>(),
            Some(sysbus_core::Error::NotConfigured { .. } | sysbus_core::Error::Config(_))
        )
    });
    if config_error { 2 } else { 1 }
}

fn run(cli: Cli) -> Result<()> {
    let overrides = Overrides {
        url: cli.url,
        user: cli.user,
        password: cli.password,
    };
    let config_path = match cli.config {
        Some(path) => path,
        None => Directories::new()?.config_file,
    };

    // config, list, scan and files never log in and accept a missing file
    let lenient = || -> Result<Config> {
        Ok(Config::load(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?
            .with_overrides(&overrides))
    };
    let device = || -> Result<SysbusClient> {
        connect(&load_required(&config_path, &overrides)?, cli.noauth)
    };

    let Some(command) = cli.command else {
        commands::device_time(&device()?);
        return Ok(());
    };

    match command {
        Commands::Config => commands::write_config(&config_path, &lenient()?)?,
        Commands::List => commands::list_shortcuts(),
        Commands::Scan { files } => commands::scan(&lenient()?, &files)?,
        Commands::Files => commands::extract_files(&lenient()?)?,
        Commands::Info => commands::info(&device()?),
        Commands::Wifi => commands::wifi(&device()?),
        Commands::Setname { mac, name, sources } => {
            commands::set_name(&device()?, &mac, &name, &sources);
        }
        Commands::Getdev { mac } => commands::get_device(&device()?, &mac),
        Commands::Dhcp => commands::dhcp(&device()?),
        Commands::Adddhcp { mac, ip } => commands::add_dhcp(&device()?, &mac, &ip),
        Commands::Deldhcp { macs } => commands::delete_dhcp(&device()?, &macs),
        Commands::Hosts { filters } => commands::hosts(&device()?, &filters),
        Commands::Ipv6 => commands::ipv6(&device()?),
        Commands::Model { path, depth } => commands::model(&device()?, path.as_deref(), depth)?,
        Commands::Mibs { target, mib } => {
            commands::mibs(&device()?, target.as_deref(), mib.as_deref())?;
        }
        Commands::Add1701 { ip } => commands::add_l2tp_forwarding(&device()?, &ip),
        Commands::Graph => commands::interface_graph(&device()?)?,
        Commands::Topo { simple } => commands::topology(&device()?, simple)?,
        Commands::Call(args) => {
            let (target, params) = args.split_first().context("missing call target")?;
            match shortcuts::find(target) {
                Some(shortcut) => {
                    if !params.is_empty() {
                        bail!("shortcut '{target}' takes no parameters");
                    }
                    commands::shortcut(&device()?, shortcut, cli.raw)?;
                }
                None => commands::call(&device()?, target, params, cli.raw)?,
            }
        }
    }
    Ok(())
}

fn load_required(path: &std::path::Path, overrides: &Overrides) -> Result<Config> {
    Ok(Config::load_required(path, overrides)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        .with_overrides(overrides))
}

/// Build a client for the configured device, logged in unless `noauth`.
fn connect(config: &Config, noauth: bool) -> Result<SysbusClient> {
    let transport = HttpTransport::new(&config.url, config.timeout())
        .with_context(|| format!("Failed to set up HTTP client for {}", config.url))?;
    let mut client = SysbusClient::new(transport);

    if noauth {
        info!("Skipping authentication");
        return Ok(client);
    }

    let authenticator = Authenticator::new(config.credentials(), SessionStore::default());
    let session = authenticator
        .authenticate(&mut client)
        .with_context(|| format!("Cannot log into {} as {}", config.url, config.user))?;
    if session.is_restored() {
        info!("Reusing saved session for {}", config.user);
    } else {
        info!("Logged into {} as {}", config.url, config.user);
    }
    Ok(client)
}
