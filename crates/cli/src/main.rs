//! nvmectl
//!
//! Command-line NVMe device management: discovery, identify, log pages,
//! features, admin maintenance, dataset management, FDP operations, and raw
//! command passthrough.

mod backend;
mod config;
mod dispatch;
mod render;

use std::path::PathBuf;
use std::process::exit;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::{DeviceOptions, Error, NvmeDevice, setup_logging};
use config::CliConfig;
use tracing::{debug, error};

use dispatch::{admin, dsm, fdp, feature, identify, listing, log, pass};

#[derive(Parser, Debug)]
#[command(name = "nvmectl")]
#[command(author, version, about = "NVMe device management tool")]
#[command(long_about = "
Manage NVMe devices: enumerate, identify, read log pages, get and set
features, format, sanitize, manage datasets and flexible data placement,
or pass raw 64-byte commands straight through.

EXAMPLES:
    # List devices
    nvmectl list

    # Identify the namespace behind a device handle
    nvmectl idfy-ns /dev/nvme0n1

    # Dump the error log sized from the controller's own bound
    nvmectl log-erri /dev/nvme0n1

    # Pass a raw admin command loaded from a file
    nvmectl padc /dev/nvme0n1 --cmd-input cmd.bin --data-nbytes 4096 -o out.bin

CONFIGURATION:
    Defaults are read from ~/.config/nvmectl/config.toml or
    /etc/nvmectl.toml; --config overrides the search.
")]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Device backend to use
    #[arg(long, global = true, value_name = "NAME")]
    backend: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect and print a listing of devices
    List {
        /// Only include devices whose URI starts with this prefix
        #[arg(long)]
        filter: Option<String>,
    },

    /// Print device identities one by one as they are discovered
    Enum {
        /// Only include devices whose URI starts with this prefix
        #[arg(long)]
        filter: Option<String>,
    },

    /// Print identity and capabilities of one device
    Info { uri: Option<String> },

    /// Identify with caller-chosen selectors
    Idfy {
        uri: Option<String>,
        #[command(flatten)]
        args: identify::IdentifyArgs,
    },

    /// Identify the namespace
    IdfyNs {
        uri: Option<String>,
        /// Namespace identifier; defaults to the device's namespace
        #[arg(long)]
        nsid: Option<u32>,
        /// Write the raw structure to this path
        #[arg(short = 'o', long = "data-output")]
        data_output: Option<PathBuf>,
    },

    /// Identify the controller
    IdfyCtrlr {
        uri: Option<String>,
        /// Write the raw structure to this path
        #[arg(short = 'o', long = "data-output")]
        data_output: Option<PathBuf>,
    },

    /// Identify the I/O command sets
    IdfyCs {
        uri: Option<String>,
        /// Write the raw structure to this path
        #[arg(short = 'o', long = "data-output")]
        data_output: Option<PathBuf>,
    },

    /// Retrieve a user-defined log page
    Log {
        uri: Option<String>,
        #[command(flatten)]
        args: log::LogArgs,
    },

    /// Retrieve the error-information log
    LogErri {
        uri: Option<String>,
        /// Namespace identifier; defaults to the device's namespace
        #[arg(long)]
        nsid: Option<u32>,
        /// Entry count; defaults to the controller's reported bound
        #[arg(long)]
        limit: Option<u32>,
        /// Write the raw log page to this path
        #[arg(short = 'o', long = "data-output")]
        data_output: Option<PathBuf>,
    },

    /// Retrieve the SMART / health information log
    LogHealth {
        uri: Option<String>,
        /// Namespace identifier; defaults to the device's namespace
        #[arg(long)]
        nsid: Option<u32>,
        /// Write the raw log page to this path
        #[arg(short = 'o', long = "data-output")]
        data_output: Option<PathBuf>,
    },

    /// Retrieve the FDP configurations log
    LogFdpConfig {
        uri: Option<String>,
        #[command(flatten)]
        args: log::FdpLogArgs,
        /// Transfer size in bytes; the page shape varies per device
        #[arg(long = "data-nbytes")]
        data_nbytes: u32,
    },

    /// Retrieve the reclaim-unit-handle usage log
    LogRuhu {
        uri: Option<String>,
        #[command(flatten)]
        args: log::FdpLogArgs,
        /// Number of usage descriptors to request
        #[arg(long)]
        limit: u32,
    },

    /// Retrieve the FDP statistics log
    LogFdpStats {
        uri: Option<String>,
        #[command(flatten)]
        args: log::FdpLogArgs,
    },

    /// Retrieve the FDP events log
    LogFdpEvents {
        uri: Option<String>,
        #[command(flatten)]
        args: log::FdpLogArgs,
        /// Number of event entries to request
        #[arg(long)]
        limit: u32,
        /// Log specific parameter; 0x1 selects host events
        #[arg(long, default_value_t = 0x1)]
        lsp: u8,
    },

    /// Get a feature value
    FeatureGet {
        uri: Option<String>,
        #[command(flatten)]
        args: feature::GetFeatureArgs,
    },

    /// Set a feature value
    FeatureSet {
        uri: Option<String>,
        #[command(flatten)]
        args: feature::SetFeatureArgs,
    },

    /// Enable the well-known FDP event types
    SetFdpEvents {
        uri: Option<String>,
        #[command(flatten)]
        args: fdp::SetFdpEventsArgs,
    },

    /// Format a namespace
    Format {
        uri: Option<String>,
        #[command(flatten)]
        args: admin::FormatArgs,
    },

    /// Start a sanitize operation
    Sanitize {
        uri: Option<String>,
        #[command(flatten)]
        args: admin::SanitizeArgs,
    },

    /// Retrieve reclaim-unit-handle status descriptors
    FdpRuhs {
        uri: Option<String>,
        /// Namespace identifier; defaults to the device's namespace
        #[arg(long)]
        nsid: Option<u32>,
        /// Number of status descriptors to request
        #[arg(long)]
        limit: u32,
    },

    /// Update the reclaim unit handle for one placement identifier
    FdpRuhu {
        uri: Option<String>,
        /// Namespace identifier; defaults to the device's namespace
        #[arg(long)]
        nsid: Option<u32>,
        /// Placement identifier to update
        #[arg(long)]
        pid: u16,
    },

    /// Deallocate a range via dataset management
    Dsm {
        uri: Option<String>,
        #[command(flatten)]
        args: dsm::DsmArgs,
    },

    /// Pass a raw command through the I/O queue
    Pioc {
        uri: Option<String>,
        #[command(flatten)]
        args: pass::PassArgs,
    },

    /// Pass a raw command through the admin queue
    Padc {
        uri: Option<String>,
        #[command(flatten)]
        args: pass::PassArgs,
    },

    /// Print tool version and compiled-in backends
    LibraryInfo,
}

fn open_device(
    uri: Option<String>,
    cfg: &CliConfig,
    opts: &DeviceOptions,
) -> common::Result<Box<dyn NvmeDevice>> {
    let uri = uri
        .or_else(|| cfg.device.default_uri.clone())
        .ok_or_else(|| {
            Error::InvalidArgument("no device uri given and none configured".into())
        })?;
    debug!("opening device '{uri}'");
    backend::open(&uri, opts)
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.save_config {
        let cfg = CliConfig::default();
        let path = CliConfig::default_path();
        cfg.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let cfg = if let Some(ref path) = cli.config {
        CliConfig::load(Some(config::expand_path(path)))
            .context("Failed to load configuration")?
    } else {
        CliConfig::load_or_default(None)
    };

    let log_level = cli.log_level.as_deref().unwrap_or(&cfg.tool.log_level);
    setup_logging(log_level).context("Failed to setup logging")?;

    let opts = DeviceOptions {
        backend: cli.backend.clone().or_else(|| cfg.device.backend.clone()),
    };

    let Some(command) = cli.command else {
        return Err(Error::InvalidArgument("no command given; see --help".into()).into());
    };

    match command {
        Command::List { filter } => {
            let filter = filter.or_else(|| cfg.device.filter.clone());
            listing::list(backend::driver(&opts)?.as_ref(), filter.as_deref(), &opts)?
        }
        Command::Enum { filter } => {
            let filter = filter.or_else(|| cfg.device.filter.clone());
            listing::enumerate(backend::driver(&opts)?.as_ref(), filter.as_deref(), &opts)?
        }
        Command::Info { uri } => listing::info(open_device(uri, &cfg, &opts)?.as_ref())?,
        Command::Idfy { uri, args } => {
            identify::identify(open_device(uri, &cfg, &opts)?.as_mut(), &args)?
        }
        Command::IdfyNs {
            uri,
            nsid,
            data_output,
        } => identify::identify_ns(open_device(uri, &cfg, &opts)?.as_mut(), nsid, data_output)?,
        Command::IdfyCtrlr { uri, data_output } => {
            identify::identify_ctrlr(open_device(uri, &cfg, &opts)?.as_mut(), data_output)?
        }
        Command::IdfyCs { uri, data_output } => {
            identify::identify_cs(open_device(uri, &cfg, &opts)?.as_mut(), data_output)?
        }
        Command::Log { uri, args } => log::log(open_device(uri, &cfg, &opts)?.as_mut(), &args)?,
        Command::LogErri {
            uri,
            nsid,
            limit,
            data_output,
        } => log::log_erri(
            open_device(uri, &cfg, &opts)?.as_mut(),
            nsid,
            limit,
            data_output,
        )?,
        Command::LogHealth {
            uri,
            nsid,
            data_output,
        } => log::log_health(open_device(uri, &cfg, &opts)?.as_mut(), nsid, data_output)?,
        Command::LogFdpConfig {
            uri,
            args,
            data_nbytes,
        } => log::log_fdp_config(open_device(uri, &cfg, &opts)?.as_mut(), &args, data_nbytes)?,
        Command::LogRuhu { uri, args, limit } => {
            log::log_ruhu(open_device(uri, &cfg, &opts)?.as_mut(), &args, limit)?
        }
        Command::LogFdpStats { uri, args } => {
            log::log_fdp_stats(open_device(uri, &cfg, &opts)?.as_mut(), &args)?
        }
        Command::LogFdpEvents {
            uri,
            args,
            limit,
            lsp,
        } => log::log_fdp_events(open_device(uri, &cfg, &opts)?.as_mut(), &args, limit, lsp)?,
        Command::FeatureGet { uri, args } => {
            feature::get_feature(open_device(uri, &cfg, &opts)?.as_mut(), &args)?
        }
        Command::FeatureSet { uri, args } => {
            feature::set_feature(open_device(uri, &cfg, &opts)?.as_mut(), &args)?
        }
        Command::SetFdpEvents { uri, args } => {
            fdp::set_fdp_events(open_device(uri, &cfg, &opts)?.as_mut(), &args)?
        }
        Command::Format { uri, args } => {
            admin::format(open_device(uri, &cfg, &opts)?.as_mut(), &args)?
        }
        Command::Sanitize { uri, args } => {
            admin::sanitize(open_device(uri, &cfg, &opts)?.as_mut(), &args)?
        }
        Command::FdpRuhs { uri, nsid, limit } => {
            fdp::ruhs(open_device(uri, &cfg, &opts)?.as_mut(), nsid, limit)?
        }
        Command::FdpRuhu { uri, nsid, pid } => {
            fdp::ruhu(open_device(uri, &cfg, &opts)?.as_mut(), nsid, pid)?
        }
        Command::Dsm { uri, args } => dsm::dsm(open_device(uri, &cfg, &opts)?.as_mut(), &args)?,
        Command::Pioc { uri, args } => {
            pass::pass(open_device(uri, &cfg, &opts)?.as_mut(), &args, false)?
        }
        Command::Padc { uri, args } => {
            pass::pass(open_device(uri, &cfg, &opts)?.as_mut(), &args, true)?
        }
        Command::LibraryInfo => listing::library_info()?,
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        match e.downcast_ref::<Error>() {
            Some(err) => {
                error!("{e:#}");
                exit(err.exit_code());
            }
            None => {
                eprintln!("Error: {e:#}");
                exit(1);
            }
        }
    }
}
