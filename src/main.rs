//! gmmflash - SPI flash programmer for the GMM-7550 USB-serial bridge
//!
//! The bridge turns every 64-byte write on its CDC port into one SPI
//! transfer and drives chip-select from DTR. On top of that this tool
//! identifies the attached SPI NOR part, resolves page/sector/block
//! addresses against its geometry and runs read, program, erase and verify
//! as bounded, chunked command sequences.
//!
//! # Exit codes
//!
//! - 0: success
//! - 1: usage or range error (address selection, files, device database)
//! - 2: the device is not in the device table
//! - 3: hardware or transport failure

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::{CliError, Context};
use gmmflash_core::chip::{DeviceDatabase, DeviceDbError};
use gmmflash_core::flash::{Mode, SessionOptions};
use gmmflash_core::ErrorClass;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    // Initialize logger; RUST_LOG still overrides the verbosity flags
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.verbose)),
    )
    .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_code(e.as_ref()))
        }
    }
}

/// Default log filter for the number of `-v` flags
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let devices = load_device_database(cli.device_db.as_deref())?;
    log::debug!("{} device definitions", devices.len());

    let ctx = Context {
        port: cli.port,
        options: session_options(cli.dry_run, cli.no_hw, cli.poll_attempts, cli.id_bit_rate),
        devices,
    };

    match cli.command {
        Commands::Id => commands::run_id(&ctx),
        Commands::Read { output, address } => {
            commands::run_read(&ctx, &output, &address.selection())
        }
        Commands::Write {
            input,
            address,
            strict_range,
            verify,
        } => commands::run_write(&ctx, &input, &address.selection(), strict_range, verify),
        Commands::Erase { address } => commands::run_erase(&ctx, &address.selection()),
        Commands::Verify { input, address } => {
            commands::run_verify(&ctx, &input, &address.selection())
        }
        Commands::Load { input } => commands::run_load(&ctx, &input),
    }
}

/// Build the session configuration from the global flags
///
/// `--no-hw` wins over `--dry-run`.
fn session_options(
    dry_run: bool,
    no_hw: bool,
    poll_attempts: u32,
    id_bit_rate: Option<u32>,
) -> SessionOptions {
    let mode = if no_hw {
        Mode::NoHardware
    } else if dry_run {
        Mode::DryRun
    } else {
        Mode::Normal
    };
    SessionOptions {
        id_bit_rate,
        ..SessionOptions::default()
            .with_mode(mode)
            .with_poll_attempts(poll_attempts)
    }
}

/// Built-in rows, extended by the RON file if one was given
fn load_device_database(path: Option<&Path>) -> Result<DeviceDatabase, DeviceDbError> {
    let mut db = DeviceDatabase::with_builtin();
    if let Some(path) = path {
        let count = db.load_file(path)?;
        log::info!("Loaded {} device definitions from {}", count, path.display());
    }
    Ok(db)
}

/// Process exit code for an error
fn exit_code(e: &(dyn Error + 'static)) -> u8 {
    if let Some(e) = e.downcast_ref::<gmmflash_core::Error>() {
        return match e.class() {
            ErrorClass::Usage | ErrorClass::Range => 1,
            ErrorClass::Device => 2,
            ErrorClass::Hardware => 3,
        };
    }
    #[cfg(feature = "serial")]
    {
        use gmmflash_serial::SerialError;
        if let Some(e) = e.downcast_ref::<SerialError>() {
            return match e {
                SerialError::InvalidParameter(_) => 1,
                _ => 3,
            };
        }
    }
    if e.is::<CliError>() || e.is::<DeviceDbError>() {
        return 1;
    }
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(e: impl Error + 'static) -> u8 {
        let boxed: Box<dyn Error> = Box::new(e);
        exit_code(boxed.as_ref())
    }

    #[test]
    fn test_exit_codes_follow_error_class() {
        use gmmflash_core::chip::{IdField, JedecId};
        use gmmflash_core::Error;

        assert_eq!(code(Error::MissingAddress), 1);
        assert_eq!(code(Error::InvalidSelector), 1);
        assert_eq!(
            code(Error::OutOfRange {
                end: 0x100_0000,
                chip_size: 0x100_0000
            }),
            1
        );
        assert_eq!(
            code(Error::UnsupportedDevice {
                field: IdField::Capacity,
                id: JedecId::new(0xEF, 0x40, 0x22)
            }),
            2
        );
        assert_eq!(code(Error::Timeout { attempts: 1000 }), 3);
        assert_eq!(code(Error::Transport), 3);
    }

    #[test]
    fn test_exit_codes_of_cli_errors() {
        assert_eq!(code(CliError::NoSerial), 1);
        assert_eq!(code(DeviceDbError::Validation("bad".into())), 1);
    }

    #[cfg(feature = "serial")]
    #[test]
    fn test_exit_codes_of_serial_errors() {
        use gmmflash_serial::SerialError;
        assert_eq!(code(SerialError::InvalidParameter("x".into())), 1);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no port");
        assert_eq!(code(SerialError::Io(io)), 3);
    }

    #[test]
    fn test_verbosity_sets_log_filter() {
        assert_eq!(log_filter(0), "info");
        assert_eq!(log_filter(1), "debug");
        assert_eq!(log_filter(2), "trace");
        assert_eq!(log_filter(5), "trace");

        let logger = env_logger::Builder::new().parse_filters(log_filter(1)).build();
        assert_eq!(logger.filter(), log::LevelFilter::Debug);
        let logger = env_logger::Builder::new().parse_filters(log_filter(2)).build();
        assert_eq!(logger.filter(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_no_hw_wins_over_dry_run() {
        let options = session_options(true, true, 50, Some(9600));
        assert_eq!(options.mode, Mode::NoHardware);
        assert_eq!(options.program_poll.max_attempts, 50);
        assert_eq!(options.chip_erase_poll.max_attempts, 50);
        assert_eq!(options.id_bit_rate, Some(9600));
        assert_eq!(session_options(true, false, 1000, None).mode, Mode::DryRun);
    }

    #[test]
    fn test_device_database_from_file() {
        let path = commands::test_util::temp_path("devices.ron");
        std::fs::write(
            &path,
            r#"(vendor: "Test", manufacturer_id: 0x9D, parts: [
                (name: "T25Q32", memory_type: 0x60, capacity: 0x16, total_size: MiB(4)),
            ])"#,
        )
        .unwrap();
        let db = load_device_database(Some(&path));
        let _ = std::fs::remove_file(&path);
        let db = db.unwrap();
        assert_eq!(db.len(), DeviceDatabase::with_builtin().len() + 1);
    }
}
