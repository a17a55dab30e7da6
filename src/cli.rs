//! CLI argument parsing

use clap::{Parser, Subcommand};
use gmmflash_core::address::{AddressSelection, UnitSelector};
use gmmflash_core::protocol::PollPolicy;
use std::path::PathBuf;

/// Parse a unit selector (`N`, `N,M` or `N,+K`)
fn parse_selector(s: &str) -> Result<UnitSelector, String> {
    s.parse()
        .map_err(|e: gmmflash_core::Error| format!("{} (expected N, N,M or N,+K)", e))
}

#[derive(Parser)]
#[command(name = "gmmflash")]
#[command(author, version, about = "SPI flash programmer for the GMM-7550 USB-serial bridge", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Serial port of the bridge, optionally with a baud rate (DEV[:BAUD])
    #[arg(short, long, global = true, default_value = "/dev/ttyACM2")]
    pub port: String,

    /// Identify and read, but only log program/erase/load commands
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Do not open the port; a mock W25Q128 identifier is used
    #[arg(long, global = true)]
    pub no_hw: bool,

    /// Extra device definitions (RON file)
    #[arg(long, global = true)]
    pub device_db: Option<PathBuf>,

    /// Status register reads before a program/erase times out
    #[arg(
        long,
        global = true,
        default_value_t = PollPolicy::DEFAULT_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub poll_attempts: u32,

    /// Bit rate used while reading the identifiers
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    pub id_bit_rate: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Address selection shared across commands
///
/// At most one option may be given; the core resolver reports conflicts.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct AddressArgs {
    /// Whole chip
    #[arg(long)]
    pub chip: bool,

    /// Byte address or byte range
    #[arg(long, value_name = "SEL", value_parser = parse_selector)]
    pub addr: Option<UnitSelector>,

    /// 256-byte page index or range
    #[arg(long, value_name = "SEL", value_parser = parse_selector)]
    pub page: Option<UnitSelector>,

    /// 4 KiB sector index or range
    #[arg(long, value_name = "SEL", value_parser = parse_selector)]
    pub sector: Option<UnitSelector>,

    /// 32 KiB block index or range
    #[arg(long, value_name = "SEL", value_parser = parse_selector)]
    pub block32: Option<UnitSelector>,

    /// 64 KiB block index or range
    #[arg(long, value_name = "SEL", value_parser = parse_selector)]
    pub block64: Option<UnitSelector>,
}

impl AddressArgs {
    /// The selection as the core resolver sees it
    pub fn selection(&self) -> AddressSelection {
        AddressSelection {
            chip: self.chip,
            addr: self.addr,
            page: self.page,
            sector: self.sector,
            block32: self.block32,
            block64: self.block64,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print JEDEC ID, unique ID and geometry
    Id,

    /// Read flash contents to file
    Read {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        address: AddressArgs,
    },

    /// Program a file into (already erased) flash
    Write {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        address: AddressArgs,

        /// Fail instead of widening a range that is too small for the file
        #[arg(long)]
        strict_range: bool,

        /// Read back and compare after writing
        #[arg(long)]
        verify: bool,
    },

    /// Erase sectors, blocks or the whole chip
    Erase {
        #[command(flatten)]
        address: AddressArgs,
    },

    /// Compare flash contents against a file
    Verify {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        address: AddressArgs,
    },

    /// Stream a configuration bitstream with chip-select held
    Load {
        /// Bitstream file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use gmmflash_core::address::{SelectorEnd, UnitKinds};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gmmflash").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["id"]);
        assert_eq!(cli.port, "/dev/ttyACM2");
        assert_eq!(cli.poll_attempts, 1000);
        assert_eq!(cli.id_bit_rate, None);
        assert!(!cli.dry_run && !cli.no_hw);
        assert!(matches!(cli.command, Commands::Id));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["erase", "--sector", "3", "--no-hw", "-vv", "--poll-attempts", "20"]);
        assert!(cli.no_hw);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.poll_attempts, 20);
    }

    #[test]
    fn test_write_args() {
        let cli = parse(&[
            "write", "-i", "fw.bin", "--page", "2,+4", "--strict-range", "--verify",
        ]);
        let Commands::Write {
            input,
            address,
            strict_range,
            verify,
        } = cli.command
        else {
            panic!("not a write");
        };
        assert_eq!(input, PathBuf::from("fw.bin"));
        assert!(strict_range && verify);
        assert_eq!(
            address.page,
            Some(UnitSelector {
                start: 2,
                end: SelectorEnd::Count(4)
            })
        );
        assert_eq!(address.selection().kinds(), UnitKinds::PAGE);
    }

    #[test]
    fn test_hex_selector() {
        let cli = parse(&["read", "-o", "out.bin", "--addr", "0x1000,0x1fff"]);
        let Commands::Read { address, .. } = cli.command else {
            panic!("not a read");
        };
        assert_eq!(
            address.addr,
            Some(UnitSelector {
                start: 0x1000,
                end: SelectorEnd::Through(0x1FFF)
            })
        );
    }

    #[test]
    fn test_several_units_reach_the_resolver() {
        let cli = parse(&["erase", "--chip", "--sector", "1"]);
        let Commands::Erase { address } = cli.command else {
            panic!("not an erase");
        };
        assert_eq!(
            address.selection().kinds(),
            UnitKinds::CHIP | UnitKinds::SECTOR
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        let cases: [&[&str]; 4] = [
            &["read", "-o", "x", "--sector", "1,+0"],
            &["read", "-o", "x", "--page", "two"],
            &["--poll-attempts", "0", "id"],
            &["load"],
        ];
        for args in cases {
            let argv = std::iter::once("gmmflash").chain(args.iter().copied());
            assert!(Cli::try_parse_from(argv).is_err(), "{:?} accepted", args);
        }
    }
}
