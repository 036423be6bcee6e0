//! `pru` — command-line interface for PRU core control.
//!
//! ```text
//! USAGE:
//!   pru status <uio-dev>                 Show run state and counters
//!   pru start <uio-dev> --entry <addr>   Enable execution at an entry point
//!   pru stop <uio-dev>                   Clear the run-enable bit
//!   pru ctable <uio-dev> <slot> <addr>   Program a constant-table slot
//! ```
//!
//! The control window is reached through a UIO mapping (`/dev/uioN`); map
//! index selection follows the UIO convention of one page-aligned offset
//! per map.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pruss_chip::regs::{self, ctrl, CTRL_SIZE};
use pruss_driver::{MappedRegion, PruControl};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pru", about = "PRU core control CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Show the core's run state and execution counters.
    Status {
        /// UIO device for the core's control window (e.g. /dev/uio0).
        device: PathBuf,
        /// UIO map index of the control window.
        #[arg(long, default_value_t = 0)]
        map: usize,
    },
    /// Enable execution at an entry point.
    Start {
        /// UIO device for the core's control window.
        device: PathBuf,
        /// UIO map index of the control window.
        #[arg(long, default_value_t = 0)]
        map: usize,
        /// Entry point byte address (accepts 0x prefix).
        #[arg(long, value_parser = parse_u32, default_value = "0")]
        entry: u32,
    },
    /// Clear the run-enable bit.
    Stop {
        /// UIO device for the core's control window.
        device: PathBuf,
        /// UIO map index of the control window.
        #[arg(long, default_value_t = 0)]
        map: usize,
    },
    /// Program a constant-table slot to point at an address.
    Ctable {
        /// UIO device for the core's control window.
        device: PathBuf,
        /// Constant-table slot (0..31).
        slot: u32,
        /// Target address (accepts 0x prefix; quantized to 256 bytes).
        #[arg(value_parser = parse_u32)]
        addr: u32,
        /// UIO map index of the control window.
        #[arg(long, default_value_t = 0)]
        map: usize,
    },
}

fn parse_u32(s: &str) -> std::result::Result<u32, String> {
    let s = s.trim();
    let parsed = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .map_or_else(|| s.parse(), |hex| u32::from_str_radix(hex, 16));
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}

fn open_control(device: &PathBuf, map: usize) -> Result<PruControl> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(device)
        .with_context(|| format!("opening {}", device.display()))?;

    // UIO exposes map N at offset N * page_size.
    let offset = (map * rustix::param::page_size()) as u64;
    let window = MappedRegion::map(&file, offset, CTRL_SIZE as usize)
        .with_context(|| format!("mapping control window of {}", device.display()))?;

    Ok(PruControl::new(Arc::new(window)))
}

fn cmd_status(device: &PathBuf, map: usize) -> Result<()> {
    let control = open_control(device, map)?;

    let ctrl_val = control.read(regs::CTRL)?;
    let sts = control.read(regs::STS)?;
    let cycle = control.read(regs::CYCLE)?;
    let stall = control.read(regs::STALL)?;

    let state = if ctrl_val & ctrl::RUNSTATE != 0 {
        "running"
    } else {
        "halted"
    };

    println!("CTRL   {ctrl_val:#010x}  ({state})");
    println!("PC     {:#010x}  (byte address {:#x})", sts, sts << 2);
    println!("CYCLE  {cycle:#010x}");
    println!("STALL  {stall:#010x}");

    Ok(())
}

fn cmd_start(device: &PathBuf, map: usize, entry: u32) -> Result<()> {
    let control = open_control(device, map)?;
    let val = ctrl::EN | ((entry >> 2) << ctrl::PC_SHIFT);
    control.write(regs::CTRL, val)?;
    println!("started at entry point {entry:#x}");
    Ok(())
}

fn cmd_stop(device: &PathBuf, map: usize) -> Result<()> {
    let control = open_control(device, map)?;
    control.set(regs::CTRL, ctrl::EN, 0)?;
    println!("stopped");
    Ok(())
}

fn cmd_ctable(device: &PathBuf, map: usize, slot: u32, addr: u32) -> Result<()> {
    let control = open_control(device, map)?;
    control.set_ctable(slot, addr)?;
    println!("ctable slot {slot} -> {:#x}", addr & !0xFF);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Status { device, map } => cmd_status(&device, map)?,
        Cmd::Start { device, map, entry } => cmd_start(&device, map, entry)?,
        Cmd::Stop { device, map } => cmd_stop(&device, map)?,
        Cmd::Ctable {
            device,
            slot,
            addr,
            map,
        } => cmd_ctable(&device, map, slot, addr)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_u32;

    #[test]
    fn parses_decimal_and_hex() {
        assert_eq!(parse_u32("64").unwrap(), 64);
        assert_eq!(parse_u32("0x1234").unwrap(), 0x1234);
        assert_eq!(parse_u32("0X10").unwrap(), 0x10);
        assert!(parse_u32("zz").is_err());
    }
}
