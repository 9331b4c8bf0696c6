//! Binary entrypoint for the boardlink CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `run [--port <path>] [--sbus-port <path>]` - run the control loop against a serial host link
//! - `smoketest [--header <u32>] [--terminator <u32>] [--cycles <n>]` - in-memory host/board round trip
//!
//! See the library crate docs for module-level details: `boardlink::`.
use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};

use boardlink::config::{Config, LinkConfig};
use boardlink::control::{ControlModel, ExtInputs, ExtOutputs, ModelParams, IO_LEN};
use boardlink::controller::{describe_frame, Controller, Objects};
use boardlink::devices::sbus::{self, SbusFrame, SbusRx};
use boardlink::link::{Link, Region};
use boardlink::logutil::delimiter_label;
use boardlink::metrics;
use boardlink::transport::MemoryTransport;

#[derive(Parser)]
#[command(name = "boardlink")]
#[command(about = "Host link and control loop for the controller board")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Run the control loop on a serial host link until Ctrl-C
    Run {
        /// Host serial port (e.g., /dev/ttyACM0); overrides the config
        #[arg(short, long)]
        port: Option<String>,

        /// SBUS receiver serial port; overrides the config
        #[arg(long)]
        sbus_port: Option<String>,
    },
    /// Exercise a host and a board link back to back in memory
    Smoketest {
        /// Frame header (decimal or 0xHEX, 0 = none)
        #[arg(long, value_parser = parse_u32)]
        header: Option<u32>,

        /// Frame terminator (decimal or 0xHEX, 0 = none)
        #[arg(long, value_parser = parse_u32)]
        terminator: Option<u32>,

        /// Number of request/response cycles
        #[arg(long, default_value_t = 5)]
        cycles: u32,
    },
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid 32-bit value '{}': {}", s, e))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init runs before a config exists; everything else reads it first so logging can use it
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Run { port, sbus_port } => {
            let config = match pre_config {
                Some(cfg) => cfg,
                None => Config::load(&cli.config).await?,
            };
            run(config, port, sbus_port).await?;
        }
        Commands::Smoketest {
            header,
            terminator,
            cycles,
        } => {
            let base = pre_config.unwrap_or_default();
            let link = LinkConfig {
                header: header.unwrap_or(base.link.header),
                terminator: terminator.unwrap_or(base.link.terminator),
                ..base.link
            };
            smoketest(&link, base.control.params(), cycles)?;
        }
    }

    Ok(())
}

#[cfg(feature = "serial")]
async fn run(config: Config, port: Option<String>, sbus_port: Option<String>) -> Result<()> {
    use boardlink::transport::serial::{SerialSettings, SerialTransport};
    use tokio::time::{interval, Duration, MissedTickBehavior};

    info!("Starting boardlink v{}", env!("CARGO_PKG_VERSION"));
    let port = port.unwrap_or_else(|| config.serial.port.clone());
    let settings = SerialSettings::host_link(
        &port,
        config.serial.baud_rate,
        Duration::from_micros(config.link.timeout_us),
    );
    let transport = SerialTransport::open(&settings)?;
    info!(
        "Host link on {} at {} baud (header {}, terminator {}, timeout {} us)",
        transport.name(),
        config.serial.baud_rate,
        delimiter_label(config.link.header),
        delimiter_label(config.link.terminator),
        config.link.timeout_us
    );

    let sbus = match sbus_port.or_else(|| config.sbus.as_ref().map(|s| s.port.clone())) {
        Some(path) => {
            let rx = SerialTransport::open(&SerialSettings::sbus(&path))?;
            info!("SBUS receiver on {}", path);
            Some(SbusRx::new(rx))
        }
        None => None,
    };

    let objects = Objects::new();
    let link = Link::with_config(transport, &config.link);
    let mut controller = Controller::new(
        link,
        &objects,
        ControlModel::new(config.control.params()),
        sbus,
    )?;

    let mut ticker = interval(Duration::from_millis(config.control.cycle_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!("Control loop running every {} ms", config.control.cycle_ms);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                controller.cycle();
            }
            _ = &mut ctrl_c => {
                info!("Shutdown requested");
                break;
            }
        }
    }
    controller.shutdown();

    println!("{}", serde_json::to_string_pretty(&metrics::snapshot())?);
    Ok(())
}

#[cfg(not(feature = "serial"))]
async fn run(_config: Config, _port: Option<String>, _sbus_port: Option<String>) -> Result<()> {
    bail!("run requires the 'serial' feature");
}

/// Board side is a full [`Controller`] with an SBUS receiver; host side is a
/// bare link with the mirrored layout. Every cycle the host sends inputs, the
/// board answers with outputs and the latest receiver frame.
fn smoketest(link_config: &LinkConfig, params: ModelParams, cycles: u32) -> Result<()> {
    info!(
        "Smoke test: header {}, terminator {}, {} cycle(s)",
        delimiter_label(link_config.header),
        delimiter_label(link_config.terminator),
        cycles
    );

    let objects = Objects::new();
    let board_link = Link::with_config(MemoryTransport::new(), link_config);
    let receiver = SbusRx::new(MemoryTransport::new());
    let mut board = Controller::new(
        board_link,
        &objects,
        ControlModel::new(params),
        Some(receiver),
    )?;

    let host_inputs = Region::<IO_LEN>::new();
    let host_outputs = Region::<IO_LEN>::new();
    let host_sbus = Region::<{ sbus::PACKED_LEN }>::new();
    let mut host = Link::with_config(MemoryTransport::new(), link_config);
    host.try_attach_tx(host_inputs.cells())?;
    host.try_attach_rx(host_outputs.cells())?;
    host.try_attach_rx(host_sbus.cells())?;

    for step in 0..cycles {
        let x = step as f32 + 0.25;
        host_inputs.store(&ExtInputs {
            input1: x,
            input2: -x,
        });
        host.try_send()?;
        let request = host
            .transport_mut()
            .map(MemoryTransport::take_written)
            .unwrap_or_default();
        debug!("host -> board {}", describe_frame(&request));

        let stick = stick_frame(step);
        if let Some(rx) = board.sbus_mut() {
            rx.transport_mut().feed(&stick.encode());
        }
        if let Some(t) = board.link_mut().transport_mut() {
            t.feed(&request);
        }

        let report = board.cycle();
        if !report.received || !report.sent || !report.sbus_updated {
            bail!("board cycle {} incomplete: {:?}", step, report);
        }

        let reply = board
            .link_mut()
            .transport_mut()
            .map(MemoryTransport::take_written)
            .unwrap_or_default();
        debug!("board -> host {}", describe_frame(&reply));
        if let Some(t) = host.transport_mut() {
            t.feed(&reply);
        }
        host.try_receive()
            .map_err(|e| anyhow!("host failed to receive cycle {}: {}", step, e))?;

        let out: ExtOutputs = host_outputs.load();
        let expected = ExtOutputs {
            output1: params.gain * x,
            output2: -x,
        };
        if out != expected {
            bail!("cycle {}: expected {:?}, got {:?}", step, expected, out);
        }
        let echoed: SbusFrame = host_sbus.load();
        if echoed != stick {
            bail!("cycle {}: SBUS frame mismatch", step);
        }
        info!("cycle {}: {:?} -> {:?}", step, ExtInputs { input1: x, input2: -x }, out);
    }

    println!("Smoke test passed ({} cycles)", cycles);
    println!("{}", serde_json::to_string_pretty(&metrics::snapshot())?);
    Ok(())
}

/// Receiver frame for smoke-test cycle `step`; channel 0 sweeps 172..=1811.
fn stick_frame(step: u32) -> SbusFrame {
    let mut frame = SbusFrame::default();
    frame.channels[0] = 172 + (step % 1640) as i16;
    frame.failsafe = false;
    frame.lost_frame = false;
    frame
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|cfg| cfg.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only in the foreground
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_hex() {
        assert_eq!(parse_u32("0xAABBCCDD"), Ok(0xAABB_CCDD));
        assert_eq!(parse_u32("42"), Ok(42));
        assert!(parse_u32("0xZZ").is_err());
    }

    #[test]
    fn stick_sweep_stays_in_range_for_long_runs() {
        assert_eq!(stick_frame(0).channels[0], 172);
        assert_eq!(stick_frame(1639).channels[0], 1811);
        assert_eq!(stick_frame(1640).channels[0], 172);
        for step in [32_767, 32_768, 40_000, u32::MAX] {
            let frame = stick_frame(step);
            assert!((172..=1811).contains(&frame.channels[0]));
            assert_eq!(SbusFrame::decode(&frame.encode()), Some(frame));
        }
    }

    #[test]
    fn smoketest_passes_with_and_without_delimiters() {
        smoketest(&LinkConfig::default(), ModelParams::default(), 3).unwrap();
        let framed = LinkConfig {
            header: 0xAABB_CCDD,
            terminator: 0x1122_3344,
            timeout_us: 500,
        };
        smoketest(&framed, ModelParams { gain: -1.5 }, 3).unwrap();
    }
}
