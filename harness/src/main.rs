use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use lumen_core::core::machine::Machine;
use lumen_machines::CpmSystem;
use lumen_machines::media::MediaSet;
use lumen_machines::registry;

#[derive(Parser)]
#[command(name = "lumen", about = "Headless Master System emulator driver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a machine headless for a number of frames.
    Run {
        /// Cartridge image (.sms) or program image, depending on machine
        rom: PathBuf,
        /// Boot ROM image (8 KiB); omit to boot without one
        #[arg(long)]
        bios: Option<PathBuf>,
        /// Frames to run (60 per emulated second)
        #[arg(long, default_value_t = 600)]
        frames: u32,
        /// Write the final frame as a PNG
        #[arg(long)]
        screenshot: Option<PathBuf>,
        /// Machine to run
        #[arg(long, default_value = "sms")]
        machine: String,
    },
    /// Run a CP/M test program (zexdoc, zexall, prelim) to completion,
    /// printing its console output. Exits 0 when the program terminates
    /// normally.
    Zex {
        /// CP/M .com image, loaded at 0x0100
        program: PathBuf,
        /// Abort if the program has not terminated by this many T-states
        #[arg(long, default_value_t = 200_000_000_000)]
        max_tstates: u64,
        /// Write CPU state snapshots as JSON lines
        #[arg(long)]
        trace: Option<PathBuf>,
        /// Snapshot period, in instructions
        #[arg(long, default_value_t = 1_000_000)]
        trace_every: u64,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    match Cli::parse().command {
        Command::Run {
            rom,
            bios,
            frames,
            screenshot,
            machine,
        } => cmd_run(&rom, bios.as_deref(), frames, screenshot.as_deref(), &machine),
        Command::Zex {
            program,
            max_tstates,
            trace,
            trace_every,
        } => cmd_zex(&program, max_tstates, trace.as_deref(), trace_every),
    }
}

fn cmd_run(
    rom: &Path,
    bios: Option<&Path>,
    frames: u32,
    screenshot: Option<&Path>,
    machine_name: &str,
) -> anyhow::Result<()> {
    let Some(entry) = registry::find(machine_name) else {
        let known: Vec<_> = registry::all().iter().map(|e| e.name).collect();
        bail!("unknown machine '{machine_name}' (available: {})", known.join(", "));
    };

    let mut media = MediaSet::new();
    let image = std::fs::read(rom).with_context(|| format!("reading {}", rom.display()))?;
    // Factories pick out the item they load from
    media.insert("cartridge", image.clone());
    media.insert("program", image);
    if let Some(bios_path) = bios {
        media
            .insert_file("bios", bios_path)
            .with_context(|| format!("reading {}", bios_path.display()))?;
    } else {
        // Conventional location: bios.sms next to the cartridge image.
        // A missing boot ROM is recoverable; the machine boots without it.
        let default_bios = rom.with_file_name("bios.sms");
        match std::fs::read(&default_bios) {
            Ok(data) => media.insert("bios", data),
            Err(_) => log::warn!("no boot ROM at {}, booting without one", default_bios.display()),
        }
    }

    let mut machine = (entry.create)(&media).context("constructing machine")?;
    machine.reset();

    for frame in 0..frames {
        machine
            .run_frame()
            .with_context(|| format!("emulation fault in frame {frame}"))?;
    }
    log::info!("ran {frames} frames");

    if let Some(path) = screenshot {
        write_screenshot(path, machine.as_ref())
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn write_screenshot(path: &Path, machine: &dyn Machine) -> anyhow::Result<()> {
    let (width, height) = machine.display_size();
    let mut buffer = vec![0u8; (width * height * 3) as usize];
    machine.render_frame(&mut buffer);

    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&buffer)?;
    Ok(())
}

fn cmd_zex(
    program: &Path,
    max_tstates: u64,
    trace: Option<&Path>,
    trace_every: u64,
) -> anyhow::Result<()> {
    let image =
        std::fs::read(program).with_context(|| format!("reading {}", program.display()))?;
    let mut sys = CpmSystem::new();
    sys.load_program(&image).context("loading program")?;

    let mut trace_out = match trace {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => None,
    };

    let mut stdout = std::io::stdout();
    let mut total_tstates: u64 = 0;
    let mut instructions: u64 = 0;

    while !sys.finished() {
        total_tstates += sys.step()? as u64;
        instructions += 1;

        if let Some(out) = trace_out.as_mut()
            && instructions % trace_every == 0
        {
            serde_json::to_writer(&mut *out, &sys.cpu_state())?;
            writeln!(out)?;
        }

        let text = sys.take_output();
        if !text.is_empty() {
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }

        if total_tstates > max_tstates {
            bail!("program did not terminate within {max_tstates} T-states");
        }
    }

    let text = sys.take_output();
    if !text.is_empty() {
        stdout.write_all(text.as_bytes())?;
    }
    println!();
    log::info!("program terminated after {instructions} instructions ({total_tstates} T-states)");
    Ok(())
}
