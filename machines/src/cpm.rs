//! Minimal CP/M machine for running CPU test programs (zexdoc, zexall,
//! prelim).
//!
//! 64 KiB of flat RAM, no video, and just enough of the BDOS to let the
//! test suites print. A `.com` image is loaded at 0x0100. The warm-boot
//! entry at 0x0000 holds `OUT (0),A`, so the conventional `JP 0` exit
//! lands on the shutdown port; the BDOS entry at 0x0005 holds
//! `IN A,(0); RET`, and the port read dispatches on the function number
//! in C once the instruction has retired.

use lumen_core::core::Bus;
use lumen_core::core::machine::{InputButton, Machine, MachineError};
use lumen_core::cpu::state::Z80State;
use lumen_core::cpu::z80::Z80;
use lumen_core::device::vdp;

use crate::media::{MediaError, MediaSet};
use crate::registry::MachineEntry;
use crate::sms::PortFault;

/// Load address for `.com` images (the CP/M transient program area).
pub const TPA_BASE: usize = 0x0100;

/// BDOS console-output function (character in E).
const BDOS_CONOUT: u8 = 2;
/// BDOS print-string function ($-terminated string at DE).
const BDOS_PRINT_STRING: u8 = 9;

/// T-states in one 60 Hz frame slice, used when the machine is driven
/// through the generic `Machine` interface.
const TSTATES_PER_FRAME: u64 = (vdp::CYCLES_PER_LINE as u64) * (vdp::NUM_SCANLINES as u64);

pub struct CpmBus {
    pub ram: [u8; 0x10000],
    /// Set by `IN A,(0)`; the BDOS call is dispatched after the
    /// instruction completes, when the register file is settled.
    bdos_pending: bool,
    /// Set by `OUT (0),A` — the program has jumped through 0x0000.
    finished: bool,
    fault: Option<PortFault>,
}

impl CpmBus {
    fn new() -> Self {
        Self {
            ram: [0; 0x10000],
            bdos_pending: false,
            finished: false,
            fault: None,
        }
    }
}

impl Bus for CpmBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.ram[addr as usize] = data;
    }

    fn io_read(&mut self, addr: u16) -> u8 {
        let port = addr as u8;
        if port == 0 {
            self.bdos_pending = true;
            0
        } else {
            self.fault = Some(PortFault { port, write: false });
            0xFF
        }
    }

    fn io_write(&mut self, addr: u16, data: u8) {
        let port = addr as u8;
        if port == 0 {
            self.finished = true;
        } else {
            let _ = data;
            self.fault = Some(PortFault { port, write: true });
        }
    }
}

pub struct CpmSystem {
    pub cpu: Z80,
    pub bus: CpmBus,
    output: String,
}

impl Default for CpmSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl CpmSystem {
    pub fn new() -> Self {
        Self {
            cpu: Z80::new(),
            bus: CpmBus::new(),
            output: String::new(),
        }
    }

    /// Place a `.com` image in the TPA and install the syscall stubs.
    pub fn load_program(&mut self, image: &[u8]) -> Result<(), MediaError> {
        if TPA_BASE + image.len() > self.bus.ram.len() {
            return Err(MediaError::ProgramTooLarge(image.len()));
        }
        self.bus.ram[TPA_BASE..TPA_BASE + image.len()].copy_from_slice(image);

        // 0x0000: OUT (0),A — shutdown on the conventional JP 0 exit
        self.bus.ram[0x0000] = 0xD3;
        self.bus.ram[0x0001] = 0x00;
        // 0x0005: IN A,(0); RET — the BDOS entry point
        self.bus.ram[0x0005] = 0xDB;
        self.bus.ram[0x0006] = 0x00;
        self.bus.ram[0x0007] = 0xC9;

        self.cpu.reset();
        self.cpu.pc = TPA_BASE as u16;
        Ok(())
    }

    /// Execute one instruction and dispatch any BDOS request it raised.
    pub fn step(&mut self) -> Result<u32, MachineError> {
        let tstates = self.cpu.step(&mut self.bus)?;
        if let Some(fault) = self.bus.fault.take() {
            return Err(MachineError::UnmappedPort {
                port: fault.port,
                write: fault.write,
            });
        }
        if std::mem::take(&mut self.bus.bdos_pending) {
            self.bdos_call();
        }
        Ok(tstates)
    }

    /// Run until the program exits or the T-state budget runs dry.
    pub fn run_to_completion(&mut self, max_tstates: u64) -> Result<(), MachineError> {
        let mut total: u64 = 0;
        while !self.bus.finished {
            total += self.step()? as u64;
            if total > max_tstates {
                return Err(MachineError::DeadlineExceeded { tstates: total });
            }
        }
        Ok(())
    }

    pub fn finished(&self) -> bool {
        self.bus.finished
    }

    /// Drain console output accumulated since the last call.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn cpu_state(&self) -> Z80State {
        self.cpu.snapshot()
    }

    fn bdos_call(&mut self) {
        match self.cpu.c {
            BDOS_CONOUT => self.output.push(self.cpu.e as char),
            BDOS_PRINT_STRING => {
                let mut addr = self.cpu.get_de();
                loop {
                    let byte = self.bus.ram[addr as usize];
                    if byte == b'$' {
                        break;
                    }
                    self.output.push(byte as char);
                    addr = addr.wrapping_add(1);
                }
            }
            other => log::warn!("unhandled BDOS function {other} ignored"),
        }
    }
}

impl Machine for CpmSystem {
    fn display_size(&self) -> (u32, u32) {
        (vdp::SCREEN_WIDTH as u32, vdp::SCREEN_HEIGHT as u32)
    }

    fn run_frame(&mut self) -> Result<(), MachineError> {
        let mut tstates: u64 = 0;
        while !self.bus.finished && tstates < TSTATES_PER_FRAME {
            tstates += self.step()? as u64;
        }
        Ok(())
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        // No video hardware: blank screen
        buffer.fill(0);
    }

    fn set_input(&mut self, _button: u8, _pressed: bool) {}

    fn input_map(&self) -> &[InputButton] {
        &[]
    }

    fn reset(&mut self) {
        self.cpu.reset();
        self.cpu.pc = TPA_BASE as u16;
        self.bus.bdos_pending = false;
        self.bus.finished = false;
        self.bus.fault = None;
        self.output.clear();
    }
}

fn create_cpm(media: &MediaSet) -> Result<Box<dyn Machine>, MediaError> {
    let mut sys = CpmSystem::new();
    sys.load_program(media.require("program")?)?;
    Ok(Box::new(sys))
}

inventory::submit! {
    MachineEntry::new("cpm", create_cpm)
}
