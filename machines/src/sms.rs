//! Sega Master System (Sega, 1986)
//!
//! Hardware: Zilog Z80 @ 3.58 MHz, 315-5124 VDP, 8 KiB work RAM, cartridge
//! slot behind the Sega mapper (three 16 KiB bank windows over the lower
//! 48 KiB of the address space), optional 8 KiB boot ROM overlaid below
//! 0xC000. The PSG is not modelled; its ports accept writes and discard
//! them.

use lumen_core::core::bus::InterruptState;
use lumen_core::core::machine::{InputButton, Machine, MachineError};
use lumen_core::core::Bus;
use lumen_core::cpu::state::Z80State;
use lumen_core::cpu::z80::Z80;
use lumen_core::device::vdp::{self, Vdp};

use crate::media::{Bios, Cartridge, MediaError, MediaSet};
use crate::registry::MachineEntry;

// ---------------------------------------------------------------------------
// Input button IDs
// ---------------------------------------------------------------------------
pub const INPUT_P1_UP: u8 = 0;
pub const INPUT_P1_DOWN: u8 = 1;
pub const INPUT_P1_LEFT: u8 = 2;
pub const INPUT_P1_RIGHT: u8 = 3;
pub const INPUT_P1_BUTTON_1: u8 = 4;
pub const INPUT_P1_BUTTON_2: u8 = 5;
pub const INPUT_P2_UP: u8 = 6;
pub const INPUT_P2_DOWN: u8 = 7;
pub const INPUT_P2_LEFT: u8 = 8;
pub const INPUT_P2_RIGHT: u8 = 9;
pub const INPUT_P2_BUTTON_1: u8 = 10;
pub const INPUT_P2_BUTTON_2: u8 = 11;
pub const INPUT_PAUSE: u8 = 12;

const SMS_INPUT_MAP: &[InputButton] = &[
    InputButton { id: INPUT_P1_UP, name: "P1 Up" },
    InputButton { id: INPUT_P1_DOWN, name: "P1 Down" },
    InputButton { id: INPUT_P1_LEFT, name: "P1 Left" },
    InputButton { id: INPUT_P1_RIGHT, name: "P1 Right" },
    InputButton { id: INPUT_P1_BUTTON_1, name: "P1 Button 1" },
    InputButton { id: INPUT_P1_BUTTON_2, name: "P1 Button 2" },
    InputButton { id: INPUT_P2_UP, name: "P2 Up" },
    InputButton { id: INPUT_P2_DOWN, name: "P2 Down" },
    InputButton { id: INPUT_P2_LEFT, name: "P2 Left" },
    InputButton { id: INPUT_P2_RIGHT, name: "P2 Right" },
    InputButton { id: INPUT_P2_BUTTON_1, name: "P2 Button 1" },
    InputButton { id: INPUT_P2_BUTTON_2, name: "P2 Button 2" },
    InputButton { id: INPUT_PAUSE, name: "Pause" },
];

// ---------------------------------------------------------------------------
// Memory layout
// ---------------------------------------------------------------------------
const RAM_SIZE: usize = 0x2000;
const BANK_SIZE: usize = 0x4000;

// Port 0x3E memory-enable bits. A set bit disables the source.
const MEM_DISABLE_IO: u8 = 0x04;
const MEM_DISABLE_BIOS: u8 = 0x08;
const MEM_DISABLE_RAM: u8 = 0x10;
const MEM_DISABLE_CART: u8 = 0x40;

/// An I/O access outside the decoded port map, latched by the bus and
/// surfaced by `run_frame` once the instruction completes.
#[derive(Clone, Copy, Debug)]
pub struct PortFault {
    pub port: u8,
    pub write: bool,
}

/// Everything on the far side of the CPU pins: BIOS, work RAM, the
/// cartridge behind the Sega mapper, the VDP, and the joypad latches.
pub struct SmsBus {
    bios: Option<Box<[u8]>>,
    rom: Box<[u8]>,
    ram: [u8; RAM_SIZE],

    // Sega mapper state, programmed through 0xFFFC-0xFFFF
    bank_offsets: [usize; 3],
    rom_write: bool,
    cart_ram_0: bool,
    cart_ram_1: bool,
    ram_bank_select: bool,
    bank_shift: u8,

    // Port 0x3E / 0x3F latches
    mem_control: u8,
    io_control: u8,

    pub vdp: Vdp,

    // Joypad state, active-low
    joypad1: u8,
    joypad2: u8,
    pause_pressed: bool,

    fault: Option<PortFault>,
}

impl SmsBus {
    fn new(cartridge: Cartridge, bios: Option<Bios>) -> Self {
        Self {
            bios: bios.map(|b| b.rom),
            rom: cartridge.rom,
            ram: [0; RAM_SIZE],
            // Standard Sega-mapper power-on layout: banks 0, 1, 2
            bank_offsets: [0, BANK_SIZE, 2 * BANK_SIZE],
            rom_write: false,
            cart_ram_0: false,
            cart_ram_1: false,
            ram_bank_select: false,
            bank_shift: 0,
            mem_control: 0,
            io_control: 0,
            vdp: Vdp::new(),
            joypad1: 0xFF,
            joypad2: 0xFF,
            pause_pressed: false,
            fault: None,
        }
    }

    fn bios_enabled(&self) -> bool {
        (self.mem_control & MEM_DISABLE_BIOS) == 0
    }

    fn cart_enabled(&self) -> bool {
        (self.mem_control & MEM_DISABLE_CART) == 0
    }

    fn ram_enabled(&self) -> bool {
        (self.mem_control & MEM_DISABLE_RAM) == 0
    }

    fn io_enabled(&self) -> bool {
        (self.mem_control & MEM_DISABLE_IO) == 0
    }

    fn cart_read(&self, addr: u16) -> u8 {
        let slot = (addr >> 14) as usize;
        let offset = self.bank_offsets[slot] + (addr as usize & (BANK_SIZE - 1));
        self.rom[offset % self.rom.len()]
    }

    /// Mapper control registers live under the RAM mirror at 0xFFFC-0xFFFF.
    fn mapper_ctrl_write(&mut self, addr: u16, value: u8) {
        match addr {
            0xFFFC => {
                self.rom_write = (value & 0x80) != 0;
                self.cart_ram_0 = (value & 0x10) != 0;
                self.cart_ram_1 = (value & 0x08) != 0;
                self.ram_bank_select = (value & 0x04) != 0;
                self.bank_shift = value & 0x03;
                log::debug!(
                    "mapper: ctrl rom_write={} cart_ram=({},{}) ram_bank={} shift={}",
                    self.rom_write,
                    self.cart_ram_0,
                    self.cart_ram_1,
                    self.ram_bank_select,
                    self.bank_shift
                );
            }
            0xFFFD..=0xFFFF => {
                let slot = (addr - 0xFFFD) as usize;
                self.bank_offsets[slot] = value as usize * BANK_SIZE;
                log::debug!("mapper: slot {slot} -> bank {value}");
            }
            _ => unreachable!(),
        }
    }
}

impl Bus for SmsBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, addr: u16) -> u8 {
        if addr < 0xC000 {
            // BIOS and cartridge drive the bus together; disabled sources
            // float high.
            let mut value = 0xFF;
            if self.bios_enabled()
                && let Some(bios) = &self.bios
            {
                value &= bios[addr as usize & 0x1FFF];
            }
            if self.cart_enabled() {
                value &= self.cart_read(addr);
            }
            value
        } else if self.ram_enabled() {
            self.ram[addr as usize & 0x1FFF]
        } else {
            0xFF
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        if addr < 0xC000 {
            // ROM region: no cart RAM wired, the write is dropped
            log::debug!("write to ROM region 0x{addr:04X} = 0x{data:02X} ignored");
            return;
        }
        if self.ram_enabled() {
            self.ram[addr as usize & 0x1FFF] = data;
        }
        if addr >= 0xFFFC {
            self.mapper_ctrl_write(addr, data);
        }
    }

    fn io_read(&mut self, addr: u16) -> u8 {
        let port = addr as u8;
        match port {
            // Even ports return the V counter, odd the H counter
            0x40..=0x7F => {
                if port & 1 == 0 {
                    self.vdp.vcounter_read()
                } else {
                    self.vdp.hcounter_read()
                }
            }
            0xBE => self.vdp.data_read(),
            0xBF => self.vdp.status_read(),
            0xDC => {
                if self.io_enabled() {
                    self.joypad1
                } else {
                    0xFF
                }
            }
            0xDD => {
                if self.io_enabled() {
                    self.joypad2
                } else {
                    0xFF
                }
            }
            _ => {
                self.fault = Some(PortFault { port, write: false });
                0xFF
            }
        }
    }

    fn io_write(&mut self, addr: u16, data: u8) {
        let port = addr as u8;
        match port {
            0x3E => self.mem_control = data,
            0x3F => {
                self.io_control = data;
                log::debug!("I/O port control = 0x{:02X}", self.io_control);
            }
            // PSG: accepted and discarded
            0x40..=0x7F => {}
            0xBE => self.vdp.data_write(data),
            0xBF => self.vdp.control_write(data),
            _ => {
                self.fault = Some(PortFault { port, write: true });
            }
        }
    }

    fn check_interrupts(&self) -> InterruptState {
        InterruptState {
            nmi: self.pause_pressed,
            irq: self.vdp.interrupt_pending(),
            irq_vector: 0xFF,
        }
    }
}

/// The assembled console: one CPU, one bus.
pub struct SmsSystem {
    pub cpu: Z80,
    pub bus: SmsBus,
}

impl SmsSystem {
    pub fn new(cartridge: Cartridge, bios: Option<Bios>) -> Self {
        let mut sys = Self {
            cpu: Z80::new(),
            bus: SmsBus::new(cartridge, bios),
        };
        sys.cpu.reset();
        sys
    }

    /// Execute one instruction and feed its T-states to the VDP.
    pub fn step(&mut self) -> Result<u32, MachineError> {
        let tstates = self.cpu.step(&mut self.bus)?;
        if let Some(fault) = self.bus.fault.take() {
            return Err(MachineError::UnmappedPort {
                port: fault.port,
                write: fault.write,
            });
        }
        self.bus.vdp.run(tstates)?;
        Ok(tstates)
    }

    pub fn cpu_state(&self) -> Z80State {
        self.cpu.snapshot()
    }
}

impl Machine for SmsSystem {
    fn display_size(&self) -> (u32, u32) {
        (vdp::SCREEN_WIDTH as u32, vdp::SCREEN_HEIGHT as u32)
    }

    fn run_frame(&mut self) -> Result<(), MachineError> {
        loop {
            self.step()?;
            if self.bus.vdp.take_frame() {
                return Ok(());
            }
        }
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        for (i, &colour) in self.bus.vdp.screen().iter().enumerate() {
            let (r, g, b) = vdp::colour_to_rgb(colour);
            buffer[i * 3] = r;
            buffer[i * 3 + 1] = g;
            buffer[i * 3 + 2] = b;
        }
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        match button {
            // Port 0xDC (active-low)
            INPUT_P1_UP => set_bit_active_low(&mut self.bus.joypad1, 0, pressed),
            INPUT_P1_DOWN => set_bit_active_low(&mut self.bus.joypad1, 1, pressed),
            INPUT_P1_LEFT => set_bit_active_low(&mut self.bus.joypad1, 2, pressed),
            INPUT_P1_RIGHT => set_bit_active_low(&mut self.bus.joypad1, 3, pressed),
            INPUT_P1_BUTTON_1 => set_bit_active_low(&mut self.bus.joypad1, 4, pressed),
            INPUT_P1_BUTTON_2 => set_bit_active_low(&mut self.bus.joypad1, 5, pressed),
            INPUT_P2_UP => set_bit_active_low(&mut self.bus.joypad1, 6, pressed),
            INPUT_P2_DOWN => set_bit_active_low(&mut self.bus.joypad1, 7, pressed),

            // Port 0xDD (active-low)
            INPUT_P2_LEFT => set_bit_active_low(&mut self.bus.joypad2, 0, pressed),
            INPUT_P2_RIGHT => set_bit_active_low(&mut self.bus.joypad2, 1, pressed),
            INPUT_P2_BUTTON_1 => set_bit_active_low(&mut self.bus.joypad2, 2, pressed),
            INPUT_P2_BUTTON_2 => set_bit_active_low(&mut self.bus.joypad2, 3, pressed),

            // Pause feeds the CPU's NMI line directly
            INPUT_PAUSE => self.bus.pause_pressed = pressed,

            _ => {}
        }
    }

    fn input_map(&self) -> &[InputButton] {
        SMS_INPUT_MAP
    }

    fn reset(&mut self) {
        self.cpu.reset();
        self.bus.ram = [0; RAM_SIZE];
        self.bus.bank_offsets = [0, BANK_SIZE, 2 * BANK_SIZE];
        self.bus.rom_write = false;
        self.bus.cart_ram_0 = false;
        self.bus.cart_ram_1 = false;
        self.bus.ram_bank_select = false;
        self.bus.bank_shift = 0;
        self.bus.mem_control = 0;
        self.bus.io_control = 0;
        self.bus.vdp.reset();
        self.bus.joypad1 = 0xFF;
        self.bus.joypad2 = 0xFF;
        self.bus.pause_pressed = false;
        self.bus.fault = None;
    }
}

/// Active-low bit manipulation: clear bit on press, set bit on release.
fn set_bit_active_low(reg: &mut u8, bit: u8, pressed: bool) {
    if pressed {
        *reg &= !(1 << bit);
    } else {
        *reg |= 1 << bit;
    }
}

fn create_sms(media: &MediaSet) -> Result<Box<dyn Machine>, MediaError> {
    let cartridge = Cartridge::from_bytes(media.require("cartridge")?.to_vec())?;
    let bios = match media.get("bios") {
        Some(data) => Some(Bios::from_bytes(data.to_vec())?),
        None => None,
    };
    Ok(Box::new(SmsSystem::new(cartridge, bios)))
}

inventory::submit! {
    MachineEntry::new("sms", create_sms)
}
