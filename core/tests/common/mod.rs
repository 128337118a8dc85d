#![allow(dead_code)]

use lumen_core::core::{Bus, bus::InterruptState};
use lumen_core::cpu::z80::Z80;

/// Minimal bus for testing: flat 64 KiB memory, a 256-byte I/O space, and
/// directly settable interrupt lines.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub io_space: [u8; 0x100],
    /// Every io_write as (full 16-bit port address, value).
    pub io_writes: Vec<(u16, u8)>,
    pub irq: bool,
    pub nmi: bool,
    pub irq_vector: u8,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            io_space: [0; 0x100],
            io_writes: Vec::new(),
            irq: false,
            nmi: false,
            irq_vector: 0xFF,
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Bus for TestBus {
    type Address = u16;
    type Data = u8;

    fn read(&mut self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }

    fn io_read(&mut self, addr: u16) -> u8 {
        self.io_space[(addr & 0xFF) as usize]
    }

    fn io_write(&mut self, addr: u16, data: u8) {
        self.io_writes.push((addr, data));
        self.io_space[(addr & 0xFF) as usize] = data;
    }

    fn check_interrupts(&self) -> InterruptState {
        InterruptState {
            nmi: self.nmi,
            irq: self.irq,
            irq_vector: self.irq_vector,
        }
    }
}

/// Execute one instruction, panicking on CPU faults.
pub fn step(cpu: &mut Z80, bus: &mut TestBus) -> u32 {
    cpu.step(bus).expect("instruction faulted")
}
