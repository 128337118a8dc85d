/// Interrupt lines a bus can assert toward the CPU.
///
/// `irq_vector` is the byte the interrupting device would place on the data
/// bus during the acknowledge cycle (used by IM 2). On the Master System
/// nothing drives the bus during INT ack, so the line floats high.
#[derive(Clone, Copy, Debug)]
pub struct InterruptState {
    pub nmi: bool,
    pub irq: bool,
    pub irq_vector: u8,
}

impl Default for InterruptState {
    fn default() -> Self {
        Self {
            nmi: false,
            irq: false,
            irq_vector: 0xFF,
        }
    }
}

/// Generic bus interface between a CPU and the rest of a machine.
pub trait Bus {
    type Address: Copy; // u16 for the 8-bit machines here
    type Data; // u8

    fn read(&mut self, addr: Self::Address) -> Self::Data;
    fn write(&mut self, addr: Self::Address, data: Self::Data);

    /// Read from I/O port address space (separate from memory on Z80).
    /// Default maps to memory read; override for CPUs with separate I/O.
    fn io_read(&mut self, addr: Self::Address) -> Self::Data {
        self.read(addr)
    }

    /// Write to I/O port address space (separate from memory on Z80).
    /// Default maps to memory write; override for CPUs with separate I/O.
    fn io_write(&mut self, addr: Self::Address, data: Self::Data) {
        self.write(addr, data)
    }

    /// Interrupt lines as of the end of the last bus operation. The CPU
    /// samples this at instruction boundaries.
    fn check_interrupts(&self) -> InterruptState {
        InterruptState::default()
    }
}
