pub mod core;
pub mod cpu;
pub mod device;

pub mod prelude {
    pub use crate::core::machine::{InputButton, Machine, MachineError};
    pub use crate::core::{Bus, bus::InterruptState};
    pub use crate::cpu::z80::Z80;
    pub use crate::device::vdp::Vdp;
}
