use crate::core::Bus;
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    // --- Block transfer ---

    /// One LDI/LDD step: (DE) <- (HL), HL and DE step by ±1, BC--.
    /// N = H = 0, P/V = (BC != 0); X/Y are bits 3/1 of (copied byte + A).
    /// S, Z, C preserved.
    fn ldx_step<B: Bus<Address = u16, Data = u8> + ?Sized>(&mut self, dec: bool, bus: &mut B) {
        let val = bus.read(self.get_hl());
        bus.write(self.get_de(), val);

        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));
        self.set_de(self.get_de().wrapping_add(delta));
        self.set_bc(self.get_bc().wrapping_sub(1));

        let n = val.wrapping_add(self.a);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::C as u8);
        if self.get_bc() != 0 {
            f |= Flag::PV as u8;
        }
        if (n & 0x08) != 0 {
            f |= Flag::X as u8;
        }
        if (n & 0x02) != 0 {
            f |= Flag::Y as u8;
        }
        self.f = f;
    }

    /// LDI (0xA0) / LDD (0xA8) — 16 T
    pub(crate) fn op_ldi_ldd<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let dec = (opcode & 0x08) != 0;
        self.ldx_step(dec, bus);
        16
    }

    /// LDIR/LDDR — one transfer per step; while BC != 0 the instruction
    /// re-executes by rewinding PC over its two bytes (21 T per repeat,
    /// 16 T for the final one). Interrupts are serviced between repeats.
    pub(crate) fn op_ldir_lddr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let dec = (opcode & 0x08) != 0;
        self.ldx_step(dec, bus);
        if self.get_bc() != 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.memptr = self.pc.wrapping_add(1);
            21
        } else {
            16
        }
    }

    // --- Block compare ---

    /// One CPI/CPD step: compare A with (HL), HL ±1, BC--.
    /// Flags as CP except C is preserved; X/Y come from bits 3/1 of
    /// (comparison result - H).
    fn cpx_step<B: Bus<Address = u16, Data = u8> + ?Sized>(&mut self, dec: bool, bus: &mut B) {
        let val = bus.read(self.get_hl());
        let result = self.a.wrapping_sub(val);
        let half = (self.a & 0xF) < (val & 0xF);

        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));
        self.set_bc(self.get_bc().wrapping_sub(1));
        self.memptr = self.memptr.wrapping_add(delta);

        let mut f = (self.f & Flag::C as u8) | Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if half {
            f |= Flag::H as u8;
        }
        if self.get_bc() != 0 {
            f |= Flag::PV as u8;
        }
        let n = result.wrapping_sub(if half { 1 } else { 0 });
        if (n & 0x08) != 0 {
            f |= Flag::X as u8;
        }
        if (n & 0x02) != 0 {
            f |= Flag::Y as u8;
        }
        self.f = f;
    }

    /// CPI (0xA1) / CPD (0xA9) — 16 T
    pub(crate) fn op_cpi_cpd<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let dec = (opcode & 0x08) != 0;
        self.cpx_step(dec, bus);
        16
    }

    /// CPIR/CPDR — repeats while BC != 0 and the comparison missed (Z = 0).
    pub(crate) fn op_cpir_cpdr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let dec = (opcode & 0x08) != 0;
        self.cpx_step(dec, bus);
        if self.get_bc() != 0 && !self.flag(Flag::Z) {
            self.pc = self.pc.wrapping_sub(2);
            self.memptr = self.pc.wrapping_add(1);
            21
        } else {
            16
        }
    }

    // --- Block I/O ---

    /// Flag update shared by the block I/O steps: Z and S track B, N set,
    /// X/Y from B, C preserved.
    fn set_block_io_flags(&mut self) {
        let mut f = (self.f & Flag::C as u8) | Flag::N as u8;
        if self.b == 0 {
            f |= Flag::Z as u8;
        }
        if (self.b & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        f |= self.b & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    /// One INI/IND step: port (C) -> (HL), B--, HL ±1.
    fn inx_step<B: Bus<Address = u16, Data = u8> + ?Sized>(&mut self, dec: bool, bus: &mut B) {
        let port = self.get_bc();
        let val = bus.io_read(port);
        self.b = self.b.wrapping_sub(1);
        bus.write(self.get_hl(), val);
        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));
        self.memptr = port.wrapping_add(delta);
        self.set_block_io_flags();
    }

    /// INI (0xA2) / IND (0xAA) — 16 T
    pub(crate) fn op_ini_ind<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let dec = (opcode & 0x08) != 0;
        self.inx_step(dec, bus);
        16
    }

    /// INIR/INDR — repeats while B != 0.
    pub(crate) fn op_inir_indr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let dec = (opcode & 0x08) != 0;
        self.inx_step(dec, bus);
        if self.b != 0 {
            self.pc = self.pc.wrapping_sub(2);
            21
        } else {
            16
        }
    }

    /// One OUTI/OUTD step: B--, (HL) -> port (C), HL ±1. The port sees the
    /// decremented B in its high address byte.
    fn outx_step<B: Bus<Address = u16, Data = u8> + ?Sized>(&mut self, dec: bool, bus: &mut B) {
        self.b = self.b.wrapping_sub(1);
        let val = bus.read(self.get_hl());
        let port = self.get_bc();
        bus.io_write(port, val);
        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(self.get_hl().wrapping_add(delta));
        self.memptr = port.wrapping_add(delta);
        self.set_block_io_flags();
    }

    /// OUTI (0xA3) / OUTD (0xAB) — 16 T
    pub(crate) fn op_outi_outd<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let dec = (opcode & 0x08) != 0;
        self.outx_step(dec, bus);
        16
    }

    /// OTIR/OTDR — repeats while B != 0.
    pub(crate) fn op_otir_otdr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let dec = (opcode & 0x08) != 0;
        self.outx_step(dec, bus);
        if self.b != 0 {
            self.pc = self.pc.wrapping_sub(2);
            21
        } else {
            16
        }
    }
}
