use crate::core::Bus;
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    // --- 8-bit loads ---

    /// LD r,r' (0x40-0x7F). The memory column (index 6) is (HL)/(IX+d);
    /// the register operand of an indexed memory form is NOT remapped to
    /// IXH/IXL (LD H,(IX+d) really loads H).
    pub(crate) fn op_ld_r_r<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let dst = (opcode >> 3) & 0x07;
        let src = opcode & 0x07;

        if src == 6 {
            let indexed = self.indexed();
            let addr = self.effective_addr(bus);
            let val = bus.read(addr);
            self.set_reg8(dst, val);
            if indexed { 15 } else { 7 }
        } else if dst == 6 {
            let indexed = self.indexed();
            let addr = self.effective_addr(bus);
            let val = self.get_reg8(src);
            bus.write(addr, val);
            if indexed { 15 } else { 7 }
        } else {
            let val = self.get_reg8_ix(src);
            self.set_reg8_ix(dst, val);
            4
        }
    }

    /// LD r,n / LD (HL),n. For LD (IX+d),n the displacement byte precedes
    /// the immediate.
    pub(crate) fn op_ld_r_n<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let r = (opcode >> 3) & 0x07;
        if r == 6 {
            let indexed = self.indexed();
            let addr = self.effective_addr(bus);
            let val = self.read_immediate(bus);
            bus.write(addr, val);
            if indexed { 15 } else { 10 }
        } else {
            let val = self.read_immediate(bus);
            self.set_reg8_ix(r, val);
            7
        }
    }

    /// LD (BC),A / LD (DE),A — 7 T
    pub(crate) fn op_ld_rr_ind_a<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        addr: u16,
        bus: &mut B,
    ) -> u32 {
        bus.write(addr, self.a);
        self.memptr = addr.wrapping_add(1);
        7
    }

    /// LD A,(BC) / LD A,(DE) — 7 T
    pub(crate) fn op_ld_a_rr_ind<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        addr: u16,
        bus: &mut B,
    ) -> u32 {
        self.a = bus.read(addr);
        self.memptr = addr.wrapping_add(1);
        7
    }

    /// LD (nn),A — 13 T
    pub(crate) fn op_ld_nn_a<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u32 {
        let addr = self.read_immediate16(bus);
        bus.write(addr, self.a);
        self.memptr = addr.wrapping_add(1);
        13
    }

    /// LD A,(nn) — 13 T
    pub(crate) fn op_ld_a_nn<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u32 {
        let addr = self.read_immediate16(bus);
        self.a = bus.read(addr);
        self.memptr = addr.wrapping_add(1);
        13
    }

    // --- 16-bit loads ---

    /// LD rr,nn — 10 T (rr respects the index prefix)
    pub(crate) fn op_ld_rr_nn<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let val = self.read_immediate16(bus);
        self.set_rp(rp, val);
        10
    }

    /// LD (nn),HL — 16 T
    pub(crate) fn op_ld_nn_hl<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u32 {
        let addr = self.read_immediate16(bus);
        let val = self.get_rp(2);
        self.write16(bus, addr, val);
        self.memptr = addr.wrapping_add(1);
        16
    }

    /// LD HL,(nn) — 16 T
    pub(crate) fn op_ld_hl_nn<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u32 {
        let addr = self.read_immediate16(bus);
        let val = self.read16(bus, addr);
        self.set_rp(2, val);
        self.memptr = addr.wrapping_add(1);
        16
    }

    /// LD (nn),rr (ED 43/53/63/73) — 20 T
    pub(crate) fn op_ld_nn_rr_ed<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let addr = self.read_immediate16(bus);
        let val = self.get_rp(rp);
        self.write16(bus, addr, val);
        self.memptr = addr.wrapping_add(1);
        20
    }

    /// LD rr,(nn) (ED 4B/5B/6B/7B) — 20 T
    pub(crate) fn op_ld_rr_nn_ed<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let addr = self.read_immediate16(bus);
        let val = self.read16(bus, addr);
        self.set_rp(rp, val);
        self.memptr = addr.wrapping_add(1);
        20
    }

    /// LD SP,HL — 6 T
    pub(crate) fn op_ld_sp_hl(&mut self) -> u32 {
        self.sp = self.get_rp(2);
        6
    }

    // --- Interrupt/refresh register loads (ED) ---

    pub(crate) fn op_ld_i_a(&mut self) -> u32 {
        self.i = self.a;
        9
    }

    pub(crate) fn op_ld_r_a(&mut self) -> u32 {
        self.r = self.a;
        9
    }

    /// LD A,I — P/V reports IFF2 so interrupt state can be probed.
    pub(crate) fn op_ld_a_i(&mut self) -> u32 {
        self.a = self.i;
        self.set_ir_load_flags();
        9
    }

    /// LD A,R — same flag rule as LD A,I.
    pub(crate) fn op_ld_a_r(&mut self) -> u32 {
        self.a = self.r;
        self.set_ir_load_flags();
        9
    }

    fn set_ir_load_flags(&mut self) {
        let mut f = self.f & Flag::C as u8;
        if self.a == 0 {
            f |= Flag::Z as u8;
        }
        if (self.a & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if self.iff2 {
            f |= Flag::PV as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    // --- Exchanges ---

    /// EX AF,AF' — 4 T
    pub(crate) fn op_ex_af_af(&mut self) -> u32 {
        std::mem::swap(&mut self.a, &mut self.a_prime);
        std::mem::swap(&mut self.f, &mut self.f_prime);
        4
    }

    /// EXX — swap BC/DE/HL with the shadow bank — 4 T
    pub(crate) fn op_exx(&mut self) -> u32 {
        std::mem::swap(&mut self.b, &mut self.b_prime);
        std::mem::swap(&mut self.c, &mut self.c_prime);
        std::mem::swap(&mut self.d, &mut self.d_prime);
        std::mem::swap(&mut self.e, &mut self.e_prime);
        std::mem::swap(&mut self.h, &mut self.h_prime);
        std::mem::swap(&mut self.l, &mut self.l_prime);
        4
    }

    /// EX DE,HL — register content only, shadow bank untouched — 4 T
    pub(crate) fn op_ex_de_hl(&mut self) -> u32 {
        std::mem::swap(&mut self.d, &mut self.h);
        std::mem::swap(&mut self.e, &mut self.l);
        4
    }

    /// EX (SP),HL (or IX/IY) — 19 T
    pub(crate) fn op_ex_sp_hl<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u32 {
        let sp = self.sp;
        let mem = self.read16(bus, sp);
        let reg = self.get_rp(2);
        self.write16(bus, sp, reg);
        self.set_rp(2, mem);
        self.memptr = mem;
        19
    }

    // --- Port I/O ---

    /// IN A,(n) — 11 T. A supplies the top half of the port address.
    /// No flags are affected.
    pub(crate) fn op_in_a_n<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u32 {
        let n = self.read_immediate(bus);
        let port = ((self.a as u16) << 8) | n as u16;
        self.a = bus.io_read(port);
        self.memptr = port.wrapping_add(1);
        11
    }

    /// OUT (n),A — 11 T
    pub(crate) fn op_out_n_a<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u32 {
        let n = self.read_immediate(bus);
        let port = ((self.a as u16) << 8) | n as u16;
        bus.io_write(port, self.a);
        self.memptr = ((self.a as u16) << 8) | (n.wrapping_add(1) as u16);
        11
    }

    /// IN r,(C) (ED 40-78) — 12 T. The flag update happens even for the
    /// undocumented IN (C) form (r = 6), which discards the value.
    pub(crate) fn op_in_r_c<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let r = (opcode >> 3) & 0x07;
        let port = self.get_bc();
        let val = bus.io_read(port);
        if r != 6 {
            self.set_reg8(r, val);
        }

        let mut f = self.f & Flag::C as u8;
        if val == 0 {
            f |= Flag::Z as u8;
        }
        if (val & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if Self::get_parity(val) {
            f |= Flag::PV as u8;
        }
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;

        self.memptr = port.wrapping_add(1);
        12
    }

    /// OUT (C),r (ED 41-79) — 12 T. The undocumented OUT (C) form (r = 6)
    /// drives zero onto the bus.
    pub(crate) fn op_out_c_r<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let r = (opcode >> 3) & 0x07;
        let port = self.get_bc();
        let val = if r == 6 { 0 } else { self.get_reg8(r) };
        bus.io_write(port, val);
        self.memptr = port.wrapping_add(1);
        12
    }
}
