mod alu;
mod bit;
mod block;
mod branch;
mod load_store;
mod stack;

use crate::core::Bus;
use crate::cpu::state::Z80State;

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum Flag {
    C = 0x01,  // Carry
    N = 0x02,  // Add/Subtract
    PV = 0x04, // Parity/Overflow
    X = 0x08,  // Unused (copy of bit 3)
    H = 0x10,  // Half Carry
    Y = 0x20,  // Unused (copy of bit 5)
    Z = 0x40,  // Zero
    S = 0x80,  // Sign
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IndexMode {
    HL,
    IX,
    IY,
}

/// Faults the interpreter does not model. Everything else either completes
/// with a defined post-state or follows real-hardware semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    /// DD/FD followed by another prefix byte (DD, FD or ED).
    IllegalPrefix { prefix: u8, opcode: u8, pc: u16 },
    /// A maskable interrupt arrived while IM 0 was selected.
    UnsupportedInterruptMode(u8),
}

impl std::fmt::Display for CpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IllegalPrefix { prefix, opcode, pc } => write!(
                f,
                "illegal prefix sequence {prefix:02X} {opcode:02X} at PC=0x{pc:04X}"
            ),
            Self::UnsupportedInterruptMode(im) => {
                write!(f, "interrupt taken in unsupported mode IM {im}")
            }
        }
    }
}

impl std::error::Error for CpuError {}

pub struct Z80 {
    // Registers
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    // Shadow Registers
    pub a_prime: u8,
    pub f_prime: u8,
    pub b_prime: u8,
    pub c_prime: u8,
    pub d_prime: u8,
    pub e_prime: u8,
    pub h_prime: u8,
    pub l_prime: u8,
    // Index & Special Registers
    pub ix: u16,
    pub iy: u16,
    pub i: u8,
    pub r: u8,
    pub sp: u16,
    pub pc: u16,

    // Internal state
    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
    pub memptr: u16, // Hidden WZ register
    pub halted: bool,
    pub ei_delay: bool,

    // Active index prefix for the instruction being executed
    pub(crate) index_mode: IndexMode,

    // NMI is edge-triggered; remember the line level from the previous step
    pub(crate) nmi_previous: bool,
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Z80 {
    pub fn new() -> Self {
        Self {
            a: 0xFF,
            f: 0xFF,
            b: 0xFF,
            c: 0xFF,
            d: 0xFF,
            e: 0xFF,
            h: 0xFF,
            l: 0xFF,
            a_prime: 0xFF,
            f_prime: 0xFF,
            b_prime: 0xFF,
            c_prime: 0xFF,
            d_prime: 0xFF,
            e_prime: 0xFF,
            h_prime: 0xFF,
            l_prime: 0xFF,
            ix: 0xFFFF,
            iy: 0xFFFF,
            i: 0,
            r: 0,
            sp: 0xFFFF,
            pc: 0x0000,
            iff1: false,
            iff2: false,
            im: 0,
            memptr: 0,
            halted: false,
            ei_delay: false,
            index_mode: IndexMode::HL,
            nmi_previous: false,
        }
    }

    pub fn reset(&mut self) {
        self.a = 0xFF;
        self.f = 0xFF;
        self.sp = 0xFFFF;
        self.pc = 0x0000;
        self.i = 0;
        self.r = 0;
        self.im = 0;
        self.iff1 = false;
        self.iff2 = false;
        self.halted = false;
        self.ei_delay = false;
        self.index_mode = IndexMode::HL;
    }

    pub fn snapshot(&self) -> Z80State {
        Z80State {
            a: self.a,
            f: self.f,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            a_prime: self.a_prime,
            f_prime: self.f_prime,
            b_prime: self.b_prime,
            c_prime: self.c_prime,
            d_prime: self.d_prime,
            e_prime: self.e_prime,
            h_prime: self.h_prime,
            l_prime: self.l_prime,
            ix: self.ix,
            iy: self.iy,
            sp: self.sp,
            pc: self.pc,
            i: self.i,
            r: self.r,
            iff1: self.iff1,
            iff2: self.iff2,
            im: self.im,
            memptr: self.memptr,
            halted: self.halted,
        }
    }

    // --- 16-bit register pair access ---

    pub fn get_bc(&self) -> u16 {
        ((self.b as u16) << 8) | self.c as u16
    }
    pub fn set_bc(&mut self, val: u16) {
        self.b = (val >> 8) as u8;
        self.c = val as u8;
    }

    pub fn get_de(&self) -> u16 {
        ((self.d as u16) << 8) | self.e as u16
    }
    pub fn set_de(&mut self, val: u16) {
        self.d = (val >> 8) as u8;
        self.e = val as u8;
    }

    pub fn get_hl(&self) -> u16 {
        ((self.h as u16) << 8) | self.l as u16
    }
    pub fn set_hl(&mut self, val: u16) {
        self.h = (val >> 8) as u8;
        self.l = val as u8;
    }

    pub fn get_af(&self) -> u16 {
        ((self.a as u16) << 8) | self.f as u16
    }
    pub fn set_af(&mut self, val: u16) {
        self.a = (val >> 8) as u8;
        self.f = val as u8;
    }

    pub(crate) fn flag(&self, fl: Flag) -> bool {
        (self.f & fl as u8) != 0
    }

    // --- Register decode (index values from opcode bit fields) ---

    pub fn get_reg8(&self, index: u8) -> u8 {
        match index {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            7 => self.a,
            _ => unreachable!("get_reg8 called with index {}", index),
        }
    }

    pub fn set_reg8(&mut self, index: u8, val: u8) {
        match index {
            0 => self.b = val,
            1 => self.c = val,
            2 => self.d = val,
            3 => self.e = val,
            4 => self.h = val,
            5 => self.l = val,
            7 => self.a = val,
            _ => unreachable!("set_reg8 called with index {}", index),
        }
    }

    /// Get 8-bit register by index, respecting IX/IY prefix for H/L
    /// (undocumented IXH/IXL/IYH/IYL). Index 6 is NOT handled here — callers
    /// must handle (HL)/(IX+d)/(IY+d) separately.
    pub fn get_reg8_ix(&self, index: u8) -> u8 {
        match (index, self.index_mode) {
            (4, IndexMode::IX) => (self.ix >> 8) as u8,
            (5, IndexMode::IX) => self.ix as u8,
            (4, IndexMode::IY) => (self.iy >> 8) as u8,
            (5, IndexMode::IY) => self.iy as u8,
            _ => self.get_reg8(index),
        }
    }

    pub fn set_reg8_ix(&mut self, index: u8, val: u8) {
        match (index, self.index_mode) {
            (4, IndexMode::IX) => self.ix = (self.ix & 0x00FF) | ((val as u16) << 8),
            (5, IndexMode::IX) => self.ix = (self.ix & 0xFF00) | val as u16,
            (4, IndexMode::IY) => self.iy = (self.iy & 0x00FF) | ((val as u16) << 8),
            (5, IndexMode::IY) => self.iy = (self.iy & 0xFF00) | val as u16,
            _ => self.set_reg8(index, val),
        }
    }

    /// Get 16-bit register pair by index (0=BC, 1=DE, 2=HL/IX/IY, 3=SP).
    /// Index 2 respects the current index mode for DD/FD prefixed instructions.
    pub(crate) fn get_rp(&self, index: u8) -> u16 {
        match index {
            0 => self.get_bc(),
            1 => self.get_de(),
            2 => match self.index_mode {
                IndexMode::HL => self.get_hl(),
                IndexMode::IX => self.ix,
                IndexMode::IY => self.iy,
            },
            3 => self.sp,
            _ => unreachable!("get_rp called with index {}", index),
        }
    }

    pub(crate) fn set_rp(&mut self, index: u8, val: u16) {
        match index {
            0 => self.set_bc(val),
            1 => self.set_de(val),
            2 => match self.index_mode {
                IndexMode::HL => self.set_hl(val),
                IndexMode::IX => self.ix = val,
                IndexMode::IY => self.iy = val,
            },
            3 => self.sp = val,
            _ => unreachable!("set_rp called with index {}", index),
        }
    }

    /// Get 16-bit register pair by index for PUSH/POP (3 = AF instead of SP).
    pub(crate) fn get_rp_af(&self, index: u8) -> u16 {
        if index == 3 { self.get_af() } else { self.get_rp(index) }
    }

    pub(crate) fn set_rp_af(&mut self, index: u8, val: u16) {
        if index == 3 {
            self.set_af(val);
        } else {
            self.set_rp(index, val);
        }
    }

    // --- Fetch / memory helpers ---

    pub(crate) fn bump_r(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }

    /// M1 opcode fetch: read at PC, advance PC, refresh R.
    fn fetch_opcode<B: Bus<Address = u16, Data = u8> + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let op = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        self.bump_r();
        op
    }

    /// Immediate operand byte (no R refresh).
    pub(crate) fn read_immediate<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u8 {
        let v = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        v
    }

    /// Immediate operand word, little-endian.
    pub(crate) fn read_immediate16<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u16 {
        let lo = self.read_immediate(bus) as u16;
        let hi = self.read_immediate(bus) as u16;
        (hi << 8) | lo
    }

    pub(crate) fn read16<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        addr: u16,
    ) -> u16 {
        let lo = bus.read(addr) as u16;
        let hi = bus.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    pub(crate) fn write16<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        addr: u16,
        val: u16,
    ) {
        bus.write(addr, val as u8);
        bus.write(addr.wrapping_add(1), (val >> 8) as u8);
    }

    /// Push a word: high byte first into decreasing SP.
    pub(crate) fn push16<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        val: u16,
    ) {
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, (val >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, val as u8);
    }

    pub(crate) fn pop16<B: Bus<Address = u16, Data = u8> + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = bus.read(self.sp) as u16;
        self.sp = self.sp.wrapping_add(1);
        let hi = bus.read(self.sp) as u16;
        self.sp = self.sp.wrapping_add(1);
        (hi << 8) | lo
    }

    /// Effective address of the (HL)/(IX+d)/(IY+d) operand. In an index mode
    /// this reads the displacement byte at PC and latches the address in
    /// MEMPTR.
    pub(crate) fn effective_addr<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u16 {
        match self.index_mode {
            IndexMode::HL => self.get_hl(),
            IndexMode::IX => {
                let d = self.read_immediate(bus) as i8;
                self.memptr = self.ix.wrapping_add(d as i16 as u16);
                self.memptr
            }
            IndexMode::IY => {
                let d = self.read_immediate(bus) as i8;
                self.memptr = self.iy.wrapping_add(d as i16 as u16);
                self.memptr
            }
        }
    }

    pub(crate) fn indexed(&self) -> bool {
        self.index_mode != IndexMode::HL
    }

    // --- Step loop ---

    /// Execute one instruction (or service one interrupt) and return the
    /// number of T-states consumed.
    pub fn step<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> Result<u32, CpuError> {
        // EI takes effect on the boundary after the following instruction:
        // the shadow suppresses exactly one IRQ check.
        let ei_shadow = self.ei_delay;
        self.ei_delay = false;

        let ints = bus.check_interrupts();

        // NMI: edge-triggered, not maskable, not delayed by EI
        let nmi_edge = ints.nmi && !self.nmi_previous;
        self.nmi_previous = ints.nmi;
        if nmi_edge {
            return Ok(self.service_nmi(bus));
        }

        // IRQ: level-triggered, masked by IFF1
        if ints.irq && self.iff1 && !ei_shadow {
            return self.service_irq(bus, ints.irq_vector);
        }

        if self.halted {
            // HALT executes internal NOPs until an interrupt wakes it
            self.bump_r();
            return Ok(4);
        }

        self.index_mode = IndexMode::HL;
        let opcode = self.fetch_opcode(bus);
        match opcode {
            0xCB => Ok(self.execute_cb(bus)),
            0xED => self.execute_ed_prefixed(bus),
            0xDD => self.execute_indexed(IndexMode::IX, bus),
            0xFD => self.execute_indexed(IndexMode::IY, bus),
            _ => Ok(self.execute_main(opcode, bus)),
        }
    }

    fn service_nmi<B: Bus<Address = u16, Data = u8> + ?Sized>(&mut self, bus: &mut B) -> u32 {
        self.halted = false;
        self.iff1 = false; // IFF2 preserved for RETN
        self.bump_r();
        let pc = self.pc;
        self.push16(bus, pc);
        self.pc = 0x0066;
        self.memptr = self.pc;
        11
    }

    fn service_irq<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
        vector: u8,
    ) -> Result<u32, CpuError> {
        self.halted = false;
        self.iff1 = false;
        self.iff2 = false;
        self.bump_r();
        let pc = self.pc;
        match self.im {
            1 => {
                self.push16(bus, pc);
                self.pc = 0x0038;
                self.memptr = self.pc;
                Ok(13)
            }
            2 => {
                // The vector byte joins I on the address bus; the table
                // entry address is forced even.
                self.push16(bus, pc);
                let table = (((self.i as u16) << 8) | vector as u16) & 0xFFFE;
                self.pc = self.read16(bus, table);
                self.memptr = self.pc;
                Ok(19)
            }
            im => Err(CpuError::UnsupportedInterruptMode(im)),
        }
    }

    /// DD/FD prefix: select the index register for exactly one opcode.
    /// A second prefix byte (or ED) is not modelled and faults.
    fn execute_indexed<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        mode: IndexMode,
        bus: &mut B,
    ) -> Result<u32, CpuError> {
        let prefix = if mode == IndexMode::IX { 0xDD } else { 0xFD };
        self.index_mode = mode;
        let opcode = self.fetch_opcode(bus);
        let tstates = match opcode {
            0xDD | 0xFD | 0xED => {
                return Err(CpuError::IllegalPrefix {
                    prefix,
                    opcode,
                    pc: self.pc.wrapping_sub(2),
                });
            }
            0xCB => self.execute_index_cb(bus) + 4,
            _ => self.execute_main(opcode, bus) + 4,
        };
        self.index_mode = IndexMode::HL;
        Ok(tstates)
    }

    fn execute_ed_prefixed<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> Result<u32, CpuError> {
        self.index_mode = IndexMode::HL;
        let opcode = self.fetch_opcode(bus);
        Ok(self.execute_ed(opcode, bus))
    }

    /// Unprefixed opcode table. Handlers return their full T-state count
    /// (including the opcode fetch); under DD/FD the caller adds the prefix
    /// fetch.
    fn execute_main<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        match opcode {
            // NOP — 4 T
            0x00 => 4,

            // HALT — 4 T. PC stays past HALT (already incremented by fetch).
            0x76 => {
                self.halted = true;
                4
            }

            // --- Load/Store ---

            // LD (BC),A / LD (DE),A — 7 T
            0x02 => self.op_ld_rr_ind_a(self.get_bc(), bus),
            0x12 => self.op_ld_rr_ind_a(self.get_de(), bus),
            // LD A,(BC) / LD A,(DE) — 7 T
            0x0A => self.op_ld_a_rr_ind(self.get_bc(), bus),
            0x1A => self.op_ld_a_rr_ind(self.get_de(), bus),
            // LD (nn),HL — 16 T
            0x22 => self.op_ld_nn_hl(bus),
            // LD HL,(nn) — 16 T
            0x2A => self.op_ld_hl_nn(bus),
            // LD (nn),A — 13 T
            0x32 => self.op_ld_nn_a(bus),
            // LD A,(nn) — 13 T
            0x3A => self.op_ld_a_nn(bus),
            // LD SP,HL — 6 T
            0xF9 => self.op_ld_sp_hl(),

            // LD rr,nn (0x01/0x11/0x21/0x31) — 10 T
            op if (op & 0xCF) == 0x01 => self.op_ld_rr_nn(op, bus),
            // LD r,n (0x06, 0x0E, ... 0x3E) — 7 T (10 T for (HL))
            op if (op & 0xC7) == 0x06 => self.op_ld_r_n(op, bus),
            // LD r,r' (0x40-0x7F excluding 0x76) — 4/7 T
            op if (op & 0xC0) == 0x40 => self.op_ld_r_r(op, bus),

            // --- Exchanges ---

            // EX AF,AF' — 4 T
            0x08 => self.op_ex_af_af(),
            // EXX — 4 T
            0xD9 => self.op_exx(),
            // EX DE,HL — 4 T
            0xEB => self.op_ex_de_hl(),
            // EX (SP),HL — 19 T
            0xE3 => self.op_ex_sp_hl(bus),

            // --- Stack ---

            // PUSH rr (0xC5/D5/E5/F5) — 11 T
            op if (op & 0xCF) == 0xC5 => self.op_push(op, bus),
            // POP rr (0xC1/D1/E1/F1) — 10 T
            op if (op & 0xCF) == 0xC1 => self.op_pop(op, bus),

            // --- ALU ---

            // ALU A,r (0x80-0xBF) — 4 T (reg) or 7 T (memory)
            op if (op & 0xC0) == 0x80 => self.op_alu_r(op, bus),
            // ALU A,n (0xC6, 0xCE, ... 0xFE) — 7 T
            op if (op & 0xC7) == 0xC6 => self.op_alu_n(op, bus),

            // INC/DEC r (0x04/0x05, 0x0C/0x0D, ...) — 4 T (reg) or 11 T ((HL))
            op if (op & 0xC7) == 0x04 || (op & 0xC7) == 0x05 => self.op_inc_dec_r(op, bus),

            // ADD HL,rr (0x09/0x19/0x29/0x39) — 11 T
            op if (op & 0xCF) == 0x09 => self.op_add_hl_rr(op),
            // INC/DEC rr (0x03/0x13/... and 0x0B/0x1B/...) — 6 T
            op if (op & 0xCF) == 0x03 || (op & 0xCF) == 0x0B => self.op_inc_dec_rr(op),

            // Accumulator rotates — 4 T
            0x07 => self.op_rlca(),
            0x0F => self.op_rrca(),
            0x17 => self.op_rla(),
            0x1F => self.op_rra(),

            // Misc ALU — 4 T
            0x27 => self.op_daa(),
            0x2F => self.op_cpl(),
            0x37 => self.op_scf(),
            0x3F => self.op_ccf(),

            // --- Branch/Control Flow ---

            // JP nn — 10 T
            0xC3 => self.op_jp_nn(bus),
            // JP (HL) — 4 T
            0xE9 => self.op_jp_hl(),
            // JR e — 12 T
            0x18 => self.op_jr_e(bus),
            // DJNZ e — 13/8 T
            0x10 => self.op_djnz(bus),
            // CALL nn — 17 T
            0xCD => self.op_call_nn(bus),
            // RET — 10 T
            0xC9 => self.op_ret(bus),

            // IN A,(n) — 11 T
            0xDB => self.op_in_a_n(bus),
            // OUT (n),A — 11 T
            0xD3 => self.op_out_n_a(bus),

            // DI / EI — 4 T
            0xF3 => self.op_di(),
            0xFB => self.op_ei(),

            // JP cc,nn — 10 T
            op if (op & 0xC7) == 0xC2 => self.op_jp_cc_nn(op, bus),
            // JR cc,e — 12/7 T (NZ/Z/NC/C only)
            op if (op & 0xE7) == 0x20 => self.op_jr_cc_e(op, bus),
            // CALL cc,nn — 17/10 T
            op if (op & 0xC7) == 0xC4 => self.op_call_cc_nn(op, bus),
            // RET cc — 11/5 T
            op if (op & 0xC7) == 0xC0 => self.op_ret_cc(op, bus),
            // RST p — 11 T
            op if (op & 0xC7) == 0xC7 => self.op_rst(op, bus),

            // CB/ED/DD/FD never reach this table
            _ => unreachable!("opcode {:02X} not dispatched", opcode),
        }
    }

    /// ED prefix table. Totals include both opcode fetches.
    fn execute_ed<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        match opcode {
            0x47 => self.op_ld_i_a(), // LD I,A — 9 T
            0x4F => self.op_ld_r_a(), // LD R,A — 9 T
            0x57 => self.op_ld_a_i(), // LD A,I — 9 T
            0x5F => self.op_ld_a_r(), // LD A,R — 9 T

            0x67 => self.op_rrd(bus), // RRD — 18 T
            0x6F => self.op_rld(bus), // RLD — 18 T

            // --- Block transfer/compare/IO ---
            0xA0 | 0xA8 => self.op_ldi_ldd(opcode, bus), // LDI/LDD — 16 T
            0xA1 | 0xA9 => self.op_cpi_cpd(opcode, bus), // CPI/CPD — 16 T
            0xA2 | 0xAA => self.op_ini_ind(opcode, bus), // INI/IND — 16 T
            0xA3 | 0xAB => self.op_outi_outd(opcode, bus), // OUTI/OUTD — 16 T
            0xB0 | 0xB8 => self.op_ldir_lddr(opcode, bus), // LDIR/LDDR — 21/16 T
            0xB1 | 0xB9 => self.op_cpir_cpdr(opcode, bus), // CPIR/CPDR — 21/16 T
            0xB2 | 0xBA => self.op_inir_indr(opcode, bus), // INIR/INDR — 21/16 T
            0xB3 | 0xBB => self.op_otir_otdr(opcode, bus), // OTIR/OTDR — 21/16 T

            // --- Pattern-based rows ---
            op if (op & 0xC7) == 0x40 => self.op_in_r_c(op, bus), // IN r,(C) — 12 T
            op if (op & 0xC7) == 0x41 => self.op_out_c_r(op, bus), // OUT (C),r — 12 T
            op if (op & 0xCF) == 0x42 => self.op_sbc_hl_rr(op),   // SBC HL,rr — 15 T
            op if (op & 0xCF) == 0x43 => self.op_ld_nn_rr_ed(op, bus), // LD (nn),rr — 20 T
            op if (op & 0xC7) == 0x44 => self.op_neg(),           // NEG — 8 T
            op if (op & 0xC7) == 0x45 => self.op_retn(bus),       // RETN/RETI — 14 T
            op if (op & 0xC7) == 0x46 => self.op_im(op),          // IM 0/1/2 — 8 T
            op if (op & 0xCF) == 0x4A => self.op_adc_hl_rr(op),   // ADC HL,rr — 15 T
            op if (op & 0xCF) == 0x4B => self.op_ld_rr_nn_ed(op, bus), // LD rr,(nn) — 20 T

            // Undefined ED rows act as two-byte NOPs — 8 T
            _ => 8,
        }
    }

    // --- Interrupt control ---

    fn op_di(&mut self) -> u32 {
        self.iff1 = false;
        self.iff2 = false;
        4
    }

    fn op_ei(&mut self) -> u32 {
        self.iff1 = true;
        self.iff2 = true;
        // The instruction after EI runs before any IRQ is accepted
        self.ei_delay = true;
        4
    }

    fn op_im(&mut self, opcode: u8) -> u32 {
        self.im = match (opcode >> 3) & 0x03 {
            2 => 1,
            3 => 2,
            _ => 0, // 0x46/0x4E rows: IM 0 (0x4E undefined, treated as 0)
        };
        8
    }
}
