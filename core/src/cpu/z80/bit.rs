use crate::core::Bus;
use crate::cpu::z80::{Flag, IndexMode, Z80};

impl Z80 {
    /// Perform a CB rotate/shift operation on a value.
    /// op: 0=RLC, 1=RRC, 2=RL, 3=RR, 4=SLA, 5=SRA, 6=SLL(undoc), 7=SRL.
    /// Returns (result, new_flags): S, Z, PV(parity), C from the shifted
    /// bit, X/Y from the result, H=0, N=0.
    fn do_cb_rotate_shift(&self, op: u8, val: u8) -> (u8, u8) {
        let (result, carry) = match op {
            0 => {
                // RLC: rotate left circular
                let c = (val >> 7) & 1;
                ((val << 1) | c, c)
            }
            1 => {
                // RRC: rotate right circular
                let c = val & 1;
                ((val >> 1) | (c << 7), c)
            }
            2 => {
                // RL: rotate left through carry
                let old_c = if self.flag(Flag::C) { 1 } else { 0 };
                let c = (val >> 7) & 1;
                ((val << 1) | old_c, c)
            }
            3 => {
                // RR: rotate right through carry
                let old_c = if self.flag(Flag::C) { 0x80 } else { 0 };
                let c = val & 1;
                ((val >> 1) | old_c, c)
            }
            4 => {
                // SLA: shift left arithmetic
                let c = (val >> 7) & 1;
                (val << 1, c)
            }
            5 => {
                // SRA: shift right arithmetic (preserves sign)
                let c = val & 1;
                (((val as i8) >> 1) as u8, c)
            }
            6 => {
                // SLL: shift left, set bit 0 (undocumented)
                let c = (val >> 7) & 1;
                ((val << 1) | 1, c)
            }
            7 => {
                // SRL: shift right logical
                let c = val & 1;
                (val >> 1, c)
            }
            _ => unreachable!(),
        };

        let mut f = 0;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if Self::get_parity(result) {
            f |= Flag::PV as u8;
        }
        if carry != 0 {
            f |= Flag::C as u8;
        }
        // H = 0, N = 0
        f |= result & (Flag::X as u8 | Flag::Y as u8);

        (result, f)
    }

    /// BIT flag update. Z = PV = NOT tested bit; S only for a set bit 7;
    /// H = 1, N = 0, C preserved. X/Y come from `xy_source` (the operand
    /// for register forms, the high byte of the effective address for
    /// memory forms).
    fn set_bit_test_flags(&mut self, bit: u8, val: u8, xy_source: u8) {
        let tested = val & (1 << bit);
        let mut f = self.f & Flag::C as u8;
        f |= Flag::H as u8;
        if tested == 0 {
            f |= Flag::Z as u8 | Flag::PV as u8;
        }
        if bit == 7 && tested != 0 {
            f |= Flag::S as u8;
        }
        f |= xy_source & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    /// CB prefix: rotate/shift, BIT, RES, SET.
    /// Register forms 8 T; BIT b,(HL) 12 T; rotate/RES/SET (HL) 15 T.
    pub(crate) fn execute_cb<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u32 {
        // The CB sub-opcode is a full M1 fetch (R is refreshed)
        let op = self.fetch_opcode(bus);
        let xx = (op >> 6) & 0x03; // 0=rot/shift, 1=BIT, 2=RES, 3=SET
        let yyy = (op >> 3) & 0x07; // bit number or shift operation
        let zzz = op & 0x07; // register index

        if zzz == 6 {
            let addr = self.get_hl();
            if xx == 1 {
                // BIT b,(HL)
                let val = bus.read(addr);
                self.set_bit_test_flags(yyy, val, (addr >> 8) as u8);
                12
            } else {
                // Read-modify-write forms
                let val = bus.read(addr);
                let result = match xx {
                    0 => {
                        let (result, f) = self.do_cb_rotate_shift(yyy, val);
                        self.f = f;
                        result
                    }
                    2 => val & !(1 << yyy), // RES — no flags
                    3 => val | (1 << yyy),  // SET — no flags
                    _ => unreachable!(),
                };
                bus.write(addr, result);
                15
            }
        } else {
            let val = self.get_reg8(zzz);
            match xx {
                0 => {
                    let (result, f) = self.do_cb_rotate_shift(yyy, val);
                    self.f = f;
                    self.set_reg8(zzz, result);
                }
                1 => self.set_bit_test_flags(yyy, val, val),
                2 => self.set_reg8(zzz, val & !(1 << yyy)),
                3 => self.set_reg8(zzz, val | (1 << yyy)),
                _ => unreachable!(),
            }
            8
        }
    }

    /// DD CB d op / FD CB d op: bit operations on (IX+d)/(IY+d). The
    /// displacement byte comes BEFORE the sub-opcode, and neither byte is
    /// an M1 fetch (R is not refreshed). Non-memory register columns get
    /// the undocumented copy of the result.
    ///
    /// Totals here exclude the DD/FD prefix fetch (+4 added by the caller):
    /// BIT 16 (20 total), rotate/RES/SET 19 (23 total).
    pub(crate) fn execute_index_cb<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u32 {
        let d = self.read_immediate(bus) as i8;
        let base = match self.index_mode {
            IndexMode::IX => self.ix,
            IndexMode::IY => self.iy,
            IndexMode::HL => unreachable!("index CB without an index prefix"),
        };
        let addr = base.wrapping_add(d as i16 as u16);
        self.memptr = addr;
        let op = self.read_immediate(bus);

        let xx = (op >> 6) & 0x03;
        let yyy = (op >> 3) & 0x07;
        let zzz = op & 0x07;

        if xx == 1 {
            // BIT b,(IX+d) — X/Y from the high byte of the computed address
            let val = bus.read(addr);
            self.set_bit_test_flags(yyy, val, (addr >> 8) as u8);
            16
        } else {
            let val = bus.read(addr);
            let result = match xx {
                0 => {
                    let (result, f) = self.do_cb_rotate_shift(yyy, val);
                    self.f = f;
                    result
                }
                2 => val & !(1 << yyy),
                3 => val | (1 << yyy),
                _ => unreachable!(),
            };
            bus.write(addr, result);
            if zzz != 6 {
                // Undocumented: result is also copied to the named register
                self.set_reg8(zzz, result);
            }
            19
        }
    }
}
