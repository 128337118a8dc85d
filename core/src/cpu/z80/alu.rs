use crate::core::Bus;
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    // --- Flag Helpers ---

    pub(crate) fn get_parity(val: u8) -> bool {
        val.count_ones() % 2 == 0
    }

    fn update_flags_logic(&mut self, result: u8, is_and: bool) {
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
        if is_and {
            f |= Flag::H as u8; // AND sets H, OR/XOR clear it
        }
        // N = 0, C = 0
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    fn do_add(&mut self, val: u8, carry_in: bool) {
        let a = self.a;
        let c_val: u8 = if carry_in && self.flag(Flag::C) { 1 } else { 0 };
        let result_u16 = (a as u16) + (val as u16) + (c_val as u16);
        let result = result_u16 as u8;

        let mut f = 0;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        // H: carry out of bit 3
        if ((a & 0xF) + (val & 0xF) + c_val) > 0xF {
            f |= Flag::H as u8;
        }
        // P/V: signed overflow = (op1 ^ res) & (op2 ^ res) & 0x80
        if ((a ^ result) & (val ^ result) & 0x80) != 0 {
            f |= Flag::PV as u8;
        }
        // N = 0
        if result_u16 > 0xFF {
            f |= Flag::C as u8;
        }

        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.a = result;
        self.f = f;
    }

    fn do_sub(&mut self, val: u8, carry_in: bool) {
        let a = self.a;
        let c_val: u8 = if carry_in && self.flag(Flag::C) { 1 } else { 0 };
        let result_u16 = (a as u16)
            .wrapping_sub(val as u16)
            .wrapping_sub(c_val as u16);
        let result = result_u16 as u8;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        // H: borrow into bit 4
        if (a & 0xF) < ((val & 0xF) + c_val) {
            f |= Flag::H as u8;
        }
        // P/V: signed overflow = (op1 ^ op2) & (op1 ^ res) & 0x80
        if ((a ^ val) & (a ^ result) & 0x80) != 0 {
            f |= Flag::PV as u8;
        }
        if result_u16 > 0xFF {
            f |= Flag::C as u8;
        }

        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.a = result;
        self.f = f;
    }

    /// CP is SUB without the store; X/Y come from the operand, not the result.
    pub(crate) fn do_cp(&mut self, val: u8) {
        let a = self.a;
        let result_u16 = (a as u16).wrapping_sub(val as u16);
        let result = result_u16 as u8;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (a & 0xF) < (val & 0xF) {
            f |= Flag::H as u8;
        }
        if ((a ^ val) & (a ^ result) & 0x80) != 0 {
            f |= Flag::PV as u8;
        }
        if result_u16 > 0xFF {
            f |= Flag::C as u8;
        }

        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    fn perform_alu_op(&mut self, op: u8, val: u8) {
        match op {
            0 => self.do_add(val, false), // ADD
            1 => self.do_add(val, true),  // ADC
            2 => self.do_sub(val, false), // SUB
            3 => self.do_sub(val, true),  // SBC
            4 => {
                self.a &= val;
                self.update_flags_logic(self.a, true); // AND
            }
            5 => {
                self.a ^= val;
                self.update_flags_logic(self.a, false); // XOR
            }
            6 => {
                self.a |= val;
                self.update_flags_logic(self.a, false); // OR
            }
            7 => self.do_cp(val), // CP
            _ => unreachable!(),
        }
    }

    // --- 8-bit ALU instructions ---

    /// ALU A,r — ADD/ADC/SUB/SBC/AND/XOR/OR/CP. Opcode mask: 10 xxx zzz.
    pub(crate) fn op_alu_r<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let alu_op = (opcode >> 3) & 0x07;
        let r = opcode & 0x07;

        if r == 6 {
            // ALU A,(HL) / (IX+d) / (IY+d)
            let indexed = self.indexed();
            let addr = self.effective_addr(bus);
            let val = bus.read(addr);
            self.perform_alu_op(alu_op, val);
            if indexed { 15 } else { 7 }
        } else {
            let val = self.get_reg8_ix(r);
            self.perform_alu_op(alu_op, val);
            4
        }
    }

    /// ALU A,n. Opcode mask: 11 xxx 110.
    pub(crate) fn op_alu_n<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let alu_op = (opcode >> 3) & 0x07;
        let val = self.read_immediate(bus);
        self.perform_alu_op(alu_op, val);
        7
    }

    // --- INC/DEC ---

    fn calc_inc_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        let mut f = self.f & Flag::C as u8; // C preserved
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (val & 0xF) == 0xF {
            f |= Flag::H as u8;
        }
        if val == 0x7F {
            f |= Flag::PV as u8; // overflow 7F -> 80
        }
        // N = 0
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        result
    }

    fn calc_dec_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        let mut f = (self.f & Flag::C as u8) | Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if (val & 0xF) == 0x0 {
            f |= Flag::H as u8; // borrow from bit 4
        }
        if val == 0x80 {
            f |= Flag::PV as u8; // overflow 80 -> 7F
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        result
    }

    /// INC/DEC r. Opcode mask: 00 rrr 10x.
    pub(crate) fn op_inc_dec_r<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let r = (opcode >> 3) & 0x07;
        let is_dec = (opcode & 0x01) != 0;

        if r == 6 {
            // INC/DEC (HL) / (IX+d) — read-modify-write
            let indexed = self.indexed();
            let addr = self.effective_addr(bus);
            let val = bus.read(addr);
            let result = if is_dec {
                self.calc_dec_flags(val)
            } else {
                self.calc_inc_flags(val)
            };
            bus.write(addr, result);
            if indexed { 19 } else { 11 }
        } else {
            let val = self.get_reg8_ix(r);
            let result = if is_dec {
                self.calc_dec_flags(val)
            } else {
                self.calc_inc_flags(val)
            };
            self.set_reg8_ix(r, result);
            4
        }
    }

    /// INC/DEC rr — no flag effect. Opcode mask: 00 rr0 011 / 00 rr1 011.
    pub(crate) fn op_inc_dec_rr(&mut self, opcode: u8) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let is_dec = (opcode & 0x08) != 0;
        let val = self.get_rp(rp);
        let result = if is_dec {
            val.wrapping_sub(1)
        } else {
            val.wrapping_add(1)
        };
        self.set_rp(rp, result);
        6
    }

    // --- 16-bit arithmetic ---

    /// ADD HL,rr (or ADD IX/IY,rr under a prefix). Only H, N, C and X/Y
    /// change; X/Y mirror bits 11/13 of the result.
    pub(crate) fn op_add_hl_rr(&mut self, opcode: u8) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let lhs = self.get_rp(2);
        let rhs = self.get_rp(rp);
        let result = lhs.wrapping_add(rhs);

        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if ((lhs & 0x0FFF) + (rhs & 0x0FFF)) > 0x0FFF {
            f |= Flag::H as u8;
        }
        if (lhs as u32 + rhs as u32) > 0xFFFF {
            f |= Flag::C as u8;
        }
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;

        self.memptr = lhs.wrapping_add(1);
        self.set_rp(2, result);
        11
    }

    /// ADC HL,rr — full flag update (S, Z, P/V included).
    pub(crate) fn op_adc_hl_rr(&mut self, opcode: u8) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let lhs = self.get_hl();
        let rhs = self.get_rp(rp);
        let c_val: u16 = if self.flag(Flag::C) { 1 } else { 0 };
        let result_u32 = lhs as u32 + rhs as u32 + c_val as u32;
        let result = result_u32 as u16;

        let mut f = 0;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x8000) != 0 {
            f |= Flag::S as u8;
        }
        if ((lhs & 0x0FFF) + (rhs & 0x0FFF) + c_val) > 0x0FFF {
            f |= Flag::H as u8;
        }
        if ((lhs ^ result) & (rhs ^ result) & 0x8000) != 0 {
            f |= Flag::PV as u8;
        }
        if result_u32 > 0xFFFF {
            f |= Flag::C as u8;
        }
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;

        self.memptr = lhs.wrapping_add(1);
        self.set_hl(result);
        15
    }

    /// SBC HL,rr — full flag update, borrow semantics.
    pub(crate) fn op_sbc_hl_rr(&mut self, opcode: u8) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let lhs = self.get_hl();
        let rhs = self.get_rp(rp);
        let c_val: u16 = if self.flag(Flag::C) { 1 } else { 0 };
        let result_u32 = (lhs as u32)
            .wrapping_sub(rhs as u32)
            .wrapping_sub(c_val as u32);
        let result = result_u32 as u16;

        let mut f = Flag::N as u8;
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x8000) != 0 {
            f |= Flag::S as u8;
        }
        if (lhs & 0x0FFF) < ((rhs & 0x0FFF) + c_val) {
            f |= Flag::H as u8;
        }
        if ((lhs ^ rhs) & (lhs ^ result) & 0x8000) != 0 {
            f |= Flag::PV as u8;
        }
        if result_u32 > 0xFFFF {
            f |= Flag::C as u8;
        }
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;

        self.memptr = lhs.wrapping_add(1);
        self.set_hl(result);
        15
    }

    // --- Accumulator rotates (flags: C, N, H, X, Y only) ---

    pub(crate) fn op_rlca(&mut self) -> u32 {
        let carry = (self.a >> 7) & 1;
        self.a = (self.a << 1) | carry;
        self.set_acc_rotate_flags(carry != 0);
        4
    }

    pub(crate) fn op_rrca(&mut self) -> u32 {
        let carry = self.a & 1;
        self.a = (self.a >> 1) | (carry << 7);
        self.set_acc_rotate_flags(carry != 0);
        4
    }

    pub(crate) fn op_rla(&mut self) -> u32 {
        let old_c: u8 = if self.flag(Flag::C) { 1 } else { 0 };
        let carry = (self.a >> 7) & 1;
        self.a = (self.a << 1) | old_c;
        self.set_acc_rotate_flags(carry != 0);
        4
    }

    pub(crate) fn op_rra(&mut self) -> u32 {
        let old_c: u8 = if self.flag(Flag::C) { 0x80 } else { 0 };
        let carry = self.a & 1;
        self.a = (self.a >> 1) | old_c;
        self.set_acc_rotate_flags(carry != 0);
        4
    }

    fn set_acc_rotate_flags(&mut self, carry: bool) {
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if carry {
            f |= Flag::C as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    // --- Misc accumulator/flag operations ---

    /// Decimal adjust. The correction is applied as up-to-two sequential
    /// nibble adjustments; H reflects the low-nibble step and clears when
    /// the 0x60 step fires, C latches once the high correction applies.
    pub(crate) fn op_daa(&mut self) -> u32 {
        let n = self.flag(Flag::N);
        let a_in = self.a;
        let mut result = a_in;
        let mut h_out = false;
        let mut c_out = self.flag(Flag::C);

        if self.flag(Flag::H) || (a_in & 0x0F) > 9 {
            if n {
                h_out = (result & 0x0F) < 6;
                result = result.wrapping_sub(0x06);
            } else {
                h_out = (result & 0x0F) > 9;
                result = result.wrapping_add(0x06);
            }
        }
        if c_out || a_in > 0x99 {
            result = if n {
                result.wrapping_sub(0x60)
            } else {
                result.wrapping_add(0x60)
            };
            h_out = false;
            c_out = true;
        }

        let mut f = if self.flag(Flag::N) { Flag::N as u8 } else { 0 };
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if (result & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if Self::get_parity(result) {
            f |= Flag::PV as u8;
        }
        if h_out {
            f |= Flag::H as u8;
        }
        if c_out {
            f |= Flag::C as u8;
        }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.a = result;
        self.f = f;
        4
    }

    pub(crate) fn op_cpl(&mut self) -> u32 {
        self.a = !self.a;
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8 | Flag::C as u8);
        f |= Flag::N as u8 | Flag::H as u8;
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        4
    }

    pub(crate) fn op_scf(&mut self) -> u32 {
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        f |= Flag::C as u8;
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        4
    }

    pub(crate) fn op_ccf(&mut self) -> u32 {
        let old_c = self.flag(Flag::C);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if old_c {
            f |= Flag::H as u8;
        } else {
            f |= Flag::C as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        4
    }

    /// NEG — A = 0 - A through the generic subtract, so P/V and H follow
    /// the two-operand rules.
    pub(crate) fn op_neg(&mut self) -> u32 {
        let val = self.a;
        self.a = 0;
        self.do_sub(val, false);
        8
    }

    // --- Nibble rotates through (HL) ---

    /// RRD — low nibble of (HL) into A, A's low nibble into the high half
    /// of (HL).
    pub(crate) fn op_rrd<B: Bus<Address = u16, Data = u8> + ?Sized>(&mut self, bus: &mut B) -> u32 {
        let addr = self.get_hl();
        let mem = bus.read(addr);
        let new_mem = ((self.a & 0x0F) << 4) | (mem >> 4);
        self.a = (self.a & 0xF0) | (mem & 0x0F);
        bus.write(addr, new_mem);
        self.memptr = addr.wrapping_add(1);
        self.set_rotate_digit_flags();
        18
    }

    /// RLD — high nibble of (HL) into A, A's low nibble into the low half
    /// of (HL).
    pub(crate) fn op_rld<B: Bus<Address = u16, Data = u8> + ?Sized>(&mut self, bus: &mut B) -> u32 {
        let addr = self.get_hl();
        let mem = bus.read(addr);
        let new_mem = (mem << 4) | (self.a & 0x0F);
        self.a = (self.a & 0xF0) | (mem >> 4);
        bus.write(addr, new_mem);
        self.memptr = addr.wrapping_add(1);
        self.set_rotate_digit_flags();
        18
    }

    fn set_rotate_digit_flags(&mut self) {
        let mut f = self.f & Flag::C as u8;
        if self.a == 0 {
            f |= Flag::Z as u8;
        }
        if (self.a & 0x80) != 0 {
            f |= Flag::S as u8;
        }
        if Self::get_parity(self.a) {
            f |= Flag::PV as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }
}
