use crate::core::Bus;
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// Evaluate a condition code (3 bits from opcode bits 5-3).
    /// 0=NZ, 1=Z, 2=NC, 3=C, 4=PO, 5=PE, 6=P, 7=M
    pub(crate) fn eval_condition(&self, cc: u8) -> bool {
        match cc {
            0 => !self.flag(Flag::Z),  // NZ
            1 => self.flag(Flag::Z),   // Z
            2 => !self.flag(Flag::C),  // NC
            3 => self.flag(Flag::C),   // C
            4 => !self.flag(Flag::PV), // PO (parity odd)
            5 => self.flag(Flag::PV),  // PE (parity even)
            6 => !self.flag(Flag::S),  // P (positive)
            7 => self.flag(Flag::S),   // M (minus)
            _ => unreachable!(),
        }
    }

    /// JP nn — 10 T
    pub(crate) fn op_jp_nn<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u32 {
        let addr = self.read_immediate16(bus);
        self.pc = addr;
        self.memptr = addr;
        10
    }

    /// JP cc,nn — 10 T whether taken or not
    pub(crate) fn op_jp_cc_nn<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let cc = (opcode >> 3) & 0x07;
        let addr = self.read_immediate16(bus);
        self.memptr = addr;
        if self.eval_condition(cc) {
            self.pc = addr;
        }
        10
    }

    /// JP (HL) (or IX/IY) — 4 T
    pub(crate) fn op_jp_hl(&mut self) -> u32 {
        self.pc = self.get_rp(2);
        4
    }

    /// JR e — 12 T
    pub(crate) fn op_jr_e<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u32 {
        let disp = self.read_immediate(bus) as i8;
        self.pc = self.pc.wrapping_add(disp as i16 as u16);
        self.memptr = self.pc;
        12
    }

    /// JR cc,e — 12 T taken, 7 T not taken. The displacement byte is read
    /// either way (PC always advances past it).
    pub(crate) fn op_jr_cc_e<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let cc = (opcode >> 3) & 0x03;
        let disp = self.read_immediate(bus) as i8;
        if self.eval_condition(cc) {
            self.pc = self.pc.wrapping_add(disp as i16 as u16);
            self.memptr = self.pc;
            12
        } else {
            7
        }
    }

    /// DJNZ e — 13 T taken, 8 T not
    pub(crate) fn op_djnz<B: Bus<Address = u16, Data = u8> + ?Sized>(&mut self, bus: &mut B) -> u32 {
        let disp = self.read_immediate(bus) as i8;
        self.b = self.b.wrapping_sub(1);
        if self.b != 0 {
            self.pc = self.pc.wrapping_add(disp as i16 as u16);
            self.memptr = self.pc;
            13
        } else {
            8
        }
    }

    /// CALL nn — 17 T
    pub(crate) fn op_call_nn<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> u32 {
        let addr = self.read_immediate16(bus);
        let ret = self.pc;
        self.push16(bus, ret);
        self.pc = addr;
        self.memptr = addr;
        17
    }

    /// CALL cc,nn — 17 T taken, 10 T not
    pub(crate) fn op_call_cc_nn<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let cc = (opcode >> 3) & 0x07;
        let addr = self.read_immediate16(bus);
        self.memptr = addr;
        if self.eval_condition(cc) {
            let ret = self.pc;
            self.push16(bus, ret);
            self.pc = addr;
            17
        } else {
            10
        }
    }

    /// RET — 10 T
    pub(crate) fn op_ret<B: Bus<Address = u16, Data = u8> + ?Sized>(&mut self, bus: &mut B) -> u32 {
        self.pc = self.pop16(bus);
        self.memptr = self.pc;
        10
    }

    /// RET cc — 11 T taken, 5 T not
    pub(crate) fn op_ret_cc<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let cc = (opcode >> 3) & 0x07;
        if self.eval_condition(cc) {
            self.pc = self.pop16(bus);
            self.memptr = self.pc;
            11
        } else {
            5
        }
    }

    /// RETN/RETI (ED 45/4D and mirrors) — 14 T. Both restore IFF1 from
    /// IFF2, which is what lets NMI handlers return with interrupt state
    /// intact.
    pub(crate) fn op_retn<B: Bus<Address = u16, Data = u8> + ?Sized>(&mut self, bus: &mut B) -> u32 {
        self.iff1 = self.iff2;
        self.pc = self.pop16(bus);
        self.memptr = self.pc;
        14
    }

    /// RST p — 11 T. Target is opcode bits 5-3 times 8.
    pub(crate) fn op_rst<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let target = (opcode & 0x38) as u16;
        let ret = self.pc;
        self.push16(bus, ret);
        self.pc = target;
        self.memptr = target;
        11
    }
}
