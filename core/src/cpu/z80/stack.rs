use crate::core::Bus;
use crate::cpu::z80::Z80;

impl Z80 {
    /// PUSH rr — 11 T. High byte first into decreasing SP.
    /// Opcode mask: 11 rr0 101 (rr: 0=BC, 1=DE, 2=HL/IX/IY, 3=AF)
    pub(crate) fn op_push<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let val = self.get_rp_af(rp);
        self.push16(bus, val);
        11
    }

    /// POP rr — 10 T.
    /// Opcode mask: 11 rr0 001 (rr: 0=BC, 1=DE, 2=HL/IX/IY, 3=AF)
    pub(crate) fn op_pop<B: Bus<Address = u16, Data = u8> + ?Sized>(
        &mut self,
        opcode: u8,
        bus: &mut B,
    ) -> u32 {
        let rp = (opcode >> 4) & 0x03;
        let val = self.pop16(bus);
        self.set_rp_af(rp, val);
        10
    }
}
