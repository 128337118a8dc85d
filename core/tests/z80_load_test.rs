use lumen_core::cpu::z80::Z80;
mod common;
use common::{TestBus, step};

// --- 8-bit loads ---

#[test]
fn test_ld_r_n() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x06, 0x42]); // LD B,0x42

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 7, "LD r,n should be 7 T-states");
    assert_eq!(cpu.b, 0x42);
    assert_eq!(cpu.pc, 2);
}

#[test]
fn test_ld_r_r() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.b = 0x99;
    bus.load(0, &[0x48]); // LD C,B

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 4);
    assert_eq!(cpu.c, 0x99);
}

#[test]
fn test_ld_r_hl_indirect() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    bus.load(0, &[0x7E]); // LD A,(HL)
    bus.load(0x4000, &[0x5A]);

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 7);
    assert_eq!(cpu.a, 0x5A);
}

#[test]
fn test_ld_hl_indirect_r() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    cpu.d = 0xA5;
    bus.load(0, &[0x72]); // LD (HL),D

    step(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x4000], 0xA5);
}

#[test]
fn test_ld_hl_indirect_n() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    bus.load(0, &[0x36, 0x7F]); // LD (HL),0x7F

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 10, "LD (HL),n should be 10 T-states");
    assert_eq!(bus.memory[0x4000], 0x7F);
}

#[test]
fn test_ld_a_bc_de_indirect() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x4000);
    cpu.set_de(0x4001);
    bus.load(0, &[0x0A, 0x1A]); // LD A,(BC); LD A,(DE)
    bus.load(0x4000, &[0x11, 0x22]);

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 7);
    assert_eq!(cpu.a, 0x11);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x22);
}

#[test]
fn test_ld_bc_de_indirect_a() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x33;
    cpu.set_bc(0x4000);
    cpu.set_de(0x4001);
    bus.load(0, &[0x02, 0x12]); // LD (BC),A; LD (DE),A

    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(&bus.memory[0x4000..0x4002], &[0x33, 0x33]);
}

#[test]
fn test_ld_nn_a_and_back() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x77;
    bus.load(0, &[0x32, 0x00, 0x50, 0x3E, 0x00, 0x3A, 0x00, 0x50]);
    // LD (0x5000),A; LD A,0; LD A,(0x5000)

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 13, "LD (nn),A should be 13 T-states");
    assert_eq!(bus.memory[0x5000], 0x77);

    step(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x00);

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 13);
    assert_eq!(cpu.a, 0x77);
}

// --- 16-bit loads ---

#[test]
fn test_ld_rr_nn() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x01, 0x34, 0x12, 0x31, 0xFF, 0xDF]);
    // LD BC,0x1234; LD SP,0xDFFF

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 10, "LD rr,nn should be 10 T-states");
    assert_eq!(cpu.get_bc(), 0x1234);

    step(&mut cpu, &mut bus);
    assert_eq!(cpu.sp, 0xDFFF);
}

#[test]
fn test_ld_nn_hl_little_endian() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0xBEEF);
    bus.load(0, &[0x22, 0x00, 0x50]); // LD (0x5000),HL

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 16, "LD (nn),HL should be 16 T-states");
    assert_eq!(bus.memory[0x5000], 0xEF, "low byte first");
    assert_eq!(bus.memory[0x5001], 0xBE);
}

#[test]
fn test_ld_hl_nn_indirect() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x2A, 0x00, 0x50]); // LD HL,(0x5000)
    bus.load(0x5000, &[0xCD, 0xAB]);

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 16);
    assert_eq!(cpu.get_hl(), 0xABCD);
}

#[test]
fn test_ld_nn_rr_ed() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_de(0x1234);
    bus.load(0, &[0xED, 0x53, 0x00, 0x50]); // LD (0x5000),DE

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 20, "ED LD (nn),rr should be 20 T-states");
    assert_eq!(bus.memory[0x5000], 0x34);
    assert_eq!(bus.memory[0x5001], 0x12);
}

#[test]
fn test_ld_rr_nn_ed() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xED, 0x7B, 0x00, 0x50]); // LD SP,(0x5000)
    bus.load(0x5000, &[0x00, 0xC0]);

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 20);
    assert_eq!(cpu.sp, 0xC000);
}

#[test]
fn test_ld_sp_hl() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x8000);
    bus.load(0, &[0xF9]); // LD SP,HL

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 6, "LD SP,HL should be 6 T-states");
    assert_eq!(cpu.sp, 0x8000);
}

// --- I and R ---

#[test]
fn test_ld_i_a_and_back() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x9C;
    cpu.iff2 = true;
    bus.load(0, &[0xED, 0x47, 0x3E, 0x00, 0xED, 0x57]);
    // LD I,A; LD A,0; LD A,I

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 9, "LD I,A should be 9 T-states");
    assert_eq!(cpu.i, 0x9C);

    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x9C);
    assert_ne!(cpu.f & 0x04, 0, "P/V reports IFF2");
    assert_ne!(cpu.f & 0x80, 0, "S from the loaded value");
}

#[test]
fn test_ld_a_r_counts_fetches() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.r = 0;
    cpu.iff2 = false;
    bus.load(0, &[0xED, 0x5F]); // LD A,R

    step(&mut cpu, &mut bus);
    // Both the ED and 5F fetches refresh R before the copy
    assert_eq!(cpu.a, 2);
    assert_eq!(cpu.f & 0x04, 0, "P/V reports IFF2 (clear)");
}

// --- Exchanges ---

#[test]
fn test_ex_af_af_is_involution() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x11;
    cpu.f = 0x22;
    cpu.a_prime = 0x33;
    cpu.f_prime = 0x44;
    bus.load(0, &[0x08, 0x08]); // EX AF,AF' twice

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 4);
    assert_eq!((cpu.a, cpu.f), (0x33, 0x44));
    assert_eq!((cpu.a_prime, cpu.f_prime), (0x11, 0x22));

    step(&mut cpu, &mut bus);
    assert_eq!((cpu.a, cpu.f), (0x11, 0x22), "EX AF,AF' is an involution");
}

#[test]
fn test_exx_is_involution() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x1111);
    cpu.set_de(0x2222);
    cpu.set_hl(0x3333);
    cpu.b_prime = 0x44;
    cpu.c_prime = 0x44;
    cpu.d_prime = 0x55;
    cpu.e_prime = 0x55;
    cpu.h_prime = 0x66;
    cpu.l_prime = 0x66;
    cpu.a = 0x99; // must not move
    bus.load(0, &[0xD9, 0xD9]); // EXX twice

    step(&mut cpu, &mut bus);
    assert_eq!(cpu.get_bc(), 0x4444);
    assert_eq!(cpu.get_de(), 0x5555);
    assert_eq!(cpu.get_hl(), 0x6666);
    assert_eq!(cpu.a, 0x99, "EXX leaves AF alone");

    step(&mut cpu, &mut bus);
    assert_eq!(cpu.get_bc(), 0x1111, "EXX is an involution");
    assert_eq!(cpu.get_de(), 0x2222);
    assert_eq!(cpu.get_hl(), 0x3333);
}

#[test]
fn test_ex_de_hl() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_de(0x1234);
    cpu.set_hl(0x5678);
    cpu.d_prime = 0xAA; // shadow untouched
    bus.load(0, &[0xEB]); // EX DE,HL

    step(&mut cpu, &mut bus);
    assert_eq!(cpu.get_de(), 0x5678);
    assert_eq!(cpu.get_hl(), 0x1234);
    assert_eq!(cpu.d_prime, 0xAA);
}

#[test]
fn test_ex_sp_hl() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x1234);
    cpu.sp = 0x8000;
    bus.load(0, &[0xE3]); // EX (SP),HL
    bus.load(0x8000, &[0x78, 0x56]);

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 19, "EX (SP),HL should be 19 T-states");
    assert_eq!(cpu.get_hl(), 0x5678);
    assert_eq!(bus.memory[0x8000], 0x34);
    assert_eq!(bus.memory[0x8001], 0x12);
    assert_eq!(cpu.sp, 0x8000, "SP itself is unchanged");
}

// --- Port I/O ---

#[test]
fn test_in_a_n() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x12;
    cpu.f = 0xFF;
    bus.io_space[0x42] = 0x99;
    bus.load(0, &[0xDB, 0x42]); // IN A,(0x42)

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 11, "IN A,(n) should be 11 T-states");
    assert_eq!(cpu.a, 0x99);
    assert_eq!(cpu.f, 0xFF, "IN A,(n) affects no flags");
}

#[test]
fn test_out_n_a_port_address() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x12;
    bus.load(0, &[0xD3, 0x42]); // OUT (0x42),A

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 11);
    // A supplies the upper address byte on the bus
    assert_eq!(bus.io_writes, vec![(0x1242, 0x12)]);
}

#[test]
fn test_in_r_c_flags() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0010);
    cpu.f = 0x01; // C preserved
    bus.io_space[0x10] = 0x80;
    bus.load(0, &[0xED, 0x50]); // IN D,(C)

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 12, "IN r,(C) should be 12 T-states");
    assert_eq!(cpu.d, 0x80);
    assert_ne!(cpu.f & 0x80, 0, "S from value");
    assert_eq!(cpu.f & 0x40, 0, "Z clear");
    assert_eq!(cpu.f & 0x04, 0, "parity of 0x80 is odd");
    assert_eq!(cpu.f & 0x12, 0, "H and N cleared");
    assert_ne!(cpu.f & 0x01, 0, "C preserved");
}

#[test]
fn test_in_c_flags_only() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0010);
    cpu.d = 0x55;
    bus.io_space[0x10] = 0x00;
    bus.load(0, &[0xED, 0x70]); // IN (C) — undocumented, flags only

    step(&mut cpu, &mut bus);
    assert_eq!(cpu.d, 0x55, "no register is written");
    assert_ne!(cpu.f & 0x40, 0, "Z from the discarded value");
}

#[test]
fn test_out_c_r() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0210);
    cpu.e = 0xAB;
    bus.load(0, &[0xED, 0x59]); // OUT (C),E

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 12);
    assert_eq!(bus.io_writes, vec![(0x0210, 0xAB)]);
}

#[test]
fn test_out_c_zero() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0010);
    bus.io_space[0x10] = 0xFF;
    bus.load(0, &[0xED, 0x71]); // OUT (C) — undocumented, drives 0

    step(&mut cpu, &mut bus);
    assert_eq!(bus.io_writes, vec![(0x0010, 0x00)]);
}
