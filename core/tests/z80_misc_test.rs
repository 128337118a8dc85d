use lumen_core::cpu::z80::Z80;
mod common;
use common::{TestBus, step};

#[test]
fn test_nop_timing() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x00]);

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 4);
    assert_eq!(cpu.pc, 1);
}

#[test]
fn test_reset_defaults() {
    let mut cpu = Z80::new();
    cpu.pc = 0x1234;
    cpu.a = 0x00;
    cpu.f = 0x00;
    cpu.sp = 0x1000;
    cpu.iff1 = true;
    cpu.halted = true;
    cpu.reset();

    assert_eq!(cpu.a, 0xFF);
    assert_eq!(cpu.f, 0xFF);
    assert_eq!(cpu.sp, 0xFFFF);
    assert_eq!(cpu.pc, 0x0000);
    assert_eq!(cpu.i, 0);
    assert_eq!(cpu.r, 0);
    assert_eq!(cpu.im, 0);
    assert!(!cpu.iff1);
    assert!(!cpu.halted);
}

#[test]
fn test_r_increments_per_fetch() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.r = 0;
    bus.load(0, &[0x00, 0x00, 0x00]);

    for expected in 1..=3u8 {
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.r, expected);
    }
}

#[test]
fn test_r_preserves_bit7() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.r = 0xFF;
    bus.load(0, &[0x00, 0x00]);

    step(&mut cpu, &mut bus);
    assert_eq!(cpu.r, 0x80, "bit 7 kept, low 7 bits wrap");

    step(&mut cpu, &mut bus);
    assert_eq!(cpu.r, 0x81);
}

#[test]
fn test_r_counts_prefix_fetches() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.r = 0;
    bus.load(0, &[0xCB, 0x00]); // RLC B — two M1 fetches

    step(&mut cpu, &mut bus);
    assert_eq!(cpu.r, 2);
}

#[test]
fn test_pc_wraps_at_top_of_memory() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.pc = 0xFFFF;
    bus.memory[0xFFFF] = 0x00; // NOP

    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0000, "PC wraps modulo 2^16");
}

#[test]
fn test_ed_undefined_is_nop() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    let before = cpu.snapshot();
    bus.load(0, &[0xED, 0x00]);

    let cycles = step(&mut cpu, &mut bus);
    assert_eq!(cycles, 8, "undefined ED rows cost two fetches");
    let after = cpu.snapshot();
    assert_eq!(after.pc, 2);
    assert_eq!(after.a, before.a);
    assert_eq!(after.f, before.f, "no flag effect");
}

#[test]
fn test_snapshot_tracks_registers() {
    let mut cpu = Z80::new();
    cpu.set_bc(0x1234);
    cpu.ix = 0xABCD;
    cpu.im = 1;
    cpu.iff2 = true;

    let state = cpu.snapshot();
    assert_eq!(state.b, 0x12);
    assert_eq!(state.c, 0x34);
    assert_eq!(state.ix, 0xABCD);
    assert_eq!(state.im, 1);
    assert!(state.iff2);
}

#[test]
fn test_pair_helpers_preserve_other_half() {
    let mut cpu = Z80::new();
    cpu.set_hl(0x1234);
    cpu.h = 0x56;
    assert_eq!(cpu.get_hl(), 0x5634, "writing H keeps L");
    cpu.l = 0x78;
    assert_eq!(cpu.get_hl(), 0x5678, "writing L keeps H");

    for &word in &[0x0000u16, 0x00FF, 0xFF00, 0xA55A, 0xFFFF] {
        cpu.set_af(word);
        assert_eq!(cpu.get_af(), word, "AF round-trips through the halves");
    }
}
