use lumen_core::device::vdp::{CYCLES_PER_LINE, NUM_SCANLINES, SCREEN_WIDTH, Vdp, VideoError};

/// Program a VDP register through the control port.
fn write_register(vdp: &mut Vdp, reg: u8, value: u8) {
    vdp.control_write(value);
    vdp.control_write(0x80 | reg);
}

/// Mode 4, display on, both interrupt sources enabled.
fn enable_mode4(vdp: &mut Vdp) {
    write_register(vdp, 0, 0x16); // M4 + M2 + line IRQ enable
    write_register(vdp, 1, 0x60); // display enable + frame IRQ enable
}

/// Latch a VRAM address with the given code through the control port.
fn set_address(vdp: &mut Vdp, code: u8, addr: u16) {
    vdp.control_write(addr as u8);
    vdp.control_write((code << 6) | ((addr >> 8) as u8 & 0x3F));
}

fn run_lines(vdp: &mut Vdp, lines: u32) -> Result<(), VideoError> {
    vdp.run(CYCLES_PER_LINE * lines)
}

// --- Control / data port FIFO ---

#[test]
fn test_register_write_pairs() {
    let mut vdp = Vdp::new();
    vdp.control_write(0x80);
    vdp.control_write(0x82); // register 2 <- 0x80
    assert_eq!(vdp.register(2), 0x80);

    vdp.control_write(0x00);
    vdp.control_write(0x83); // register 3 <- 0x00
    assert_eq!(vdp.register(3), 0x00);
}

#[test]
fn test_mode_nibble_from_register_bits() {
    let mut vdp = Vdp::new();
    enable_mode4(&mut vdp);
    // M4 from reg 0 bit 2, M2 from reg 0 bit 1 -> nibble 1010, which is
    // the supported configuration
    assert!(run_lines(&mut vdp, 1).is_ok());

    write_register(&mut vdp, 1, 0x70); // adds M1 -> 1011, still mode 4
    assert!(run_lines(&mut vdp, 1).is_ok());
}

#[test]
fn test_unsupported_mode_faults() {
    let mut vdp = Vdp::new();
    // All registers zero: legacy TMS mode 0000
    let err = run_lines(&mut vdp, 1).unwrap_err();
    assert_eq!(err, VideoError::UnsupportedMode(0));
}

#[test]
fn test_vram_write_sequence() {
    let mut vdp = Vdp::new();
    set_address(&mut vdp, 1, 0x1000);
    for i in 0..8u8 {
        vdp.data_write(i);
    }
    assert_eq!(&vdp.vram()[0x1000..0x1008], &[0, 1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn test_vram_address_wraps_14_bits() {
    let mut vdp = Vdp::new();
    set_address(&mut vdp, 1, 0x3FFF);
    vdp.data_write(0xAA);
    vdp.data_write(0xBB); // wrapped to 0x0000
    assert_eq!(vdp.vram()[0x3FFF], 0xAA);
    assert_eq!(vdp.vram()[0x0000], 0xBB);
}

#[test]
fn test_vram_read_prefetch_buffer() {
    let mut vdp = Vdp::new();
    set_address(&mut vdp, 1, 0x2000);
    vdp.data_write(0x11);
    vdp.data_write(0x22);

    set_address(&mut vdp, 0, 0x2000); // read setup prefetches
    assert_eq!(vdp.data_read(), 0x11);
    assert_eq!(vdp.data_read(), 0x22);
}

#[test]
fn test_control_latch_cleared_by_data_access() {
    let mut vdp = Vdp::new();
    set_address(&mut vdp, 1, 0x0000);
    // First control byte latched, then a data access discards it
    vdp.control_write(0x34);
    vdp.data_write(0x55);
    // A fresh control pair must work from scratch
    vdp.control_write(0x42);
    vdp.control_write(0x84); // register 4 <- 0x42
    assert_eq!(vdp.register(4), 0x42);
}

#[test]
fn test_cram_write_masks_to_6_bits() {
    let mut vdp = Vdp::new();
    set_address(&mut vdp, 3, 0x0000);
    vdp.data_write(0xFF);
    vdp.data_write(0x2A);
    assert_eq!(vdp.cram()[0], 0x3F, "colour values are 6 bits");
    assert_eq!(vdp.cram()[1], 0x2A);
}

#[test]
fn test_cram_address_wraps_32_bytes() {
    let mut vdp = Vdp::new();
    set_address(&mut vdp, 3, 0x001F);
    vdp.data_write(0x15);
    vdp.data_write(0x2A); // address 0x20 masks to CRAM slot 0
    assert_eq!(vdp.cram()[0x1F], 0x15);
    assert_eq!(vdp.cram()[0x00], 0x2A);
}

// --- Raster timing and interrupts ---

#[test]
fn test_vcounter_advances_per_line() {
    let mut vdp = Vdp::new();
    enable_mode4(&mut vdp);
    assert_eq!(vdp.vcounter(), 0);
    run_lines(&mut vdp, 3).unwrap();
    assert_eq!(vdp.vcounter(), 3);
}

#[test]
fn test_partial_line_accumulates() {
    let mut vdp = Vdp::new();
    enable_mode4(&mut vdp);
    vdp.run(CYCLES_PER_LINE - 1).unwrap();
    assert_eq!(vdp.vcounter(), 0, "not yet a full line");
    vdp.run(1).unwrap();
    assert_eq!(vdp.vcounter(), 1);
}

#[test]
fn test_full_frame_returns_to_start() {
    let mut vdp = Vdp::new();
    enable_mode4(&mut vdp);
    run_lines(&mut vdp, NUM_SCANLINES as u32).unwrap();
    assert_eq!(vdp.vcounter(), 0, "262 lines close the frame");
}

#[test]
fn test_frame_interrupt_at_line_224() {
    let mut vdp = Vdp::new();
    enable_mode4(&mut vdp);
    run_lines(&mut vdp, 224).unwrap();
    assert!(!vdp.interrupt_pending(), "not yet: line 224 has not run");
    run_lines(&mut vdp, 1).unwrap();
    assert!(vdp.interrupt_pending(), "frame interrupt raised");
    assert!(vdp.take_frame(), "frame presented");
    assert!(!vdp.take_frame(), "presented only once");
}

#[test]
fn test_frame_interrupt_masked_by_enable_bit() {
    let mut vdp = Vdp::new();
    write_register(&mut vdp, 0, 0x06); // M4 + M2, no line IRQ
    write_register(&mut vdp, 1, 0x40); // display on, frame IRQ disabled
    run_lines(&mut vdp, 225).unwrap();
    assert!(!vdp.interrupt_pending(), "flag set but line masked");

    write_register(&mut vdp, 1, 0x60);
    assert!(vdp.interrupt_pending(), "unmasking exposes the pending flag");
}

#[test]
fn test_status_read_reports_and_clears() {
    let mut vdp = Vdp::new();
    enable_mode4(&mut vdp);
    run_lines(&mut vdp, 225).unwrap();

    let status = vdp.status_read();
    assert_eq!(status & 0x80, 0x80, "frame flag in bit 7");
    assert_eq!(status & 0x1F, 0x1F, "low bits stuck high");
    assert!(!vdp.interrupt_pending(), "status read acknowledges");

    let status = vdp.status_read();
    assert_eq!(status & 0x80, 0, "flag cleared by the first read");
}

#[test]
fn test_line_interrupt_counter_underflow() {
    let mut vdp = Vdp::new();
    enable_mode4(&mut vdp);
    write_register(&mut vdp, 0xA, 0x00); // reload value 0

    // One full frame leaves the counter reloaded to 0; the first active
    // line of the next frame underflows it.
    run_lines(&mut vdp, NUM_SCANLINES as u32).unwrap();
    vdp.status_read(); // shed the frame flag
    assert!(!vdp.interrupt_pending());

    run_lines(&mut vdp, 1).unwrap();
    assert!(vdp.interrupt_pending(), "line counter underflow");
}

#[test]
fn test_vcounter_port_folds_ntsc() {
    let mut vdp = Vdp::new();
    enable_mode4(&mut vdp);
    run_lines(&mut vdp, 0xDA).unwrap();
    assert_eq!(vdp.vcounter_read(), 0xDA);
    run_lines(&mut vdp, 1).unwrap();
    assert_eq!(vdp.vcounter_read(), 0xD5, "counter jumps back after 0xDA");
}

// --- Renderer ---

/// Minimal scene: tile 1 in the top-left nametable cell, with a solid
/// colour 1 row written in pattern memory.
fn write_test_tile(vdp: &mut Vdp, entry: u16) {
    // Pattern 1, row 0: plane 0 = 0xFF -> every pixel colour index 1
    set_address(vdp, 1, 32);
    vdp.data_write(0xFF);
    vdp.data_write(0x00);
    vdp.data_write(0x00);
    vdp.data_write(0x00);
    // Nametable entry 0 at 0x3800
    set_address(vdp, 1, 0x3800);
    vdp.data_write(entry as u8);
    vdp.data_write((entry >> 8) as u8);
    // Palettes: background colour 1 = 0x03, sprite-palette colour 1 = 0x30
    set_address(vdp, 3, 0x0001);
    vdp.data_write(0x03);
    set_address(vdp, 3, 0x0011);
    vdp.data_write(0x30);
}

#[test]
fn test_render_background_tile() {
    let mut vdp = Vdp::new();
    enable_mode4(&mut vdp);
    write_test_tile(&mut vdp, 0x0001); // pattern 1, no flips

    run_lines(&mut vdp, 1).unwrap();
    assert_eq!(vdp.screen()[0], 0x03, "colour 1 resolved through CRAM");
    assert_eq!(vdp.screen()[7], 0x03);
    assert_eq!(vdp.screen()[8], 0x00, "second column empty");
}

#[test]
fn test_render_palette_select() {
    let mut vdp = Vdp::new();
    enable_mode4(&mut vdp);
    write_test_tile(&mut vdp, 0x0801); // palette bit set

    run_lines(&mut vdp, 1).unwrap();
    assert_eq!(vdp.screen()[0], 0x30, "sprite palette selected");
}

#[test]
fn test_render_vflip() {
    let mut vdp = Vdp::new();
    enable_mode4(&mut vdp);
    write_test_tile(&mut vdp, 0x0401); // vflip: row 0 shows pattern row 7

    run_lines(&mut vdp, 1).unwrap();
    assert_eq!(vdp.screen()[0], 0x00, "row 7 of the pattern is empty");

    // Render down to line 7, which now shows pattern row 0
    run_lines(&mut vdp, 7).unwrap();
    assert_eq!(vdp.screen()[7 * SCREEN_WIDTH], 0x03);
}

#[test]
fn test_render_hflip() {
    let mut vdp = Vdp::new();
    enable_mode4(&mut vdp);
    // Pattern 1 row 0, plane 0 = 0x80: only the leftmost pixel set
    set_address(&mut vdp, 1, 32);
    vdp.data_write(0x80);
    vdp.data_write(0x00);
    vdp.data_write(0x00);
    vdp.data_write(0x00);
    set_address(&mut vdp, 1, 0x3800);
    vdp.data_write(0x01);
    vdp.data_write(0x02); // hflip bit (bit 9)
    set_address(&mut vdp, 3, 0x0001);
    vdp.data_write(0x2A);

    run_lines(&mut vdp, 1).unwrap();
    assert_eq!(vdp.screen()[0], 0x00, "flipped: left pixel now empty");
    assert_eq!(vdp.screen()[7], 0x2A, "set pixel moved to the right edge");
}

#[test]
fn test_render_blanked_display_uses_backdrop() {
    let mut vdp = Vdp::new();
    write_register(&mut vdp, 0, 0x06);
    write_register(&mut vdp, 1, 0x20); // frame IRQ on, display OFF
    write_register(&mut vdp, 7, 0x01); // backdrop colour index 1
    set_address(&mut vdp, 3, 0x0011);
    vdp.data_write(0x15); // sprite-palette entry 1

    run_lines(&mut vdp, 1).unwrap();
    assert_eq!(vdp.screen()[0], 0x15);
    assert_eq!(vdp.screen()[255], 0x15);
}
