//! Whole-machine behaviour with small synthetic KERNAL images.

use emu_core::{Observable, Value};
use emu_vic20::{
    Joy, MAX_BOOT_FRAMES, RamExpansion, Roms, Vic20, Vic20Config, Vic20Error, VicKey,
};
use format_prg::PrgError;
use mos_6502::flags;

/// NMI handler: INC $10; RTI.
const NMI_HANDLER: u16 = 0xE100;
/// IRQ handler: RTI.
const IRQ_HANDLER: u16 = 0xE200;

/// Reset code that does the minimum a real KERNAL does before READY:
/// BASIC starts at $1001, the keyboard buffer holds 10 characters, the
/// cursor sits on row 5 and VIA1 CA1 (RESTORE) may interrupt. Then it spins.
const BOOT: [u8; 25] = [
    0xA9, 0x01, 0x85, 0x2B, // LDA #$01; STA $2B
    0xA9, 0x10, 0x85, 0x2C, // LDA #$10; STA $2C
    0xA9, 0x0A, 0x8D, 0x89, 0x02, // LDA #$0A; STA $0289
    0xA9, 0x05, 0x85, 0xC9, // LDA #$05; STA $C9
    0xA9, 0x82, 0x8D, 0x1E, 0x91, // LDA #$82; STA $911E
    0x4C, 0x16, 0xE0, // JMP $E016
];

fn kernal(code: &[u8]) -> Vec<u8> {
    let mut rom = vec![0xEA; 0x2000];
    rom[..code.len()].copy_from_slice(code);
    let nmi = usize::from(NMI_HANDLER - 0xE000);
    rom[nmi..nmi + 3].copy_from_slice(&[0xE6, 0x10, 0x40]);
    rom[usize::from(IRQ_HANDLER - 0xE000)] = 0x40;
    rom[0x1FFA..].copy_from_slice(&[
        NMI_HANDLER as u8,
        (NMI_HANDLER >> 8) as u8,
        0x00,
        0xE0,
        IRQ_HANDLER as u8,
        (IRQ_HANDLER >> 8) as u8,
    ]);
    rom
}

fn roms(code: &[u8]) -> Roms {
    Roms {
        kernal: kernal(code),
        basic: vec![0; 0x2000],
        character: vec![0; 0x1000],
    }
}

fn machine(expansion: RamExpansion) -> Vic20 {
    let config = Vic20Config {
        ram_expansion: expansion,
        ..Vic20Config::default()
    };
    Vic20::new(&config, roms(&BOOT)).expect("machine")
}

#[test]
fn rom_sizes_are_checked() {
    let mut bad = roms(&BOOT);
    bad.basic.pop();
    assert!(matches!(
        Vic20::new(&Vic20Config::default(), bad),
        Err(Vic20Error::RomSize {
            expected: 8192,
            actual: 8191,
            ..
        })
    ));
}

#[test]
fn reset_starts_at_kernal_vector() {
    let vic = machine(RamExpansion::Unexpanded);
    assert_eq!(vic.query("cpu.pc"), Some(Value::U16(0xE000)));
    assert_eq!(vic.frame_count(), 0);
}

#[test]
fn run_frame_covers_a_pal_frame() {
    let mut vic = machine(RamExpansion::Unexpanded);
    let before = vic.cycle();
    let cycles = vic.run_frame();
    assert!((22_152..22_152 + 8).contains(&cycles));
    assert_eq!(vic.cycle(), before.wrapping_add(cycles));
    assert_eq!(vic.frame_count(), 1);
    assert_eq!(vic.query("frame_count"), Some(Value::U64(1)));
}

#[test]
fn prg_loads_after_boot_and_types_run() {
    let mut vic = machine(RamExpansion::Unexpanded);
    let addr = vic
        .load_prg(&[0x01, 0x10, 0xAA, 0xBB, 0xCC], true, true)
        .expect("load");
    assert_eq!(addr, 0x1001);
    assert_eq!(vic.peek(0x1001), 0xAA);
    assert_eq!(vic.peek(0x1003), 0xCC);
    // End of program: $1001 + 3.
    assert_eq!(vic.peek(0x2D), 0x04);
    assert_eq!(vic.peek(0x2E), 0x10);
    assert_eq!(vic.pending_typing(), 4);

    vic.run_frame();
    assert_eq!(vic.pending_typing(), 0);
    assert_eq!(vic.peek(0xC6), 4);
    let typed: Vec<u8> = (0x0277..0x027B).map(|a| vic.peek(a)).collect();
    assert_eq!(typed, b"RUN\r");
}

#[test]
fn prg_without_reset_loads_in_place() {
    let mut vic = machine(RamExpansion::K8);
    let addr = vic
        .load_prg(&[0x00, 0x30, 1, 2, 3, 4], false, false)
        .expect("load");
    assert_eq!(addr, 0x3000);
    assert_eq!(vic.peek(0x3003), 4);
    assert_eq!(vic.pending_typing(), 0);
}

#[test]
fn boot_gives_up_when_ready_never_appears() {
    let config = Vic20Config::default();
    // JMP $E000 forever; the cursor row is never set.
    let mut vic = Vic20::new(&config, roms(&[0x4C, 0x00, 0xE0])).expect("machine");
    assert!(matches!(
        vic.load_prg(&[0x01, 0x10, 0x00], true, false),
        Err(Vic20Error::BootTimeout(MAX_BOOT_FRAMES))
    ));
}

#[test]
fn short_prg_is_rejected() {
    let mut vic = machine(RamExpansion::Unexpanded);
    assert!(matches!(
        vic.load_prg(&[0x01, 0x10], false, false),
        Err(Vic20Error::Prg(PrgError::TooShort(2)))
    ));
}

#[test]
fn expansion_presets_map_ram() {
    let mut vic = machine(RamExpansion::Unexpanded);
    vic.bus_write(0x2000, 0x42);
    assert_eq!(vic.bus_read(0x2000), 0x20);
    assert_eq!(vic.bus_read(0x0400), 0x04);

    vic.set_ram_expansion(RamExpansion::K3).expect("expand");
    assert_eq!(vic.expansion_blocks(), [true, false, false, false, false]);
    vic.bus_write(0x0400, 0x42);
    assert_eq!(vic.bus_read(0x0400), 0x42);

    vic.enable_expansion_ram(4, true).expect("block 4");
    vic.bus_write(0xA123, 0x99);
    assert_eq!(vic.peek(0xA123), 0x99);
    assert!(vic.enable_expansion_ram(5, true).is_err());
}

#[test]
fn colour_ram_is_four_bits_wide() {
    let mut vic = machine(RamExpansion::Unexpanded);
    vic.bus_write(0x9400, 0xF3);
    assert_eq!(vic.bus_read(0x9400), 0x03);
    assert_eq!(vic.query("memory.0x9400"), Some(Value::U8(0x03)));
}

#[test]
fn cartridge_shadows_expansion_ram() {
    let mut vic = machine(RamExpansion::K35);
    vic.bus_write(0xA000, 0x11);

    let mut image = vec![0x00, 0xA0];
    image.extend((0..0x1000).map(|i| (i & 0xFF) as u8));
    assert_eq!(vic.load_cartridge(&image, None).expect("cart"), 0xA000);
    assert_eq!(vic.peek(0xA005), 0x05);
    // 4K image fills the 8K window twice.
    assert_eq!(vic.peek(0xB005), 0x05);

    vic.remove_cartridges();
    assert_eq!(vic.peek(0xA000), 0x11);
}

#[test]
fn typed_text_waits_for_buffer_space() {
    let mut vic = machine(RamExpansion::Unexpanded);
    vic.run_frame();
    vic.bus_write(0x0289, 2);

    vic.type_string("ABCDE");
    vic.run_frame();
    assert_eq!(vic.peek(0xC6), 2);
    assert_eq!(vic.pending_typing(), 3);
    assert_eq!(vic.query("typing"), Some(Value::U64(3)));

    // The KERNAL empties the buffer.
    vic.bus_write(0xC6, 0);
    vic.run_frame();
    assert_eq!(vic.pending_typing(), 1);
    assert_eq!(vic.peek(0x0277), b'C');
    assert_eq!(vic.peek(0x0278), b'D');
}

#[test]
fn restore_raises_one_nmi() {
    let mut vic = machine(RamExpansion::Unexpanded);
    vic.run_frame();
    assert_eq!(vic.peek(0x10), 0);

    vic.set_restore(true);
    vic.run_frame();
    vic.run_frame();
    // The handler never acknowledges CA1, so the line stays asserted.
    assert_eq!(vic.peek(0x10), 1);
    assert_eq!(vic.query("nmi"), Some(Value::Bool(true)));
}

#[test]
fn nmi_during_irq_entry_keeps_both_vias_in_step() {
    let mut vic = machine(RamExpansion::Unexpanded);
    vic.run_frame();
    vic.cpu_mut().regs.p.set_if(flags::I, false);

    // VIA2 T1 expires on the next JMP (3 cycles) and raises IRQ; VIA1 T1
    // expires inside the 7 cycles of IRQ entry and raises NMI.
    vic.bus_write(0x912E, 0xC0);
    vic.bus_write(0x911E, 0xC0);
    vic.bus_write(0x9124, 2);
    vic.bus_write(0x9114, 6);
    vic.bus_write(0x9125, 0);
    vic.bus_write(0x9115, 0);

    vic.run_frame();
    assert_eq!(vic.peek(0x10), 1);

    // Both timers count the same cycles, so they keep their start offset.
    let via1 = vic.bus().via1.timer1_counter();
    let via2 = vic.bus().via2.timer1_counter();
    assert_eq!(via1.wrapping_sub(via2), 6 - 2);
}

#[test]
fn nmi_raised_during_entry_waits_for_the_line_to_drop() {
    let mut vic = machine(RamExpansion::Unexpanded);
    vic.run_frame();

    // RESTORE raises NMI on the next step; VIA1 T1 then expires during
    // NMI entry while the line is still asserted.
    vic.bus_write(0x911E, 0xC0);
    vic.bus_write(0x9114, 6);
    vic.bus_write(0x9115, 0);
    vic.set_restore(true);
    vic.run_frame();
    assert_eq!(vic.peek(0x10), 1);
    assert_eq!(vic.bus().via1.ifr() & 0x42, 0x42);

    // T1 still holds the line after CA1 is acknowledged.
    vic.bus_write(0x911D, 0x02);
    vic.run_frame();
    assert_eq!(vic.peek(0x10), 1);
    assert_eq!(vic.query("nmi"), Some(Value::Bool(true)));

    vic.bus_write(0x911D, 0x40);
    vic.run_frame();
    assert_eq!(vic.query("nmi"), Some(Value::Bool(false)));
    assert_eq!(vic.peek(0x10), 1);

    // A fresh assertion is a new edge.
    vic.bus_write(0x9115, 0);
    vic.run_frame();
    assert_eq!(vic.peek(0x10), 2);
}

#[test]
fn keyboard_scan_sees_pressed_key() {
    let mut vic = machine(RamExpansion::Unexpanded);
    vic.press_key(VicKey::A);
    // PB drives columns, PA reads rows.
    vic.bus_write(0x9122, 0xFF);
    vic.bus_write(0x9123, 0x00);
    vic.bus_write(0x9120, !0x04);
    assert_eq!(vic.bus_read(0x9121), !0x02);

    vic.release_key(VicKey::A);
    vic.bus_write(0x9120, !0x04);
    assert_eq!(vic.bus_read(0x9121), 0xFF);
}

#[test]
fn joystick_reads_on_both_vias() {
    let mut vic = machine(RamExpansion::Unexpanded);
    vic.set_joystick(Joy::Fire, true);
    vic.set_joystick(Joy::Right, true);
    assert_eq!(vic.bus_read(0x9111) & 0x20, 0);
    assert_eq!(vic.bus_read(0x9120) & 0x80, 0);

    vic.set_joystick(Joy::Fire, false);
    assert_ne!(vic.bus_read(0x9111) & 0x20, 0);
}

#[test]
fn atn_reaches_the_drive() {
    let mut vic = machine(RamExpansion::Unexpanded);
    assert_eq!(vic.query("drive.atn"), Some(Value::Bool(false)));
    vic.bus_write(0x9113, 0x80);
    vic.bus_write(0x9111, 0x80);
    assert_eq!(vic.query("drive.atn"), Some(Value::Bool(true)));
    assert_eq!(vic.query("drive.active"), Some(Value::Bool(true)));
}

#[test]
fn observable_paths() {
    let vic = machine(RamExpansion::Unexpanded);
    assert_eq!(vic.query("memory.$E000"), Some(Value::U8(0xA9)));
    assert!(vic.query("via2.ifr").is_some());
    assert!(vic.query("vic.raster_y").is_some());
    assert_eq!(vic.query("memory.nowhere"), None);
    assert_eq!(vic.query("bogus"), None);
    assert!(vic.query_paths().contains(&"cycle"));
}

#[test]
fn config_json_builds_machine() {
    let config = Vic20Config::from_json(r#"{ "ram_expansion": "k8" }"#).expect("config");
    let vic = Vic20::new(&config, roms(&BOOT)).expect("machine");
    assert_eq!(vic.expansion_blocks(), [false, true, false, false, false]);
}
