//! Top-level VIC-20 system.
//!
//! The machine is instruction-stepped: the CPU runs one instruction and
//! every other chip is advanced by the cycles it took. One PAL frame is
//! 312 lines x 71 cycles = 22,152 CPU cycles.
//!
//! # Step loop
//!
//! Each step:
//! 1. CPU: execute one instruction
//! 2. VIA1: tick; a rising interrupt output is an NMI edge (RESTORE, RS-232)
//! 3. VIA2: tick; an active interrupt output is an IRQ (jiffy clock, keyboard)
//! 4. VIC: advance the beam and render
//! 5. Serial drive: tick while addressed, then copy its CLK/DATA to VIA1

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use drive_iec::{IecDrive, StorageProvider};
use emu_core::{Bus, Cpu, Observable, Value, parse_address};
use format_prg::Prg;
use mos_6502::Mos6502;
use mos_vic_6561::CYCLES_PER_FRAME;

use crate::bus::Vic20Bus;
use crate::cartridge::Cartridge;
use crate::config::{RamExpansion, Roms, Vic20Config};
use crate::error::{Result, Vic20Error};
use crate::input::{Joy, VicKey};
use crate::memory::{EXPANSION_BLOCKS, Vic20Memory};
use crate::prg;

/// Frames allowed for the KERNAL to reach READY before a PRG is loaded.
pub const MAX_BOOT_FRAMES: u32 = 500;

/// KERNAL keyboard buffer and its fill count and capacity.
const KEYBOARD_BUFFER: u16 = 0x0277;
const KEYBOARD_COUNT: u16 = 0x00C6;
const KEYBOARD_CAPACITY: u16 = 0x0289;
/// Cursor row; the KERNAL leaves it at 5 once READY is on screen.
const CURSOR_ROW: u16 = 0x00C9;
const READY_ROW: u8 = 5;

/// Wall-clock time of one CPU cycle used for pacing.
const NS_PER_CYCLE: u64 = 900;
/// Longer computed delays mean the host stalled; don't try to catch up.
const MAX_SYNC_DELAY: Duration = Duration::from_secs(30);

/// VIC-20 system.
pub struct Vic20 {
    cpu: Mos6502,
    bus: Vic20Bus,
    /// Last seen VIA1 interrupt output, for NMI edge detection.
    nmi_line: bool,
    /// CPU cycle counter. Wraps.
    cycle: u32,
    /// Completed frame counter.
    frame_count: u64,
    /// Characters waiting to go into the KERNAL keyboard buffer.
    typing: VecDeque<u8>,
    real_time: bool,
    /// Wall time and cycle counter at the last pacing point.
    last_sync: Option<(Instant, u32)>,
}

impl Vic20 {
    /// Build a machine from `config` and ROM images, then reset it.
    pub fn new(config: &Vic20Config, roms: Roms) -> Result<Self> {
        let memory = Vic20Memory::new(roms)?;
        let mut drive = IecDrive::new(config.drive_device);
        drive.set_long_directory(config.long_directory);

        let mut vic20 = Self {
            cpu: Mos6502::new(),
            bus: Vic20Bus::new(memory, drive),
            nmi_line: false,
            cycle: 0,
            frame_count: 0,
            typing: VecDeque::new(),
            real_time: config.real_time,
            last_sync: None,
        };
        vic20.set_ram_expansion(config.ram_expansion)?;
        vic20.reset();
        Ok(vic20)
    }

    /// Reset every chip and start the CPU at the KERNAL reset vector.
    /// Memory, expansion RAM, cartridges and attached storage are kept.
    pub fn reset(&mut self) {
        log::debug!("vic20: reset");
        self.nmi_line = false;
        self.typing.clear();
        self.last_sync = None;

        self.bus.via1.reset();
        self.bus.via2.reset();
        self.bus.vic.reset();
        self.bus.joystick = [false; 5];
        self.bus.keyboard.release_all();
        self.bus.drive.reset();

        // RESTORE is pulled up when not pressed.
        self.bus.via1.set_ca1(true);
        self.bus.sync_serial_inputs();

        self.cycle = self.cpu.reset(&mut self.bus);
    }

    /// Run one frame's worth of CPU cycles.
    ///
    /// Queued typed characters are fed to the keyboard buffer afterwards,
    /// and with real-time pacing on the call sleeps to match PAL speed.
    ///
    /// Returns the number of CPU cycles executed.
    pub fn run_frame(&mut self) -> u32 {
        let mut run_cycles = 0;
        while run_cycles < CYCLES_PER_FRAME {
            let mut cycles = self.cpu.step(&mut self.bus);

            let nmi = self.bus.via1.tick(cycles);
            cycles += self.nmi_edge(nmi);

            if self.bus.via2.tick(cycles) {
                let extra = self.cpu.irq(&mut self.bus);
                // VIA1 can raise NMI while the IRQ is being serviced.
                let nmi = self.bus.via1.tick(extra);
                let nmi_cycles = self.nmi_edge(nmi);
                // VIA2's own output is already asserted; only its timers move.
                let _ = self.bus.via2.tick(extra + nmi_cycles);
                cycles += extra + nmi_cycles;
            }

            self.bus.tick_vic(cycles);

            if self.bus.drive.is_active() {
                self.bus.drive.tick(cycles);
            }
            self.bus.sync_serial_inputs();

            run_cycles += cycles;
        }

        self.cycle = self.cycle.wrapping_add(run_cycles);
        self.frame_count += 1;
        self.inject_typed_chars();
        if self.real_time {
            self.sync_time();
        }
        run_cycles
    }

    /// Track VIA1's interrupt output. On a new assertion the CPU takes an
    /// NMI; returns the cycles it took.
    fn nmi_edge(&mut self, asserted: bool) -> u32 {
        if asserted == self.nmi_line {
            return 0;
        }
        self.nmi_line = asserted;
        if !asserted {
            return 0;
        }
        let extra = self.cpu.nmi(&mut self.bus);
        // The line is already asserted; another edge needs it to drop first.
        let _ = self.bus.via1.tick(extra);
        extra
    }

    fn inject_typed_chars(&mut self) {
        while let Some(&ch) = self.typing.front() {
            let count = self.bus.read(KEYBOARD_COUNT);
            if count >= self.bus.read(KEYBOARD_CAPACITY) {
                break;
            }
            self.bus.write(KEYBOARD_BUFFER + u16::from(count), ch);
            self.bus.write(KEYBOARD_COUNT, count + 1);
            self.typing.pop_front();
        }
    }

    fn sync_time(&mut self) {
        let now = Instant::now();
        if let Some((then, cycle)) = self.last_sync {
            let emulated =
                Duration::from_nanos(u64::from(self.cycle.wrapping_sub(cycle)) * NS_PER_CYCLE);
            if let Some(delay) = emulated.checked_sub(now.duration_since(then))
                && !delay.is_zero()
                && delay < MAX_SYNC_DELAY
            {
                std::thread::sleep(delay);
            }
        }
        self.last_sync = Some((Instant::now(), self.cycle));
    }

    /// Queue PETSCII text to be typed into the KERNAL keyboard buffer.
    ///
    /// Characters are moved into the buffer after each frame, as many as
    /// fit; the rest wait for the KERNAL to drain it.
    pub fn type_string(&mut self, text: &str) {
        self.typing.extend(text.bytes());
    }

    /// Characters still waiting to be typed.
    #[must_use]
    pub fn pending_typing(&self) -> usize {
        self.typing.len()
    }

    // --- Memory and media ---

    /// CPU-visible read, with I/O side effects.
    pub fn bus_read(&mut self, addr: u16) -> u8 {
        self.bus.read(addr)
    }

    pub fn bus_write(&mut self, addr: u16, value: u8) {
        self.bus.write(addr, value);
    }

    /// Read without side effects.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// Fit or remove RAM expansion block 0-4.
    pub fn enable_expansion_ram(&mut self, block: usize, enabled: bool) -> Result<()> {
        self.bus.memory.enable_block(block, enabled)
    }

    /// Apply a RAM expansion preset.
    pub fn set_ram_expansion(&mut self, expansion: RamExpansion) -> Result<()> {
        log::debug!("vic20: RAM expansion {expansion:?}");
        for (block, enabled) in expansion.blocks().into_iter().enumerate() {
            self.enable_expansion_ram(block, enabled)?;
        }
        Ok(())
    }

    /// Enabled state of each expansion block.
    #[must_use]
    pub fn expansion_blocks(&self) -> [bool; EXPANSION_BLOCKS] {
        std::array::from_fn(|block| self.bus.memory.block_enabled(block))
    }

    /// Plug in a cartridge image. `address` selects the window when the
    /// image has no load address of its own; see [`Cartridge::parse`].
    ///
    /// Returns the address the image was loaded for. The machine is not
    /// reset.
    pub fn load_cartridge(&mut self, data: &[u8], address: Option<u16>) -> Result<u16> {
        let cart = Cartridge::parse(data, address)?;
        log::debug!(
            "vic20: cartridge at ${:04X} ({} bytes)",
            cart.address,
            data.len()
        );
        self.bus.memory.insert_cartridge(cart.slot, cart.image);
        Ok(cart.address)
    }

    pub fn remove_cartridges(&mut self) {
        log::debug!("vic20: cartridges removed");
        self.bus.memory.remove_cartridges();
    }

    /// Load a PRG and point BASIC's end-of-program past it.
    ///
    /// With `reset_required` the machine is reset first and run until the
    /// KERNAL has printed READY. With `exec_run`, `RUN` is typed afterwards.
    ///
    /// Returns the load address.
    pub fn load_prg(&mut self, data: &[u8], reset_required: bool, exec_run: bool) -> Result<u16> {
        let prg = Prg::parse(data)?;

        if reset_required {
            self.reset();
            self.bus.write(CURSOR_ROW, 0);
            let mut frames = 0;
            while self.bus.read(CURSOR_ROW) != READY_ROW {
                if frames == MAX_BOOT_FRAMES {
                    return Err(Vic20Error::BootTimeout(MAX_BOOT_FRAMES));
                }
                self.run_frame();
                frames += 1;
            }
        }

        prg.load(&mut self.bus);
        let end = prg::set_basic_end(&mut self.bus, prg.payload.len());
        log::debug!(
            "vic20: PRG ${:04X}-${:04X}, BASIC end ${end:04X}",
            prg.load_address,
            prg.end_address()
        );

        if exec_run {
            self.type_string("RUN\r");
        }
        Ok(prg.load_address)
    }

    /// Attach the storage the serial drive serves files from.
    pub fn attach_storage(&mut self, storage: Box<dyn StorageProvider>) {
        self.bus.drive.set_storage(storage);
    }

    // --- Input ---

    /// Press or release the key at a raw matrix position.
    pub fn set_key_matrix(&mut self, row: u8, col: u8, down: bool) {
        self.bus.keyboard.set_key(row, col, down);
    }

    pub fn press_key(&mut self, key: VicKey) {
        let (row, col) = key.matrix();
        self.bus.keyboard.set_key(row, col, true);
    }

    pub fn release_key(&mut self, key: VicKey) {
        let (row, col) = key.matrix();
        self.bus.keyboard.set_key(row, col, false);
    }

    pub fn release_all_keys(&mut self) {
        self.bus.keyboard.release_all();
    }

    pub fn set_joystick(&mut self, joy: Joy, pressed: bool) {
        self.bus.joystick[joy.index()] = pressed;
    }

    /// RESTORE pulls VIA1 CA1 low; the KERNAL answers with an NMI.
    pub fn set_restore(&mut self, down: bool) {
        self.bus.via1.set_ca1(!down);
    }

    // --- Output and state ---

    /// Reference to the framebuffer (ARGB32).
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        self.bus.vic.framebuffer()
    }

    /// One framebuffer row.
    #[must_use]
    pub fn scanline(&self, y: usize) -> &[u32] {
        self.bus.vic.scanline(y)
    }

    #[must_use]
    pub fn cpu(&self) -> &Mos6502 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Mos6502 {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &Vic20Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Vic20Bus {
        &mut self.bus
    }

    /// CPU cycles since reset, wrapping at 2^32.
    #[must_use]
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Observable for Vic20 {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("via1.") {
            self.bus.via1.query(rest)
        } else if let Some(rest) = path.strip_prefix("via2.") {
            self.bus.via2.query(rest)
        } else if let Some(rest) = path.strip_prefix("vic.") {
            self.bus.vic.query(rest)
        } else if let Some(rest) = path.strip_prefix("drive.") {
            self.bus.drive.query(rest)
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_address(rest).map(|a| Value::U8(self.bus.peek(a)))
        } else {
            match path {
                "cycle" => Some(self.cycle.into()),
                "frame_count" => Some(self.frame_count.into()),
                "nmi" => Some(self.nmi_line.into()),
                "typing" => Some(Value::U64(self.typing.len() as u64)),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<6502_paths>",
            "via1.<via_paths>",
            "via2.<via_paths>",
            "vic.<vic_paths>",
            "drive.<iec_paths>",
            "memory.<address>",
            "cycle",
            "frame_count",
            "nmi",
            "typing",
        ]
    }
}
