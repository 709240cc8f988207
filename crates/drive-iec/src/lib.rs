//! High-level IEC serial disk drive.
//!
//! Emulates what a disk drive looks like from the computer's side of the
//! serial bus without running any drive firmware. Files come from a host
//! directory through [`StorageProvider`].
//!
//! Two layers:
//!
//! - The link layer ([`LinkState`]) follows the CLK/DATA handshake one
//!   state at a time, assembling received bytes and clocking out sent ones.
//! - The arbitration layer ([`ArbState`]) interprets those bytes: LISTEN,
//!   TALK, secondary addresses, OPEN/CLOSE and file data.
//!
//! Line polarity: every input and output is `true` when the line is pulled
//! low (asserted). The owning machine maps these onto its VIA pins.

mod arbitration;
pub mod directory;
mod link;
mod storage;

use emu_core::{Observable, Value};

pub use arbitration::{ArbState, CHANNEL_COUNT, COMMAND_BUFFER_LEN, Channel};
pub use directory::{LISTING_ADDRESS, build_listing};
pub use link::LinkState;
pub use storage::{DirEntry, FsStorage, OpenMode, StorageError, StorageFile, StorageProvider};

use link::{
    BIT_TIME, BIT_TIMEOUT, EMPTY_TIMEOUT, EOI_ACK_HOLD, EOI_SIGNAL, EOI_TIMEOUT, IDLE_SETTLE,
    RECEIVE_TIMEOUT, TURNAROUND_DELAY,
};

/// Default device number of the first disk drive.
pub const DEFAULT_DEVICE: u8 = 8;

/// A disk drive on the IEC bus.
pub struct IecDrive {
    device: u8,
    storage: Option<Box<dyn StorageProvider>>,
    long_directory: bool,

    // Inputs from the computer. true = pulled low.
    atn: bool,
    clk: bool,
    data: bool,
    prev_atn: bool,

    // Outputs. true = drive pulls the line low.
    clk_out: bool,
    data_out: bool,

    link: LinkState,
    /// Cycles spent in the current link state.
    link_cycles: u32,
    bit: u8,
    byte: u8,
    /// Current byte is the last of the transfer.
    eoi: bool,
    /// Nothing to send on the talking channel.
    empty: bool,

    arb: ArbState,
    channel: Option<u8>,
    channels: [Channel; CHANNEL_COUNT],
    buffer: Vec<u8>,
}

impl IecDrive {
    #[must_use]
    pub fn new(device: u8) -> Self {
        Self {
            device,
            storage: None,
            long_directory: false,
            atn: false,
            clk: false,
            data: false,
            prev_atn: false,
            clk_out: false,
            data_out: false,
            link: LinkState::Idle,
            link_cycles: 0,
            bit: 0,
            byte: 0,
            eoi: false,
            empty: false,
            arb: ArbState::Idle,
            channel: None,
            channels: Default::default(),
            buffer: Vec::with_capacity(COMMAND_BUFFER_LEN),
        }
    }

    /// Attach the storage files are served from.
    pub fn set_storage(&mut self, storage: Box<dyn StorageProvider>) {
        self.storage = Some(storage);
    }

    /// List names up to 16 characters and add the "2A" format tag to the
    /// header.
    pub fn set_long_directory(&mut self, long: bool) {
        self.long_directory = long;
    }

    /// Release both lines and forget every transfer. Open channels are
    /// closed; the attached storage and directory format are kept.
    pub fn reset(&mut self) {
        self.clk_out = false;
        self.data_out = false;
        self.atn = false;
        self.clk = false;
        self.data = false;
        self.prev_atn = false;
        self.set_link(LinkState::Idle);
        self.arb = ArbState::Idle;
        self.channel = None;
        self.buffer.clear();
        self.channels = Default::default();
        self.bit = 0;
        self.byte = 0;
        self.eoi = false;
        self.empty = false;
    }

    // --- Inputs ---

    /// Releasing ATN while unaddressed lets go of the bus at once, since
    /// an idle drive is not ticked.
    pub fn set_atn(&mut self, pulled: bool) {
        if self.atn && !pulled && self.arb == ArbState::Idle {
            self.prev_atn = false;
            self.clk_out = false;
            self.data_out = false;
            self.set_link(LinkState::Idle);
        }
        self.atn = pulled;
    }

    pub fn set_clk(&mut self, pulled: bool) {
        self.clk = pulled;
    }

    pub fn set_data(&mut self, pulled: bool) {
        self.data = pulled;
    }

    // --- Outputs ---

    #[must_use]
    pub fn clk_out(&self) -> bool {
        self.clk_out
    }

    #[must_use]
    pub fn data_out(&self) -> bool {
        self.data_out
    }

    // --- State ---

    /// Whether the drive needs ticking: ATN is asserted or a command is in
    /// progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.atn || self.arb != ArbState::Idle
    }

    #[must_use]
    pub fn device(&self) -> u8 {
        self.device
    }

    #[must_use]
    pub fn link_state(&self) -> LinkState {
        self.link
    }

    #[must_use]
    pub fn arb_state(&self) -> ArbState {
        self.arb
    }

    /// Secondary address selected by the last LISTEN/TALK.
    #[must_use]
    pub fn channel(&self) -> Option<u8> {
        self.channel
    }

    #[must_use]
    pub fn channel_state(&self, channel: usize) -> Option<&Channel> {
        self.channels.get(channel)
    }

    fn set_link(&mut self, state: LinkState) {
        self.link = state;
        self.link_cycles = 0;
    }

    /// Advance the handshake by `cycles` CPU cycles.
    pub fn tick(&mut self, cycles: u32) {
        if self.atn && !self.prev_atn {
            // Every device answers ATN by holding DATA.
            self.data_out = true;
            self.clk_out = false;
            self.set_link(LinkState::SenderProbing);
        }
        self.prev_atn = self.atn;

        if !self.atn && self.arb == ArbState::Idle {
            return;
        }

        self.link_cycles = self.link_cycles.saturating_add(cycles);
        let t = self.link_cycles;

        match self.link {
            LinkState::Idle => {
                if self.clk {
                    self.data_out = true;
                    self.set_link(LinkState::SenderProbing);
                }
            }
            LinkState::SenderProbing => {
                if !self.clk {
                    self.data_out = false;
                    self.eoi = false;
                    self.set_link(LinkState::ReadyToReceive);
                }
            }
            LinkState::ReadyToReceive => {
                if t > EOI_ACK_HOLD && self.eoi {
                    self.data_out = false;
                    self.set_link(LinkState::ReadyToReceive);
                } else if t > EOI_TIMEOUT && !self.eoi {
                    self.data_out = true;
                    self.eoi = true;
                    self.set_link(LinkState::ReadyToReceive);
                } else if self.clk {
                    self.bit = 0;
                    self.byte = 0;
                    self.set_link(LinkState::WaitDataValid);
                } else if t > RECEIVE_TIMEOUT {
                    self.set_link(LinkState::GoToIdle);
                }
            }
            LinkState::WaitDataValid => {
                if !self.clk {
                    self.byte |= u8::from(!self.data) << self.bit;
                    self.bit += 1;
                    self.set_link(LinkState::WaitDataInvalid);
                } else if t > BIT_TIMEOUT {
                    self.set_link(LinkState::GoToIdle);
                }
            }
            LinkState::WaitDataInvalid => {
                if self.clk {
                    self.set_link(if self.bit == 8 {
                        LinkState::DataAccepted
                    } else {
                        LinkState::WaitDataValid
                    });
                } else if t > BIT_TIMEOUT {
                    self.set_link(LinkState::GoToIdle);
                }
            }
            LinkState::DataAccepted => {
                if !self.data {
                    self.data_out = true;
                    self.set_link(if self.eoi {
                        LinkState::GoToIdle
                    } else {
                        LinkState::SenderProbing
                    });
                    self.process_byte(self.byte);
                }
            }
            LinkState::GoToIdle => {
                if t >= IDLE_SETTLE {
                    self.set_link(LinkState::Idle);
                    self.data_out = false;
                    self.clk_out = false;
                }
            }
            LinkState::TurnAround => {
                if !self.clk {
                    self.data_out = false;
                    self.clk_out = true;
                    self.set_link(LinkState::TurnAroundReady);
                }
            }
            LinkState::TurnAroundReady => {
                if t >= TURNAROUND_DELAY {
                    self.clk_out = false;
                    self.set_link(LinkState::WaitReceiverReady);
                }
            }
            LinkState::WaitReceiverReady => {
                if !self.data {
                    self.set_link(LinkState::ReadyToSend);
                    self.fetch_next_byte();
                    self.bit = 0;
                }
            }
            LinkState::ReadyToSend => {
                if self.empty {
                    if t > EMPTY_TIMEOUT {
                        self.set_link(LinkState::GoToIdle);
                    }
                } else if self.eoi {
                    if t > EOI_SIGNAL && self.data {
                        self.set_link(LinkState::WaitEndOfEoiAck);
                    }
                } else if t > BIT_TIME {
                    self.clk_out = true;
                    self.set_link(LinkState::SendDataInvalid);
                }
            }
            LinkState::WaitEndOfEoiAck => {
                if !self.data {
                    self.clk_out = true;
                    self.set_link(LinkState::SendDataInvalid);
                }
            }
            LinkState::SendDataInvalid => {
                if t > BIT_TIME {
                    self.clk_out = false;
                    self.data_out = (self.byte >> self.bit) & 1 == 0;
                    self.bit += 1;
                    self.set_link(LinkState::SendDataValid);
                }
            }
            LinkState::SendDataValid => {
                if t > BIT_TIME {
                    self.clk_out = true;
                    if self.bit == 8 {
                        self.data_out = false;
                        self.set_link(LinkState::WaitDataAccepted);
                    } else {
                        self.set_link(LinkState::SendDataInvalid);
                    }
                }
            }
            LinkState::WaitDataAccepted => {
                if self.data {
                    self.set_link(if self.eoi {
                        LinkState::GoToIdle
                    } else {
                        LinkState::TurnAroundReady
                    });
                }
            }
        }
    }
}

impl Default for IecDrive {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE)
    }
}

const QUERY_PATHS: &[&str] = &[
    "device",
    "link",
    "arb",
    "channel",
    "atn",
    "clk",
    "data",
    "clk_out",
    "data_out",
    "eoi",
    "empty",
    "active",
];

impl Observable for IecDrive {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(n) = path.strip_prefix("channels.") {
            let n: usize = n.parse().ok()?;
            return self.channels.get(n).map(|c| Value::from(c.kind()));
        }
        match path {
            "device" => Some(self.device.into()),
            "link" => Some(self.link.name().into()),
            "arb" => Some(self.arb.name().into()),
            "channel" => Some(self.channel.map_or(Value::from("none"), Value::from)),
            "atn" => Some(self.atn.into()),
            "clk" => Some(self.clk.into()),
            "data" => Some(self.data.into()),
            "clk_out" => Some(self.clk_out.into()),
            "data_out" => Some(self.data_out.into()),
            "eoi" => Some(self.eoi.into()),
            "empty" => Some(self.empty.into()),
            "active" => Some(self.is_active().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deliver a byte straight to the command layer.
    fn command(drive: &mut IecDrive, byte: u8) {
        drive.atn = true;
        drive.process_byte(byte);
    }

    fn data(drive: &mut IecDrive, bytes: &[u8]) {
        drive.atn = false;
        for &b in bytes {
            drive.process_byte(b);
        }
    }

    #[test]
    fn inactive_drive_ignores_ticks() {
        let mut drive = IecDrive::default();
        drive.set_clk(true);
        drive.tick(10);
        assert_eq!(drive.link_state(), LinkState::Idle);
        assert!(!drive.data_out());
        assert!(!drive.is_active());
    }

    #[test]
    fn atn_edge_answers_with_data() {
        let mut drive = IecDrive::default();
        // Talker holds CLK, so the probe is not answered yet.
        drive.set_clk(true);
        drive.set_atn(true);
        assert!(drive.is_active());
        drive.tick(1);
        assert!(drive.data_out());
        assert!(!drive.clk_out());
        assert_eq!(drive.link_state(), LinkState::SenderProbing);
    }

    #[test]
    fn listen_other_device_stays_idle() {
        let mut drive = IecDrive::default();
        command(&mut drive, 0x29);
        assert_eq!(drive.arb_state(), ArbState::Idle);
    }

    #[test]
    fn talk_and_untalk() {
        let mut drive = IecDrive::default();
        command(&mut drive, 0x48);
        assert_eq!(drive.arb_state(), ArbState::Talking);
        command(&mut drive, 0x60);
        assert_eq!(drive.channel(), Some(0));
        assert_eq!(drive.link_state(), LinkState::TurnAround);
        command(&mut drive, 0x5F);
        assert_eq!(drive.arb_state(), ArbState::Idle);
        assert_eq!(drive.channel(), None);
    }

    #[test]
    fn secondary_address_ignored_when_idle() {
        let mut drive = IecDrive::default();
        command(&mut drive, 0x62);
        assert_eq!(drive.channel(), None);
    }

    #[test]
    fn open_without_storage_marks_empty() {
        let mut drive = IecDrive::default();
        command(&mut drive, 0x28);
        command(&mut drive, 0xF0);
        assert_eq!(drive.arb_state(), ArbState::Open);
        data(&mut drive, b"GAME");
        assert_eq!(drive.buffer, b"GAME");
        command(&mut drive, 0x3F);
        assert!(drive.empty);
        assert!(matches!(drive.channels[0], Channel::Closed));
        assert_eq!(drive.arb_state(), ArbState::Idle);
        assert!(drive.buffer.is_empty());
    }

    #[test]
    fn name_buffer_is_bounded() {
        let mut drive = IecDrive::default();
        command(&mut drive, 0x28);
        command(&mut drive, 0xF0);
        data(&mut drive, &[b'A'; 300]);
        assert_eq!(drive.buffer.len(), COMMAND_BUFFER_LEN);
    }

    #[test]
    fn bytes_ignored_when_not_addressed() {
        let mut drive = IecDrive::default();
        data(&mut drive, b"XYZ");
        assert!(drive.buffer.is_empty());
    }

    #[test]
    fn go_to_idle_releases_lines() {
        let mut drive = IecDrive::default();
        drive.set_clk(true);
        drive.set_atn(true);
        drive.tick(1);
        drive.set_link(LinkState::GoToIdle);
        drive.tick(59);
        assert!(drive.data_out());
        drive.tick(1);
        assert_eq!(drive.link_state(), LinkState::Idle);
        assert!(!drive.data_out());
        assert!(!drive.clk_out());
    }

    #[test]
    fn reset_releases_everything() {
        let mut drive = IecDrive::default();
        drive.set_long_directory(true);
        drive.set_atn(true);
        drive.tick(1);
        command(&mut drive, 0x28);
        drive.reset();
        assert!(!drive.data_out());
        assert_eq!(drive.link_state(), LinkState::Idle);
        assert_eq!(drive.arb_state(), ArbState::Idle);
        assert!(!drive.is_active());
        assert!(drive.long_directory);
    }

    #[test]
    fn query_paths_resolve() {
        let drive = IecDrive::default();
        assert_eq!(drive.query("device"), Some(Value::U8(8)));
        assert_eq!(drive.query("link"), Some(Value::from("idle")));
        assert_eq!(drive.query("channel"), Some(Value::from("none")));
        assert_eq!(drive.query("channels.3"), Some(Value::from("closed")));
        assert_eq!(drive.query("channels.16"), None);
        for path in drive.query_paths() {
            assert!(drive.query(path).is_some(), "{path}");
        }
    }
}
