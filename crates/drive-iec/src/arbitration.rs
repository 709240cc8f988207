//! Command layer: LISTEN/TALK addressing, channel OPEN/CLOSE and file
//! transfer over the bytes the link layer delivers.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::directory::build_listing;
use crate::link::LinkState;
use crate::storage::{OpenMode, StorageError, StorageFile};
use crate::IecDrive;

/// Channels addressable by OPEN/CLOSE.
pub const CHANNEL_COUNT: usize = 16;
/// Longest file name or write burst held before the drive acts on it.
pub const COMMAND_BUFFER_LEN: usize = 256;

/// Device address that means UNLISTEN/UNTALK.
const UNADDRESS: u8 = 31;

/// Arbitration state of the drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbState {
    Idle,
    /// Addressed by LISTEN.
    Listening,
    /// OPEN received; collecting the name until UNLISTEN.
    Open,
    /// CLOSE received; acted on at UNLISTEN.
    Close,
    /// Addressed by TALK.
    Talking,
}

impl ArbState {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Open => "open",
            Self::Close => "close",
            Self::Talking => "talking",
        }
    }
}

/// What a channel is doing. A handle exists only while a file is open.
#[derive(Default)]
pub enum Channel {
    #[default]
    Closed,
    DirectoryRead {
        listing: Vec<u8>,
        position: usize,
    },
    ProgramRead {
        file: Box<dyn StorageFile>,
        remaining: u64,
    },
    ProgramWrite {
        file: Box<dyn StorageFile>,
    },
}

impl Channel {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::DirectoryRead { .. } => "directory",
            Self::ProgramRead { .. } => "read",
            Self::ProgramWrite { .. } => "write",
        }
    }
}

impl IecDrive {
    /// Handle one byte delivered by the link layer.
    pub(crate) fn process_byte(&mut self, value: u8) {
        if self.atn {
            log::trace!("iec: {value:02X} under ATN");
            let addr = value & 0x1F;
            match value & 0xE0 {
                0x20 => {
                    if addr == UNADDRESS {
                        if self.arb == ArbState::Open && !self.buffer.is_empty() {
                            self.open_channel();
                        } else if self.arb == ArbState::Close {
                            self.close_channel();
                        } else {
                            self.write_channel();
                        }
                        self.set_arb(ArbState::Idle);
                    } else if addr == self.device {
                        self.set_arb(ArbState::Listening);
                    }
                    self.channel = None;
                    self.buffer.clear();
                }
                0x40 => {
                    self.channel = None;
                    if addr == self.device {
                        self.set_arb(ArbState::Talking);
                    } else {
                        self.set_arb(ArbState::Idle);
                    }
                }
                0x60 => {
                    if self.arb != ArbState::Idle {
                        self.channel = Some(addr);
                        if self.arb == ArbState::Talking {
                            self.set_link(LinkState::TurnAround);
                        }
                    }
                }
                0xE0 => {
                    self.channel = Some(addr & 0x0F);
                    if addr & 0x10 != 0 {
                        self.set_arb(ArbState::Open);
                    } else {
                        self.set_arb(ArbState::Close);
                    }
                }
                _ => {}
            }
            return;
        }

        if matches!(self.arb, ArbState::Open | ArbState::Listening) {
            if self.buffer.len() == COMMAND_BUFFER_LEN
                && self.arb == ArbState::Listening
                && matches!(self.current_channel(), Some(Channel::ProgramWrite { .. }))
            {
                self.write_channel();
                self.buffer.clear();
            }
            if self.buffer.len() < COMMAND_BUFFER_LEN {
                self.buffer.push(value);
            }
        }
    }

    fn set_arb(&mut self, state: ArbState) {
        if self.arb != state {
            log::trace!("iec: {} -> {}", self.arb.name(), state.name());
        }
        self.arb = state;
    }

    fn current_channel(&self) -> Option<&Channel> {
        self.channel.and_then(|ch| self.channels.get(usize::from(ch)))
    }

    fn current_channel_mut(&mut self) -> Option<&mut Channel> {
        self.channel.and_then(|ch| self.channels.get_mut(usize::from(ch)))
    }

    fn open_channel(&mut self) {
        let Some(ch) = self.channel else { return };
        let name = String::from_utf8_lossy(&self.buffer).into_owned();
        log::debug!("iec: OPEN {ch} \"{name}\"");

        let channel = match ch {
            0 if name.starts_with('$') => match self.directory_listing() {
                Ok(listing) => {
                    self.empty = false;
                    Channel::DirectoryRead {
                        listing,
                        position: 0,
                    }
                }
                Err(e) => {
                    log::warn!("iec: {e}");
                    self.empty = true;
                    Channel::Closed
                }
            },
            0 | 1 => {
                let mode = if ch == 0 { OpenMode::Read } else { OpenMode::Write };
                match self.open_program(&format!("{name}.PRG"), mode) {
                    Ok(channel) => {
                        self.empty = matches!(channel, Channel::ProgramRead { remaining: 0, .. });
                        channel
                    }
                    Err(e) => {
                        log::warn!("iec: {e}");
                        self.empty = true;
                        Channel::Closed
                    }
                }
            }
            // Named data channels and the command channel are not served.
            _ => return,
        };
        self.channels[usize::from(ch)] = channel;
    }

    fn directory_listing(&mut self) -> Result<Vec<u8>, StorageError> {
        let long = self.long_directory;
        let storage = self.storage.as_mut().ok_or(StorageError::Detached)?;
        let entries = storage.entries().map_err(StorageError::Listing)?;
        Ok(build_listing(&storage.directory(), &entries, long))
    }

    fn open_program(&mut self, name: &str, mode: OpenMode) -> Result<Channel, StorageError> {
        let storage = self.storage.as_mut().ok_or(StorageError::Detached)?;
        let open_error = |source| StorageError::Open {
            name: name.to_string(),
            source,
        };
        let mut file = storage.open(name, mode).map_err(open_error)?;
        Ok(match mode {
            OpenMode::Read => {
                let remaining = file.seek(SeekFrom::End(0)).map_err(open_error)?;
                file.seek(SeekFrom::Start(0)).map_err(open_error)?;
                Channel::ProgramRead { file, remaining }
            }
            OpenMode::Write => Channel::ProgramWrite { file },
        })
    }

    fn close_channel(&mut self) {
        let Some(ch) = self.channel else { return };
        if let Some(channel) = self.channels.get_mut(usize::from(ch)) {
            log::debug!("iec: CLOSE {ch} ({})", channel.kind());
            if let Channel::ProgramWrite { file } = channel
                && let Err(e) = file.flush()
            {
                log::warn!("iec: {}", StorageError::Write(e));
            }
            *channel = Channel::Closed;
        }
    }

    fn write_channel(&mut self) {
        let Some(Channel::ProgramWrite { file }) = self
            .channel
            .and_then(|ch| self.channels.get_mut(usize::from(ch)))
        else {
            return;
        };
        if let Err(e) = file.write_all(&self.buffer) {
            log::warn!("iec: {}", StorageError::Write(e));
        }
    }

    /// Load `byte` and `eoi` with the next byte to send on the current
    /// channel. Sets `empty` when there is nothing to send.
    pub(crate) fn fetch_next_byte(&mut self) {
        let fetched = match self.current_channel_mut() {
            Some(Channel::DirectoryRead { listing, position }) => {
                listing.get(*position).copied().map(|byte| {
                    *position += 1;
                    Ok((byte, *position == listing.len()))
                })
            }
            Some(Channel::ProgramRead { file, remaining }) if *remaining > 0 => {
                let mut byte = [0u8];
                Some(match file.read_exact(&mut byte) {
                    Ok(()) => {
                        *remaining -= 1;
                        Ok((byte[0], *remaining == 0))
                    }
                    Err(e) => Err(StorageError::Read(e)),
                })
            }
            _ => None,
        };

        match fetched {
            Some(Ok((byte, last))) => {
                self.byte = byte;
                self.eoi = last;
            }
            Some(Err(e)) => {
                log::warn!("iec: {e}");
                self.empty = true;
            }
            None => self.empty = true,
        }
    }
}
