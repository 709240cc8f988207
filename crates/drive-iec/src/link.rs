//! Byte-level handshake on CLK and DATA.

/// Where the drive is in the serial handshake.
///
/// The receive half runs while the computer talks to the drive (commands
/// under ATN, file names, save data). The send half runs after a TALK
/// turnaround, when the drive becomes the talker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    /// Holding DATA to signal presence; waiting for the talker to release CLK.
    SenderProbing,
    ReadyToReceive,
    WaitDataValid,
    WaitDataInvalid,
    /// Eight bits in; waiting for DATA to be released before the frame ack.
    DataAccepted,
    GoToIdle,
    /// Waiting for the computer to let go of CLK after TALK.
    TurnAround,
    TurnAroundReady,
    WaitReceiverReady,
    ReadyToSend,
    SendDataInvalid,
    SendDataValid,
    WaitDataAccepted,
    WaitEndOfEoiAck,
}

impl LinkState {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SenderProbing => "sender_probing",
            Self::ReadyToReceive => "ready_to_receive",
            Self::WaitDataValid => "wait_data_valid",
            Self::WaitDataInvalid => "wait_data_invalid",
            Self::DataAccepted => "data_accepted",
            Self::GoToIdle => "go_to_idle",
            Self::TurnAround => "turn_around",
            Self::TurnAroundReady => "turn_around_ready",
            Self::WaitReceiverReady => "wait_receiver_ready",
            Self::ReadyToSend => "ready_to_send",
            Self::SendDataInvalid => "send_data_invalid",
            Self::SendDataValid => "send_data_valid",
            Self::WaitDataAccepted => "wait_data_accepted",
            Self::WaitEndOfEoiAck => "wait_end_of_eoi_ack",
        }
    }
}

// Handshake timings in CPU cycles (~1 us each).

/// Listener holds DATA this long to acknowledge an EOI.
pub(crate) const EOI_ACK_HOLD: u32 = 60;
/// Talker silence after which the listener treats the next byte as last.
pub(crate) const EOI_TIMEOUT: u32 = 256;
/// Talker never started the byte.
pub(crate) const RECEIVE_TIMEOUT: u32 = 512;
/// A bit did not arrive.
pub(crate) const BIT_TIMEOUT: u32 = 1024;
/// Settle time before returning to idle.
pub(crate) const IDLE_SETTLE: u32 = 60;
/// Delay before the drive takes over CLK after a turnaround.
pub(crate) const TURNAROUND_DELAY: u32 = 100;
/// Half-period of a sent bit, and the gap before a normal byte.
pub(crate) const BIT_TIME: u32 = 60;
/// Gap that signals EOI to the receiver.
pub(crate) const EOI_SIGNAL: u32 = 200;
/// Nothing to send: give up after this long.
pub(crate) const EMPTY_TIMEOUT: u32 = 512;
