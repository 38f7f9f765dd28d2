//! Inbound commands to the watch service.
//!
//! These are actions requested on the watch itself (UI buttons, gestures)
//! that the [`WatchService`](super::service::WatchService) turns into
//! local state changes plus frames to the phone.

use crate::protocol::encoder::MusicCommand;

/// Commands that the UI collaborator can send into the watch core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchCommand {
    /// Media transport control for the phone's player.
    MusicControl(MusicCommand),

    /// Dismiss a notification on the watch and tell the phone.
    DismissNotification(u32),

    /// Accept the ringing call.
    AnswerCall,

    /// Reject / hang up the call.
    RejectCall,

    /// Start (`true`) or stop ringing the phone.
    FindPhone(bool),
}
