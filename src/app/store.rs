//! Domain state store: what the phone has told us.
//!
//! Mutated only by inbound message dispatch and by local actions in
//! [`WatchService`](super::service::WatchService).  Readers (UI, tests) get
//! clones.

/// Ring-buffer capacity for notifications.
pub const MAX_NOTIFICATIONS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    pub id: u32,
    pub source: String,
    pub sender: String,
    pub title: String,
    pub body: String,
}

impl Notification {
    /// Blank the slot in place; it stays in the ring as a reusable entry.
    fn clear(&mut self) {
        self.id = 0;
        self.source.clear();
        self.sender.clear();
        self.title.clear();
        self.body.clear();
    }
}

/// Fixed-capacity ring of the most recent notifications.
///
/// `count` never exceeds [`MAX_NOTIFICATIONS`]; once full, each insert
/// overwrites the oldest slot.
#[derive(Debug, Default)]
pub struct NotificationRing {
    slots: [Notification; MAX_NOTIFICATIONS],
    head: usize,
    count: usize,
}

impl NotificationRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store at the write head and advance it circularly.
    pub fn push(&mut self, n: Notification) {
        self.slots[self.head] = n;
        self.head = (self.head + 1) % MAX_NOTIFICATIONS;
        if self.count < MAX_NOTIFICATIONS {
            self.count += 1;
        }
    }

    /// Clear the first occupied slot carrying `id`.  Returns whether one matched.
    pub fn clear_by_id(&mut self, id: u32) -> bool {
        match self.slots[..self.count].iter_mut().find(|n| n.id == id) {
            Some(slot) => {
                slot.clear();
                true
            }
            None => false,
        }
    }

    /// Most recently written slot (possibly a cleared one).
    pub fn latest(&self) -> Option<Notification> {
        if self.count == 0 {
            return None;
        }
        let idx = (self.head + MAX_NOTIFICATIONS - 1) % MAX_NOTIFICATIONS;
        Some(self.slots[idx].clone())
    }

    /// Occupied slots, cleared ones included.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Physical slot contents, for inspection.
    pub fn slot(&self, idx: usize) -> Option<&Notification> {
        self.slots[..self.count].get(idx)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MusicInfo {
    pub artist: String,
    pub album: String,
    pub track: String,
    /// Track length in seconds.
    pub duration: u32,
    /// Playback position in seconds.
    pub position: u32,
    pub playing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Weather {
    pub temp_celsius: i32,
    /// Relative humidity in percent, as sent.
    pub humidity: i32,
    pub description: String,
    /// OpenWeatherMap condition code.
    pub code: i32,
    /// False until the first weather message arrives.
    pub valid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallInfo {
    pub command: String,
    pub name: String,
    pub number: String,
    pub active: bool,
}

impl CallInfo {
    /// Build a call record; `active` iff the command is `incoming` or `start`.
    pub fn new(command: String, name: String, number: String) -> Self {
        let active = matches!(command.as_str(), "incoming" | "start");
        Self {
            command,
            name,
            number,
            active,
        }
    }
}

/// Everything the phone has pushed, owned by one engine instance.
#[derive(Debug, Default)]
pub struct DomainStore {
    pub notifications: NotificationRing,
    pub music: MusicInfo,
    pub weather: Weather,
    pub call: CallInfo,
}

impl DomainStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite track metadata and position, keeping play state.
    pub fn update_track(&mut self, info: MusicInfo) {
        let playing = self.music.playing;
        self.music = MusicInfo { playing, ..info };
    }
}
