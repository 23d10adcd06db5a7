use std::collections::HashMap;
use std::fmt;

use log::{debug, info, warn};

use crate::entry::Entry;
use crate::error::TendError;

const APP_NAME: &str = "tend";

/// One pending desktop notification, keyed by the entry that owns it.
#[derive(Clone, Debug, PartialEq)]
pub struct Remind {
    pub entry_id: String,
    pub due_at: i64,
    pub title: String,
    pub body: String,
    pub icon: Option<&'static str>,
}

pub fn reminder_for(entry: &Entry) -> Remind {
    Remind {
        entry_id: entry.id.clone(),
        due_at: entry.time_to_next_action,
        title: format!("{} needs care!", entry.name),
        body: format!("It's time to {} {}", entry.kind.verb(), entry.name),
        icon: entry.kind.icon(),
    }
}

pub fn test_notification() -> Remind {
    Remind {
        entry_id: "test".to_string(),
        due_at: 0,
        title: "Notifications are working!".to_string(),
        body: "You'll now get reminders for your pets and plants.".to_string(),
        icon: None,
    }
}

/// Delivery seam. The daemon sends through libnotify; tests record.
pub trait Notifier {
    fn notify(&mut self, remind: &Remind) -> Result<(), TendError>;
}

pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn new() -> Result<Self, TendError> {
        if !libnotify::is_initted() {
            libnotify::init(APP_NAME).map_err(|e| TendError::Notification(e.to_string()))?;
        }
        Ok(DesktopNotifier)
    }
}

impl Drop for DesktopNotifier {
    fn drop(&mut self) {
        if libnotify::is_initted() {
            libnotify::uninit();
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&mut self, remind: &Remind) -> Result<(), TendError> {
        let notification =
            libnotify::Notification::new(&remind.title, Some(remind.body.as_str()), remind.icon);
        notification.set_urgency(libnotify::Urgency::Normal);
        notification.set_timeout(10_000);
        notification
            .show()
            .map_err(|e| TendError::Notification(e.to_string()))?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
            PermissionStatus::Undetermined => "undetermined",
        };
        write!(f, "{s}")
    }
}

/// Current permission state without touching the notification server.
/// Undetermined until someone has asked.
pub fn permission_status() -> PermissionStatus {
    if libnotify::is_initted() {
        PermissionStatus::Granted
    } else {
        PermissionStatus::Undetermined
    }
}

/// Asks the notification server for a session. Denied means no server is
/// reachable; retrying later is the user's path out.
pub fn request_permission() -> PermissionStatus {
    if libnotify::is_initted() {
        return PermissionStatus::Granted;
    }
    match libnotify::init(APP_NAME) {
        Ok(_) => PermissionStatus::Granted,
        Err(_) => PermissionStatus::Denied,
    }
}

/// Pending reminders for the daemon, at most one per entry, sorted by due
/// time.
pub struct ReminderDispatcher {
    pending: Vec<Remind>,
    // entry id -> due time it already fired at, so a store reload does not
    // resurrect a reminder the user has already seen
    fired: HashMap<String, i64>,
}

impl ReminderDispatcher {
    pub fn new() -> Self {
        ReminderDispatcher {
            pending: Vec::new(),
            fired: HashMap::new(),
        }
    }

    /// Schedules the entry's reminder at its current due time, replacing any
    /// pending one. Entries with notifications off are left alone.
    pub fn schedule(&mut self, entry: &Entry) {
        self.cancel(&entry.id);

        if !entry.notifications_enabled {
            return;
        }

        self.pending.push(reminder_for(entry));
        self.sort_pending();
        debug!(
            "scheduled reminder for {} at {}",
            entry.name, entry.time_to_next_action
        );
    }

    /// Drops any pending reminder for `id`. Cancelling an unknown or already
    /// fired reminder is not an error.
    pub fn cancel(&mut self, id: &str) {
        self.pending.retain(|r| r.entry_id != id);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_for(&self, id: &str) -> Option<&Remind> {
        self.pending.iter().find(|r| r.entry_id == id)
    }

    /// Rebuilds the pending set from a store snapshot: cancel everything,
    /// then schedule each entry again. A reminder that already fired stays
    /// fired until its entry gets a new due time.
    pub fn sync(&mut self, entries: &[Entry]) {
        self.pending.clear();
        self.fired
            .retain(|id, due| entries.iter().any(|e| e.id == *id && e.time_to_next_action == *due));

        for entry in entries {
            if self.fired.get(&entry.id) == Some(&entry.time_to_next_action) {
                continue;
            }
            self.schedule(entry);
        }
    }

    /// Delivers everything due by `now_millis`. One shot: a failed delivery
    /// is logged and dropped, not retried.
    pub fn fire_due(&mut self, now_millis: i64, notifier: &mut dyn Notifier) -> usize {
        let mut delivered = 0;

        while self.pending.first().is_some_and(|r| r.due_at <= now_millis) {
            let remind = self.pending.remove(0);
            self.fired.insert(remind.entry_id.clone(), remind.due_at);

            match notifier.notify(&remind) {
                Ok(()) => {
                    info!("reminded: {}", remind.title);
                    delivered += 1;
                }
                Err(e) => warn!("failed to deliver reminder for {}: {}", remind.entry_id, e),
            }
        }

        delivered
    }

    fn sort_pending(&mut self) {
        self.pending.sort_by(|a, b| a.due_at.cmp(&b.due_at));
    }
}
