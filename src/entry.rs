use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timing;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Animal {
    Dog,
    Cat,
}

/// What is being cared for. Decides the action verb and the notification
/// icon; only pets carry an animal.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Kind {
    Pet {
        #[serde(rename = "animalType", skip_serializing_if = "Option::is_none")]
        animal: Option<Animal>,
    },
    Plant,
}

impl Kind {
    pub fn verb(&self) -> &'static str {
        match self {
            Kind::Pet { .. } => "feed",
            Kind::Plant => "water",
        }
    }

    pub fn icon(&self) -> Option<&'static str> {
        match self {
            Kind::Pet {
                animal: Some(Animal::Dog),
            } => Some("dog"),
            Kind::Pet {
                animal: Some(Animal::Cat),
            } => Some("cat"),
            Kind::Pet { animal: None } => Some("pets"),
            Kind::Plant => Some("plant"),
        }
    }
}

/// A tracked pet or plant with a recurring care schedule.
///
/// `time_to_next_action` is always `last_done` plus the interval; every write
/// that touches one recomputes the other.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: Kind,
    /// Care interval in hours. Fractional values are sub-hour intervals.
    pub frequency: f64,
    /// Milliseconds since the epoch.
    pub time_to_next_action: i64,
    /// Milliseconds since the epoch.
    pub last_done: i64,
    #[serde(default = "enabled_by_default")]
    pub notifications_enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Entry {
    pub fn new(
        name: String,
        kind: Kind,
        frequency: f64,
        notifications_enabled: bool,
        now_millis: i64,
    ) -> Self {
        Entry {
            id: Uuid::new_v4().to_string(),
            name,
            kind,
            frequency,
            time_to_next_action: timing::next_due_millis(frequency, now_millis),
            last_done: now_millis,
            notifications_enabled,
        }
    }

    /// The care action happened now; the next one is one full interval away.
    pub fn mark_done(&mut self, now_millis: i64) {
        self.last_done = now_millis;
        self.time_to_next_action = timing::next_due_millis(self.frequency, now_millis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_derives_due_time_from_frequency() {
        let entry = Entry::new("Fern".to_string(), Kind::Plant, 48.0, true, 1_000);
        assert_eq!(entry.last_done, 1_000);
        assert_eq!(entry.time_to_next_action, 1_000 + 48 * 3_600_000);
        assert!(entry.notifications_enabled);
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn mark_done_resets_both_timestamps() {
        let mut entry = Entry::new(
            "Rex".to_string(),
            Kind::Pet {
                animal: Some(Animal::Dog),
            },
            24.0,
            true,
            0,
        );
        entry.mark_done(5_000);
        assert_eq!(entry.last_done, 5_000);
        assert_eq!(entry.time_to_next_action, 5_000 + 86_400_000);
    }

    #[test]
    fn pet_records_keep_the_flat_wire_shape() {
        let entry = Entry::new(
            "Whiskers".to_string(),
            Kind::Pet {
                animal: Some(Animal::Cat),
            },
            12.0,
            true,
            0,
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "pet");
        assert_eq!(json["animalType"], "cat");
        assert_eq!(json["frequency"], 12.0);
        assert_eq!(json["lastDone"], 0);
        assert_eq!(json["notificationsEnabled"], true);
    }

    #[test]
    fn plant_records_carry_no_animal_field() {
        let entry = Entry::new("Fern".to_string(), Kind::Plant, 48.0, true, 0);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "plant");
        assert!(json.get("animalType").is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let entry = Entry::new(
            "Whiskers".to_string(),
            Kind::Pet { animal: None },
            0.5,
            false,
            42,
        );
        let json = serde_json::to_string(&entry).unwrap();
        let back: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn notifications_default_on_when_missing_from_stored_records() {
        let json = r#"{"id":"a1","name":"Basil","type":"plant","frequency":72.0,"timeToNextAction":300,"lastDone":100}"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        assert!(entry.notifications_enabled);
        assert_eq!(entry.kind, Kind::Plant);
    }

    #[test]
    fn verbs_follow_the_kind() {
        assert_eq!(Kind::Pet { animal: None }.verb(), "feed");
        assert_eq!(Kind::Plant.verb(), "water");
    }
}
