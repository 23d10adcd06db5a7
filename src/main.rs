mod entry;
mod error;
mod process;
mod reminder;
mod store;
mod timing;

use chrono::{Local, LocalResult, TimeZone};
use clap::{Parser, Subcommand, ValueEnum};
use home::home_dir;
use log::info;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::entry::{Animal, Entry, Kind};
use crate::error::TendError;
use crate::process::Process;
use crate::reminder::{DesktopNotifier, Notifier, PermissionStatus};
use crate::store::{EntryStore, generate_store};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short = 'c', long = "config", default_value_t = ("~/.config/tend.json").to_string())]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Pet,
    Plant,
}

#[derive(Clone, Copy, ValueEnum)]
enum AnimalArg {
    Dog,
    Cat,
}

impl AnimalArg {
    fn to_animal(self) -> Animal {
        match self {
            AnimalArg::Dog => Animal::Dog,
            AnimalArg::Cat => Animal::Cat,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    Start,
    Add {
        name: String,

        #[arg(short = 'k', long = "kind", value_enum)]
        kind: KindArg,

        #[arg(short = 'a', long = "animal", value_enum)]
        animal: Option<AnimalArg>,

        /// Care interval, e.g. "1d 12h" or "30m"
        #[arg(short = 'e', long = "every")]
        every: String,

        #[arg(long = "no-notifications")]
        no_notifications: bool,
    },
    Done {
        id: String,
    },
    Toggle {
        id: String,
    },
    Remove {
        id: String,
    },
    List {
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
    Show {
        id: String,
    },
    Check,
}

fn expand_path(path_str: &str) -> PathBuf {
    if let Some(stripped) = path_str.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path_str)
}

fn add(
    store: &mut EntryStore,
    name: String,
    kind: KindArg,
    animal: Option<AnimalArg>,
    every: &str,
    no_notifications: bool,
) -> Result<(), TendError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(TendError::EmptyName);
    }

    let kind = match (kind, animal) {
        (KindArg::Pet, animal) => Kind::Pet {
            animal: animal.map(AnimalArg::to_animal),
        },
        (KindArg::Plant, None) => Kind::Plant,
        (KindArg::Plant, Some(_)) => return Err(TendError::AnimalForPlant),
    };

    let frequency = timing::parse_frequency(every)?;
    let entry = Entry::new(name, kind, frequency, !no_notifications, timing::now_millis());

    let id = entry.id.clone();
    let name = entry.name.clone();
    store.append(entry)?;
    println!("added {name} ({id})");
    Ok(())
}

fn done(store: &mut EntryStore, id: &str) -> Result<(), TendError> {
    let now = timing::now_millis();
    let mut entry = store.find(id)?.clone();

    if !timing::is_action_allowed(entry.time_to_next_action, now) {
        println!(
            "{} is not due yet ({})",
            entry.name,
            timing::time_remaining_label(entry.frequency, entry.last_done, now),
        );
        return Ok(());
    }

    entry.mark_done(now);
    let name = entry.name.clone();
    store.replace(entry)?;
    println!("{name} has been marked as done!");
    Ok(())
}

fn toggle(store: &mut EntryStore, id: &str) -> Result<(), TendError> {
    let mut entry = store.find(id)?.clone();
    entry.notifications_enabled = !entry.notifications_enabled;

    let name = entry.name.clone();
    let state = if entry.notifications_enabled {
        "on"
    } else {
        "off"
    };
    store.replace(entry)?;
    println!("notifications for {name} are now {state}");
    Ok(())
}

fn remove(store: &mut EntryStore, id: &str) -> Result<(), TendError> {
    let entry_id = store.find(id)?.id.clone();
    let removed = store.remove(&entry_id)?;
    println!("removed {}", removed.name);
    Ok(())
}

fn list(store: &EntryStore, verbose: bool) {
    let now = timing::now_millis();
    for entry in &store.data.entries {
        let short_id = entry.id.get(..8).unwrap_or(&entry.id);
        println!(
            "{}  {}  {}",
            short_id,
            entry.name,
            timing::time_remaining_label(entry.frequency, entry.last_done, now),
        );
        if verbose {
            print_details(entry, now);
        }
    }
}

fn show(store: &EntryStore, id: &str) -> Result<(), TendError> {
    let entry = store.find(id)?;
    println!("{}", entry.name);
    print_details(entry, timing::now_millis());
    Ok(())
}

fn print_details(entry: &Entry, now: i64) {
    println!(
        "\tid: {}\n\tkind: {}\n\tevery: {}\n\tlast done: {}\n\tnext due: {} ({})\n\tnotifications: {}",
        entry.id,
        describe_kind(&entry.kind),
        format_frequency(entry.frequency),
        format_timestamp(entry.last_done),
        format_timestamp(entry.time_to_next_action),
        timing::time_remaining_label(entry.frequency, entry.last_done, now),
        if entry.notifications_enabled { "on" } else { "off" },
    );
}

fn describe_kind(kind: &Kind) -> &'static str {
    match kind {
        Kind::Pet {
            animal: Some(Animal::Dog),
        } => "pet (dog)",
        Kind::Pet {
            animal: Some(Animal::Cat),
        } => "pet (cat)",
        Kind::Pet { animal: None } => "pet",
        Kind::Plant => "plant",
    }
}

fn format_frequency(hours: f64) -> String {
    let total_minutes = (hours * 60.0).round() as i64;
    let days = total_minutes / (24 * 60);
    let hrs = total_minutes % (24 * 60) / 60;
    let mins = total_minutes % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hrs > 0 {
        parts.push(format!("{hrs}h"));
    }
    if mins > 0 {
        parts.push(format!("{mins}m"));
    }
    if parts.is_empty() {
        parts.push("0m".to_string());
    }
    parts.join(" ")
}

fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis) {
        LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        _ => millis.to_string(),
    }
}

fn check() -> Result<(), TendError> {
    let status = reminder::permission_status();
    println!("notification status: {status}");

    let status = match status {
        PermissionStatus::Granted => status,
        _ => reminder::request_permission(),
    };

    match status {
        PermissionStatus::Granted => {
            let mut notifier = DesktopNotifier::new()?;
            notifier.notify(&reminder::test_notification())?;
            println!("Notifications are working! You'll now get reminders for your pets and plants.");
        }
        _ => {
            println!(
                "No notification server is reachable. Without notifications, you won't receive reminders for your pets and plants."
            );
        }
    }
    Ok(())
}

fn start(store: EntryStore) -> Result<(), TendError> {
    let mut notifier = DesktopNotifier::new()?;
    let process = Arc::new(Mutex::new(Process::new(store)));
    info!("started!");
    Process::start(process, &mut notifier);
    Ok(())
}

fn run(args: Args) -> Result<(), TendError> {
    let store_path = expand_path(&args.config);
    if let Err(e) = generate_store(&store_path) {
        eprintln!("error while creating store file: {}", e);
        std::process::exit(1);
    }

    let mut store = EntryStore::open(store_path)?;

    match args.command {
        Commands::Start => start(store)?,
        Commands::Add {
            name,
            kind,
            animal,
            every,
            no_notifications,
        } => add(&mut store, name, kind, animal, &every, no_notifications)?,
        Commands::Done { id } => done(&mut store, &id)?,
        Commands::Toggle { id } => toggle(&mut store, &id)?,
        Commands::Remove { id } => remove(&mut store, &id)?,
        Commands::List { verbose } => list(&store, verbose),
        Commands::Show { id } => show(&store, &id)?,
        Commands::Check => check()?,
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    fn store_in(dir: &TempDir) -> EntryStore {
        let path = dir.path().join("tend.json");
        generate_store(&path).unwrap();
        EntryStore::open(path).unwrap()
    }

    #[test]
    fn add_trims_validates_and_persists() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        add(
            &mut store,
            "  Whiskers  ".to_string(),
            KindArg::Pet,
            Some(AnimalArg::Cat),
            "12h",
            false,
        )
        .unwrap();

        let reopened = EntryStore::open(store.path.clone()).unwrap();
        assert_eq!(reopened.data.entries.len(), 1);
        let entry = &reopened.data.entries[0];
        assert_eq!(entry.name, "Whiskers");
        assert_eq!(entry.frequency, 12.0);
        assert!(entry.notifications_enabled);
        assert_eq!(
            entry.time_to_next_action,
            timing::next_due_millis(12.0, entry.last_done)
        );
    }

    #[test]
    fn add_rejects_blank_names_and_plant_animals() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);

        assert!(matches!(
            add(&mut store, "   ".to_string(), KindArg::Plant, None, "1h", false),
            Err(TendError::EmptyName)
        ));
        assert!(matches!(
            add(
                &mut store,
                "Fern".to_string(),
                KindArg::Plant,
                Some(AnimalArg::Dog),
                "1h",
                false
            ),
            Err(TendError::AnimalForPlant)
        ));
        assert!(store.data.entries.is_empty());
    }

    #[test]
    fn done_is_refused_before_the_due_time() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        add(&mut store, "Fern".to_string(), KindArg::Plant, None, "30d", false).unwrap();
        let before = store.data.entries[0].clone();

        done(&mut store, &before.id).unwrap();
        assert_eq!(store.data.entries[0], before);
    }

    #[test]
    fn done_resets_the_care_clock_once_due() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        add(&mut store, "Fern".to_string(), KindArg::Plant, None, "1h", false).unwrap();

        // backdate so the action is allowed
        let mut entry = store.data.entries[0].clone();
        entry.last_done = 0;
        entry.time_to_next_action = timing::next_due_millis(entry.frequency, 0);
        store.replace(entry.clone()).unwrap();

        done(&mut store, &entry.id).unwrap();
        let updated = &store.data.entries[0];
        assert!(updated.last_done > 0);
        assert_eq!(
            updated.time_to_next_action,
            timing::next_due_millis(updated.frequency, updated.last_done)
        );
    }

    #[test]
    fn toggle_flips_and_persists() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        add(&mut store, "Fern".to_string(), KindArg::Plant, None, "1h", false).unwrap();
        let id = store.data.entries[0].id.clone();

        toggle(&mut store, &id).unwrap();
        let reopened = EntryStore::open(store.path.clone()).unwrap();
        assert!(!reopened.data.entries[0].notifications_enabled);

        toggle(&mut store, &id).unwrap();
        let reopened = EntryStore::open(store.path.clone()).unwrap();
        assert!(reopened.data.entries[0].notifications_enabled);
    }

    #[test]
    fn remove_accepts_a_prefix_and_persists() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        add(&mut store, "Fern".to_string(), KindArg::Plant, None, "1h", false).unwrap();
        let id = store.data.entries[0].id.clone();

        remove(&mut store, &id[..8]).unwrap();
        let reopened = EntryStore::open(store.path.clone()).unwrap();
        assert!(reopened.data.entries.is_empty());
    }

    #[test]
    fn frequency_formats_back_to_units() {
        assert_eq!(format_frequency(26.5), "1d 2h 30m");
        assert_eq!(format_frequency(0.5), "30m");
        assert_eq!(format_frequency(24.0), "1d");
    }
}
