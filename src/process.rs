use notify::{
    Event, EventKind, RecursiveMode, Result as NotifyResult, Watcher,
    event::{AccessKind, AccessMode},
};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time;

use log::{debug, error, info, warn};

use crate::reminder::{Notifier, ReminderDispatcher};
use crate::store::EntryStore;
use crate::timing;

pub struct Process {
    pub store: EntryStore,
    dispatcher: ReminderDispatcher,
    kill_switch: Arc<Mutex<bool>>,
}

enum StoreEvent {
    StoreChanged,
    StoreUnchanged,
}

impl Process {
    pub fn new(store: EntryStore) -> Self {
        let mut dispatcher = ReminderDispatcher::new();
        dispatcher.sync(&store.data.entries);

        Process {
            store,
            dispatcher,
            kill_switch: Arc::new(Mutex::new(false)),
        }
    }

    pub fn start(process: Arc<Mutex<Self>>, notifier: &mut dyn Notifier) {
        let (watcher_tx, watcher_rx) = mpsc::channel::<NotifyResult<Event>>();
        let (store_tx, store_rx) = mpsc::channel::<StoreEvent>();

        // set up file watcher
        let mut watcher = notify::recommended_watcher(watcher_tx).unwrap();

        {
            let proc = process.lock().unwrap();
            watcher
                .watch(&proc.store.path, RecursiveMode::NonRecursive)
                .unwrap();
        }

        // set up thread for file watcher
        let proc_clone = Arc::clone(&process);
        thread::spawn(move || {
            debug!("store watcher thread started");
            loop {
                {
                    let proc = proc_clone.lock().unwrap();
                    let ks = proc.kill_switch.lock().unwrap();
                    if *ks {
                        break;
                    }
                }
                match watcher_rx.recv_timeout(time::Duration::from_secs(1)) {
                    Ok(Ok(event)) => {
                        if let EventKind::Access(AccessKind::Close(AccessMode::Write)) = event.kind
                        {
                            let mut proc = proc_clone.lock().unwrap();
                            info!("store file changed, reloading entries ...");
                            let message = if proc.reload_store() {
                                StoreEvent::StoreChanged
                            } else {
                                StoreEvent::StoreUnchanged
                            };
                            let _ = store_tx.send(message);
                        }
                    }
                    Ok(Err(e)) => warn!("watch error: {:?}", e),
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                    Err(_) => break,
                }
            }

            debug!("store watcher thread terminated");
        });

        info!("reminder loop started");
        'main_loop: loop {
            {
                let proc = process.lock().unwrap();
                let ks = proc.kill_switch.lock().unwrap();
                if *ks {
                    break;
                }
            }

            let pending_len;
            {
                let proc = process.lock().unwrap();
                pending_len = proc.dispatcher.pending_len();
            }

            if pending_len == 0 {
                info!("no pending reminders, waiting until the store changes");
                loop {
                    {
                        let proc = process.lock().unwrap();
                        let ks = proc.kill_switch.lock().unwrap();
                        if *ks {
                            break 'main_loop;
                        }
                    }
                    match store_rx.recv_timeout(time::Duration::from_secs(2)) {
                        Ok(StoreEvent::StoreChanged) => break,
                        Ok(StoreEvent::StoreUnchanged) => {}
                        Err(mpsc::RecvTimeoutError::Timeout) => {}
                        Err(_) => break 'main_loop,
                    }
                }
            }

            // reloads already updated the dispatcher under the lock; drain
            // the signals so the channel never backs up
            while store_rx.try_recv().is_ok() {}

            {
                let mut proc = process.lock().unwrap();
                let now = timing::now_millis();
                proc.dispatcher.fire_due(now, notifier);
            }

            // limit execution
            thread::sleep(time::Duration::from_millis(500));
        }

        info!("reminder loop terminated");
    }

    pub fn terminate(&mut self) {
        let mut ks = self.kill_switch.lock().unwrap();
        *ks = true;
    }

    /// Re-reads the store and rebuilds the pending reminders against the
    /// fresh snapshot: old reminders are cancelled before new ones exist, so
    /// a marked-done entry never keeps a reminder at its stale due time.
    fn reload_store(&mut self) -> bool {
        let old_entries = self.store.data.entries.clone();

        match EntryStore::open(self.store.path.clone()) {
            Ok(store) => self.store = store,
            Err(e) => {
                error!("error while reloading store: {}", e);
                self.terminate();
                return false;
            }
        }

        self.dispatcher.sync(&self.store.data.entries);

        let changed = old_entries != self.store.data.entries;
        if changed {
            info!("entries reloaded");
        }
        changed
    }
}
