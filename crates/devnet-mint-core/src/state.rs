use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::domain::LogEntry;

/// Everything the page renders: the connection flag and the activity log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub connected: bool,
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Connected { address: String },
    Disconnected,
    Log(String),
}

/// Pure transition. Every action appends exactly one line; only the
/// connect/disconnect actions touch the flag.
pub fn reduce(state: AppState, action: AppAction) -> AppState {
    let AppState {
        mut connected,
        mut logs,
    } = state;
    let line = match action {
        AppAction::Connected { address } => {
            connected = true;
            format!("Connected to wallet {address}")
        }
        AppAction::Disconnected => {
            connected = false;
            "Disconnected from wallet".to_owned()
        }
        AppAction::Log(line) => line,
    };
    logs.push(LogEntry(line));
    AppState { connected, logs }
}

/// Shared handle to the page state. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    inner: Arc<Mutex<AppState>>,
}

impl StateStore {
    pub fn new(initial: AppState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn dispatch(&self, action: AppAction) {
        let mut guard = self.lock();
        let current = std::mem::take(&mut *guard);
        *guard = reduce(current, action);
    }

    pub fn log(&self, line: impl Into<String>) {
        self.dispatch(AppAction::Log(line.into()));
    }

    pub fn snapshot(&self) -> AppState {
        self.lock().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        // reduce does not panic, so a poisoned guard still holds a whole state.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
