use crate::model::{Appointment, Language, User};
use crate::storage::{ChangeStream, StorageError, StoreContext};
use log::warn;

pub const APPOINTMENTS_KEY: &str = "mediq_appointments";
pub const LANGUAGE_KEY: &str = "mediq_lang";
pub const SESSION_USER_KEY: &str = "mediq_user";

pub struct StorageBridge {
    context: StoreContext,
}

impl StorageBridge {
    pub fn new(context: StoreContext) -> Self {
        Self { context }
    }

    pub fn subscribe(&self) -> ChangeStream {
        self.context.subscribe()
    }

    pub fn load_appointments(&self) -> Result<Vec<Appointment>, StorageError> {
        match self.context.get(APPOINTMENTS_KEY) {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Malformed {
                key: APPOINTMENTS_KEY.to_string(),
                source,
            }),
        }
    }

    pub fn save_appointments(&self, appointments: &[Appointment]) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string(appointments).map_err(|source| StorageError::Malformed {
                key: APPOINTMENTS_KEY.to_string(),
                source,
            })?;
        self.context.set(APPOINTMENTS_KEY, raw)
    }

    pub fn load_language(&self) -> Language {
        match self.context.get(LANGUAGE_KEY) {
            None => Language::default(),
            Some(raw) => Language::from_name(&raw).unwrap_or_else(|| {
                warn!("unknown stored language preference {raw:?}, falling back to default");
                Language::default()
            }),
        }
    }

    pub fn save_language(&self, language: Language) -> Result<(), StorageError> {
        self.context.set(LANGUAGE_KEY, language.as_str())
    }

    pub fn load_session(&self) -> Result<Option<User>, StorageError> {
        match self.context.session_get(SESSION_USER_KEY) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StorageError::Malformed {
                    key: SESSION_USER_KEY.to_string(),
                    source,
                }),
        }
    }

    pub fn save_session(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => self.context.session_set(SESSION_USER_KEY, raw),
            Err(err) => warn!("failed to encode session user: {err}"),
        }
    }

    pub fn clear_session(&self) {
        self.context.session_remove(SESSION_USER_KEY);
    }
}
