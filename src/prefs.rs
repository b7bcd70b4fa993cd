//! Local key-value preferences: session identity and display settings.
//!
//! All keys live in one flat JSON object written to
//! `<dir>/medassist_prefs.json`. Every setter writes through.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::models::Session;

pub const PREFS_FILE: &str = "medassist_prefs.json";

const KEY_IS_LOGGED_IN: &str = "is_logged_in";
const KEY_USER_NAME: &str = "user_name";
const KEY_USER_EMAIL: &str = "user_email";
const KEY_DARK_THEME: &str = "dark_theme";
const KEY_NOTIFICATIONS_ENABLED: &str = "notifications_enabled";
const KEY_LANGUAGE: &str = "language";
const KEY_PUSH_TOKEN: &str = "push_token";

pub const DEFAULT_USER_NAME: &str = "Guest";
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("preferences file error: {0}")]
    Io(#[from] io::Error),
    #[error("preferences file is corrupt: {0}")]
    Parse(#[from] serde_json::Error),
}

pub struct PreferenceStore {
    path: Option<PathBuf>,
    values: Mutex<Map<String, Value>>,
}

impl PreferenceStore {
    /// Opens the store in `dir`. A missing file is an empty store.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PrefsError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(PREFS_FILE);
        let values = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("preferences loaded from {}", path.display());
        Ok(PreferenceStore { path: Some(path), values: Mutex::new(values) })
    }

    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        PreferenceStore { path: None, values: Mutex::new(Map::new()) }
    }

    fn update(&self, edit: impl FnOnce(&mut Map<String, Value>)) -> Result<(), PrefsError> {
        let mut values = self.values.lock();
        let mut next = values.clone();
        edit(&mut next);
        if let Some(path) = &self.path {
            fs::write(path, serde_json::to_vec_pretty(&next)?)?;
        }
        *values = next;
        Ok(())
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values.lock().get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        self.values
            .lock()
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    fn put(&self, key: &str, value: Value) -> Result<(), PrefsError> {
        self.update(|values| {
            values.insert(key.to_string(), value);
        })
    }

    pub fn set_user_logged_in(&self, logged_in: bool) -> Result<(), PrefsError> {
        self.put(KEY_IS_LOGGED_IN, Value::Bool(logged_in))
    }

    pub fn is_user_logged_in(&self) -> bool {
        self.get_bool(KEY_IS_LOGGED_IN, false)
    }

    /// Clears the session identity. Display settings stay as they are.
    pub fn logout(&self) -> Result<(), PrefsError> {
        self.update(|values| {
            values.insert(KEY_IS_LOGGED_IN.to_string(), Value::Bool(false));
            values.remove(KEY_USER_NAME);
            values.remove(KEY_USER_EMAIL);
        })
    }

    pub fn set_user_name(&self, name: &str) -> Result<(), PrefsError> {
        self.put(KEY_USER_NAME, Value::String(name.to_string()))
    }

    pub fn user_name(&self) -> String {
        self.get_string(KEY_USER_NAME, DEFAULT_USER_NAME)
    }

    pub fn set_user_email(&self, email: &str) -> Result<(), PrefsError> {
        self.put(KEY_USER_EMAIL, Value::String(email.to_string()))
    }

    pub fn user_email(&self) -> String {
        self.get_string(KEY_USER_EMAIL, "")
    }

    /// Writes the whole session in one file update.
    pub fn save_session(&self, session: &Session) -> Result<(), PrefsError> {
        self.update(|values| {
            values.insert(KEY_IS_LOGGED_IN.to_string(), Value::Bool(session.is_logged_in));
            values.insert(KEY_USER_NAME.to_string(), Value::String(session.user_name.clone()));
            values.insert(KEY_USER_EMAIL.to_string(), Value::String(session.user_email.clone()));
        })
    }

    pub fn session(&self) -> Session {
        Session {
            is_logged_in: self.is_user_logged_in(),
            user_name: self.user_name(),
            user_email: self.user_email(),
        }
    }

    pub fn set_dark_theme_enabled(&self, enabled: bool) -> Result<(), PrefsError> {
        self.put(KEY_DARK_THEME, Value::Bool(enabled))
    }

    pub fn is_dark_theme_enabled(&self) -> bool {
        self.get_bool(KEY_DARK_THEME, false)
    }

    pub fn set_notifications_enabled(&self, enabled: bool) -> Result<(), PrefsError> {
        self.put(KEY_NOTIFICATIONS_ENABLED, Value::Bool(enabled))
    }

    pub fn are_notifications_enabled(&self) -> bool {
        self.get_bool(KEY_NOTIFICATIONS_ENABLED, true)
    }

    pub fn set_language(&self, language: &str) -> Result<(), PrefsError> {
        self.put(KEY_LANGUAGE, Value::String(language.to_string()))
    }

    pub fn language(&self) -> String {
        self.get_string(KEY_LANGUAGE, DEFAULT_LANGUAGE)
    }

    pub fn set_push_token(&self, token: &str) -> Result<(), PrefsError> {
        self.put(KEY_PUSH_TOKEN, Value::String(token.to_string()))
    }

    pub fn push_token(&self) -> Option<String> {
        self.values.lock().get(KEY_PUSH_TOKEN).and_then(Value::as_str).map(str::to_string)
    }
}
