use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use super::SessionError;

/// Durable key/value storage for the session (the console's local storage)
pub trait SessionStore: Send {
    fn load(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn save(&mut self, key: &str, value: &str) -> Result<(), SessionError>;
    fn remove(&mut self, key: &str) -> Result<(), SessionError>;
}

/// One `<key>.json` file per key inside a config directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory from `CONSOLE_CONFIG_DIR`, else `$HOME/.config/admin-console`
    pub fn from_config(config: &crate::config::SessionConfig) -> Result<Self, SessionError> {
        let dir = match &config.config_dir {
            Some(dir) => dir.clone(),
            None => {
                let home = std::env::var("HOME").map_err(|_| {
                    SessionError::Unavailable("HOME environment variable not set".to_string())
                })?;
                PathBuf::from(home).join(".config").join("admin-console")
            }
        };
        Ok(Self::new(dir))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SessionStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, SessionError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SessionError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl SessionStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SessionError> {
        self.entries.remove(key);
        Ok(())
    }
}
