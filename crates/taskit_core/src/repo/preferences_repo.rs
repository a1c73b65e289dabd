//! Appearance preference storage.
//!
//! Kept apart from task data: the `preferences` table is a plain key/value
//! map and never participates in the live task snapshot.

use crate::repo::RepoResult;
use log::info;
use rusqlite::{Connection, OptionalExtension};

const DARK_THEME_KEY: &str = "dark_theme";

/// Resolved theme choice. `System` means no stored preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemePreference {
    System,
    Light,
    Dark,
}

impl ThemePreference {
    pub fn from_stored(dark_theme: Option<bool>) -> Self {
        match dark_theme {
            None => Self::System,
            Some(false) => Self::Light,
            Some(true) => Self::Dark,
        }
    }

    /// Whether to render dark, given what the platform currently uses.
    pub fn is_dark(self, system_is_dark: bool) -> bool {
        match self {
            Self::System => system_is_dark,
            Self::Light => false,
            Self::Dark => true,
        }
    }
}

pub trait PreferencesRepository {
    /// `None` when the user never chose a theme.
    fn dark_theme(&self) -> RepoResult<Option<bool>>;
    fn set_dark_theme(&self, enabled: bool) -> RepoResult<()>;
    /// Returns to following the system theme.
    fn clear_dark_theme(&self) -> RepoResult<()>;

    fn theme(&self) -> RepoResult<ThemePreference> {
        Ok(ThemePreference::from_stored(self.dark_theme()?))
    }
}

pub struct SqlitePreferencesRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePreferencesRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PreferencesRepository for SqlitePreferencesRepository<'_> {
    fn dark_theme(&self) -> RepoResult<Option<bool>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1;",
                [DARK_THEME_KEY],
                |row| row.get(0),
            )
            .optional()?;
        // Unknown values fall back to the system theme.
        Ok(value.and_then(|value| match value.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }))
    }

    fn set_dark_theme(&self, enabled: bool) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            [DARK_THEME_KEY, if enabled { "true" } else { "false" }],
        )?;
        info!("event=preference_write module=repo status=ok key={DARK_THEME_KEY} value={enabled}");
        Ok(())
    }

    fn clear_dark_theme(&self) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM preferences WHERE key = ?1;", [DARK_THEME_KEY])?;
        info!("event=preference_write module=repo status=ok key={DARK_THEME_KEY} value=unset");
        Ok(())
    }
}
