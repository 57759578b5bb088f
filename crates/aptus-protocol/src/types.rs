//! Records loaded from the secrets file.
//!
//! These are read once at startup and never change afterwards. The
//! session manager holds them behind an `Arc` and reads them without
//! any locking.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Door
// ---------------------------------------------------------------------------

/// A physical door the portal can unlock.
///
/// `id` is the portal's opaque identifier and is what goes on the wire.
/// `name` is the human-facing key the HTTP front end looks doors up by.
/// Names are expected to be unique, but nothing here enforces it: a
/// duplicate shows up as [`DoorLookup::Ambiguous`] at lookup time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub name: String,
    pub id: String,
}

impl Door {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for Door {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Portal login credentials.
///
/// `Debug` is implemented by hand so the password never ends up in a log
/// line, even when the whole `Secrets` struct is printed with `{:?}`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// Everything the session manager needs from the secrets file.
///
/// The TOML layout keeps the portal's historical table name:
///
/// ```toml
/// [csb-login]
/// username = "tenant"
/// password = "hunter2"
///
/// [[doors]]
/// name = "front-door"
/// id = "123"
/// ```
///
/// `[login]` is accepted as an alias for `[csb-login]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Secrets {
    #[serde(rename = "csb-login", alias = "login")]
    pub credentials: Credentials,
    #[serde(default)]
    pub doors: Vec<Door>,
}

/// Result of looking a door up by its human-facing name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoorLookup<'a> {
    /// No configured door has this name.
    NotFound,
    /// Exactly one door matched.
    Found(&'a Door),
    /// More than one door shares this name. The configuration is broken;
    /// refusing is safer than guessing which door to open.
    Ambiguous(Vec<&'a Door>),
}

impl Secrets {
    pub fn new(credentials: Credentials, doors: Vec<Door>) -> Self {
        Self { credentials, doors }
    }

    /// Finds the door called `name`.
    pub fn lookup(&self, name: &str) -> DoorLookup<'_> {
        let mut matches: Vec<&Door> =
            self.doors.iter().filter(|door| door.name == name).collect();
        match matches.len() {
            0 => DoorLookup::NotFound,
            1 => DoorLookup::Found(matches.remove(0)),
            _ => DoorLookup::Ambiguous(matches),
        }
    }

    /// Names that more than one door is configured under, in the order
    /// they first appear.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut dupes: Vec<&str> = Vec::new();
        for (i, door) in self.doors.iter().enumerate() {
            let seen_before = self.doors[..i].iter().any(|d| d.name == door.name);
            if seen_before && !dupes.contains(&door.name.as_str()) {
                dupes.push(&door.name);
            }
        }
        dupes
    }
}
