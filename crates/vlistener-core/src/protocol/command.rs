//! Command parsing: raw payload text → validated [`Command`].
//!
//! A payload is a single JSON object:
//!
//! ```json
//! { "type": "combination", "key": "t", "modifiers": ["ctrl", "alt"], "password": "..." }
//! ```
//!
//! [`parse_command`] performs every structural check before a [`Command`] is
//! built, so holding a `Command` means the kind is recognised, the key is
//! present, and the modifier count matches the kind.  Authentication is *not*
//! done here; the credential is carried through untouched.
//!
//! # Check order
//!
//! The first failing check wins:
//!
//! | # | Condition                                             | Error                  |
//! |---|-------------------------------------------------------|------------------------|
//! | 1 | not valid JSON                                        | `MalformedPayload`     |
//! | 2 | not an object, or `type`/`key` missing or not strings | `InvalidFormat`        |
//! | 3 | `type` is not a recognised kind                       | `UnsupportedKind`      |
//! | 4 | `modifiers` present but not an array of strings       | `InvalidFormat`        |
//! | 5 | `combination` without modifiers                       | `MissingModifiers`     |
//! | 6 | `trio` without exactly two modifiers                  | `InvalidModifierCount` |

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// Separator placed between modifiers and the key in a combo token.
pub const COMBO_SEPARATOR: &str = "+";

/// Errors produced while turning a payload into a [`Command`].
///
/// The `Display` text of each variant is the exact response string sent back
/// to the client, so these strings are part of the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The payload is not valid JSON.
    #[error("Invalid JSON format")]
    MalformedPayload,

    /// The JSON is structurally wrong (missing `type`/`key`, wrong field types).
    #[error("Invalid command format")]
    InvalidFormat,

    /// `type` names a command kind this server does not understand.
    #[error("Unsupported command type")]
    UnsupportedKind,

    /// A `combination` command arrived without any modifiers.
    #[error("Missing modifiers for key combination")]
    MissingModifiers,

    /// A `trio` command arrived with a modifier count other than two.
    #[error("Trio command requires exactly two modifiers")]
    InvalidModifierCount,
}

/// The four kinds of keyboard action a client can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `"press"` – press then release a single key.
    SinglePress,
    /// `"pressSpecial"` – one combined press-and-release (media keys etc.).
    SpecialPress,
    /// `"combination"` – one or more modifiers plus a key.
    Combination,
    /// `"trio"` – exactly two modifiers plus a key.
    Trio,
}

impl CommandKind {
    /// Maps the wire `type` string to a kind.
    ///
    /// Returns `None` for anything unrecognised.  Matching is case-sensitive.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "press" => Some(Self::SinglePress),
            "pressSpecial" => Some(Self::SpecialPress),
            "combination" => Some(Self::Combination),
            "trio" => Some(Self::Trio),
            _ => None,
        }
    }

    /// The wire `type` string for this kind.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::SinglePress => "press",
            Self::SpecialPress => "pressSpecial",
            Self::Combination => "combination",
            Self::Trio => "trio",
        }
    }

    /// Whether this kind carries a modifier list.
    pub fn uses_modifiers(self) -> bool {
        matches!(self, Self::Combination | Self::Trio)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A validated, immutable request to simulate one keyboard action.
///
/// Only [`parse_command`] constructs this type.  The `Debug` output never
/// includes the credential, so a `Command` is safe to log.
#[derive(Clone, PartialEq, Eq)]
pub struct Command {
    kind: CommandKind,
    key: String,
    modifiers: Vec<String>,
    credential: Option<String>,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Modifiers in the order the client sent them.
    ///
    /// Always empty for `SinglePress` and `SpecialPress`.
    pub fn modifiers(&self) -> &[String] {
        &self.modifiers
    }

    /// The `password` field as sent, or `None` if it was absent or not a string.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Joins the modifiers and the key into a single combo token.
    ///
    /// `["ctrl", "alt"]` + `"t"` → `"ctrl+alt+t"`.  For kinds without
    /// modifiers the token is just the key.
    pub fn combo_token(&self) -> String {
        let mut parts: Vec<&str> = self.modifiers.iter().map(String::as_str).collect();
        parts.push(&self.key);
        parts.join(COMBO_SEPARATOR)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("modifiers", &self.modifiers)
            .field(
                "credential",
                &self.credential.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Parses one payload into a [`Command`].
///
/// The payload should already be trimmed of surrounding whitespace.  This
/// function performs no I/O and no logging.
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered, in the order listed in the
/// module documentation.
///
/// # Example
///
/// ```rust
/// use vlistener_core::{parse_command, CommandKind};
///
/// let cmd = parse_command(r#"{"type":"trio","key":"t","modifiers":["ctrl","alt"],"password":"pw"}"#)
///     .unwrap();
/// assert_eq!(cmd.kind(), CommandKind::Trio);
/// assert_eq!(cmd.combo_token(), "ctrl+alt+t");
/// ```
pub fn parse_command(payload: &str) -> Result<Command, ParseError> {
    let value: Value = serde_json::from_str(payload).map_err(|_| ParseError::MalformedPayload)?;
    let fields = value.as_object().ok_or(ParseError::InvalidFormat)?;

    let kind_name = string_field(fields, "type").ok_or(ParseError::InvalidFormat)?;
    let key = string_field(fields, "key")
        .filter(|k| !k.is_empty())
        .ok_or(ParseError::InvalidFormat)?;

    let kind = CommandKind::from_wire(kind_name).ok_or(ParseError::UnsupportedKind)?;

    let modifiers = if kind.uses_modifiers() {
        let modifiers = modifier_list(fields)?;
        match kind {
            CommandKind::Combination if modifiers.as_ref().map_or(true, Vec::is_empty) => {
                return Err(ParseError::MissingModifiers);
            }
            CommandKind::Trio if modifiers.as_ref().map_or(0, Vec::len) != 2 => {
                return Err(ParseError::InvalidModifierCount);
            }
            _ => modifiers.unwrap_or_default(),
        }
    } else {
        Vec::new()
    };

    Ok(Command {
        kind,
        key: key.to_owned(),
        modifiers,
        credential: string_field(fields, "password").map(str::to_owned),
    })
}

fn string_field<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    fields.get(name).and_then(Value::as_str)
}

/// Extracts `modifiers`: `Ok(None)` when absent or `null`, an error when it is
/// present but not an array of strings.
fn modifier_list(fields: &Map<String, Value>) -> Result<Option<Vec<String>>, ParseError> {
    match fields.get("modifiers") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_owned)
                    .ok_or(ParseError::InvalidFormat)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(ParseError::InvalidFormat),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
