#![forbid(unsafe_code)]

//! JSON host-input parser.
//!
//! A JS shell reports what happened on the page as small JSON objects keyed
//! by `kind`; [`parse_host_input`] turns one of them into a [`HostInput`].
//! Kinds without a mapping (and keys the tab strip does not handle) return
//! `Ok(None)` so shells can forward everything without filtering.
//!
//! | kind          | fields                                   |
//! |---------------|------------------------------------------|
//! | `activate`    | `id`                                     |
//! | `fragment`    | `value`                                  |
//! | `scroll`      | `offset`                                 |
//! | `scroll_end`  |                                          |
//! | `resize`      | `width`, `height`                        |
//! | `layout`      |                                          |
//! | `wake`        | `token`                                  |
//! | `key`         | `key` (DOM `KeyboardEvent.key`)          |
//! | `visibility`  | `entries: [{id, ratio, top, bottom}]`    |
//! | `section`     | `id`, `top`                              |
//! | `tab`         | `id`, `left`, `width`, `strip_left`      |
//! | `tab_detached`| `id`                                     |
//! | `unsupported` |                                          |

use secnav_core::{
    NavEvent, NavKey, SectionId, TabBounds, TimerToken, VisibilityBatch, VisibilityMetric,
};
use serde::Deserialize;

use crate::HostCommand;
use crate::step::HostInput;

/// Errors from parsing host-input JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostInputError {
    /// Malformed JSON.
    Json(String),
    /// Missing required field.
    MissingField(&'static str),
    /// A numeric field was NaN or infinite.
    NotFinite(&'static str),
}

impl core::fmt::Display for HostInputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "JSON parse error: {msg}"),
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::NotFinite(field) => write!(f, "field is not a finite number: {field}"),
        }
    }
}

impl std::error::Error for HostInputError {}

#[derive(Debug, Deserialize)]
struct RawInput {
    kind: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    offset: Option<f64>,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    token: Option<u64>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    entries: Option<Vec<RawEntry>>,
    #[serde(default)]
    top: Option<f64>,
    #[serde(default)]
    left: Option<f64>,
    #[serde(default)]
    strip_left: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    id: String,
    #[serde(default)]
    ratio: f64,
    top: f64,
    bottom: f64,
}

/// Parse one JSON-encoded host input.
///
/// Returns `Ok(None)` for unknown kinds and unhandled keys, `Err` for
/// malformed JSON or missing fields.
pub fn parse_host_input(json: &str) -> Result<Option<HostInput>, HostInputError> {
    let raw: RawInput =
        serde_json::from_str(json).map_err(|e| HostInputError::Json(e.to_string()))?;

    let input = match raw.kind.as_str() {
        "activate" => HostInput::Event(NavEvent::Activate(SectionId::new(required(
            raw.id, "id",
        )?))),
        // An absent hash arrives as an empty value.
        "fragment" => HostInput::Event(NavEvent::FragmentChanged(raw.value.unwrap_or_default())),
        "scroll" => HostInput::Event(NavEvent::Scrolled {
            offset: finite(raw.offset, "offset")?,
        }),
        "scroll_end" => HostInput::Event(NavEvent::ScrollEnd),
        "resize" => HostInput::Event(NavEvent::Resize {
            width: finite(raw.width, "width")?,
            height: finite(raw.height, "height")?,
        }),
        "layout" => HostInput::Event(NavEvent::LayoutChanged),
        "section_detached" => HostInput::Event(NavEvent::SectionDetached(SectionId::new(
            required(raw.id, "id")?,
        ))),
        "wake" => HostInput::Event(NavEvent::Wake(TimerToken(required(raw.token, "token")?))),
        "key" => {
            let key = required(raw.key, "key")?;
            match NavKey::from_dom_key(&key) {
                Some(nav_key) => HostInput::Event(NavEvent::Key(nav_key)),
                None => return Ok(None),
            }
        }
        "visibility" => {
            let entries = required(raw.entries, "entries")?;
            let mut metrics = Vec::with_capacity(entries.len());
            for entry in entries {
                if !entry.top.is_finite() || !entry.bottom.is_finite() {
                    return Err(HostInputError::NotFinite("top"));
                }
                metrics.push(VisibilityMetric::new(
                    entry.id,
                    entry.ratio,
                    entry.top,
                    entry.bottom,
                ));
            }
            HostInput::Visibility(VisibilityBatch::new(metrics))
        }
        "section" => HostInput::SectionTop {
            id: required(raw.id, "id")?,
            top: finite(raw.top, "top")?,
        },
        "tab" => HostInput::Tab {
            id: required(raw.id, "id")?,
            bounds: TabBounds {
                left: finite(raw.left, "left")?,
                width: finite(raw.width, "width")?,
                strip_left: finite(raw.strip_left.or(Some(0.0)), "strip_left")?,
            },
        },
        "tab_detached" => HostInput::TabDetached {
            id: required(raw.id, "id")?,
        },
        "unsupported" => HostInput::ObserverUnsupported,
        _ => return Ok(None),
    };
    Ok(Some(input))
}

/// Serialize drained commands for the shell.
pub fn commands_to_json(commands: &[HostCommand]) -> Result<String, HostInputError> {
    serde_json::to_string(commands).map_err(|e| HostInputError::Json(e.to_string()))
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, HostInputError> {
    value.ok_or(HostInputError::MissingField(field))
}

fn finite(value: Option<f64>, field: &'static str) -> Result<f64, HostInputError> {
    let v = required(value, field)?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(HostInputError::NotFinite(field))
    }
}
