//! EXIF orientation codes
//!
//! Orientation arrives from camera metadata, from older imports as free text, and
//! sometimes not at all. Everything funnels through [`Orientation`], which only
//! ever holds a value in 1..=8 (1 = no transform).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::LazyLock;

static FIRST_INTEGER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d+").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", from = "i32")]
pub struct Orientation(u8);

impl Orientation {
    pub const NORMAL: Orientation = Orientation(1);

    /// Normalize a numeric code; anything outside 1..=8 becomes 1.
    pub fn from_code(code: i64) -> Self {
        match code {
            1..=8 => Orientation(code as u8),
            _ => Self::NORMAL,
        }
    }

    /// Normalize a textual orientation.
    ///
    /// Purely numeric text uses its first embedded integer. Descriptive text
    /// ("Rotate 90 CW", "Mirror horizontal", "Rotated 180") is matched by keyword.
    pub fn parse_str(raw: &str) -> Self {
        let text = raw.trim().to_lowercase();
        if text.is_empty() {
            return Self::NORMAL;
        }

        if text.chars().any(|c| c.is_ascii_alphabetic()) {
            if let Some(o) = Self::from_keywords(&text) {
                return o;
            }
        }

        first_integer(&text)
            .map(Self::from_code)
            .unwrap_or(Self::NORMAL)
    }

    /// Normalize an arbitrary metadata value (number, string, or anything else).
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(Self::from_code)
                .unwrap_or(Self::NORMAL),
            serde_json::Value::String(s) => Self::parse_str(s),
            _ => Self::NORMAL,
        }
    }

    fn from_keywords(text: &str) -> Option<Self> {
        let flip = text.contains("flip") || text.contains("mirror");
        let vertical = text.contains("vertical");
        let ccw = text.contains("ccw") || text.contains("counter");
        let has_270 = text.contains("270");
        let has_180 = text.contains("180");
        let has_90 = text.contains("90") && !has_270;

        if text.contains("normal") || text.contains("top-left") || text == "none" {
            return Some(Self::NORMAL);
        }
        if has_180 {
            return Some(Orientation(if flip { 4 } else { 3 }));
        }
        if (has_90 && ccw) || (has_270 && !ccw) {
            return Some(Orientation(if flip { 5 } else { 8 }));
        }
        if has_90 || (has_270 && ccw) {
            return Some(Orientation(if flip { 7 } else { 6 }));
        }
        if flip {
            return Some(Orientation(if vertical { 4 } else { 2 }));
        }
        None
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn is_normal(&self) -> bool {
        self.0 == 1
    }

    /// Pixel operations that turn a stored image upright: (clockwise rotation, flip horizontal, flip vertical).
    ///
    /// Rotation is applied before flips.
    pub fn transforms(&self) -> (Option<u16>, bool, bool) {
        match self.0 {
            2 => (None, true, false),
            3 => (Some(180), false, false),
            4 => (None, false, true),
            5 => (Some(90), true, false),
            6 => (Some(90), false, false),
            7 => (Some(270), true, false),
            8 => (Some(270), false, false),
            _ => (None, false, false),
        }
    }
}

fn first_integer(text: &str) -> Option<i64> {
    let re = FIRST_INTEGER.as_ref()?;
    re.find(text).map(|m| m.as_str().parse::<i64>().unwrap_or(0))
}

impl Default for Orientation {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Orientation {
    fn from(code: i32) -> Self {
        Self::from_code(i64::from(code))
    }
}

impl From<Orientation> for i32 {
    fn from(o: Orientation) -> Self {
        i32::from(o.0)
    }
}

impl From<Option<&serde_json::Value>> for Orientation {
    fn from(value: Option<&serde_json::Value>) -> Self {
        value.map(Self::from_json).unwrap_or_default()
    }
}
