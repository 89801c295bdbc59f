//! Alignment tokens and their exact anchor fractions.
//!
//! A token is one character applied to both axes (`"c"`) or two characters,
//! x then y (`"se"`), drawn from `s` (start, 0), `c` (center, 1/2) and
//! `e` (end, 1).

use common::error::{GfxError, GfxResult};
use common::fixed::Fraction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Alignment along a single axis. Deserializes from the full name or the
/// single-letter code, like [`FromStr`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisAlign {
    #[default]
    #[serde(alias = "s")]
    Start,
    #[serde(alias = "c")]
    Center,
    #[serde(alias = "e")]
    End,
}

impl AxisAlign {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            's' => Some(AxisAlign::Start),
            'c' => Some(AxisAlign::Center),
            'e' => Some(AxisAlign::End),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            AxisAlign::Start => 's',
            AxisAlign::Center => 'c',
            AxisAlign::End => 'e',
        }
    }

    /// Position of the anchor point as an exact fraction of the extent.
    pub fn fraction(self) -> Fraction {
        match self {
            AxisAlign::Start => Fraction::ZERO,
            AxisAlign::Center => Fraction::HALF,
            AxisAlign::End => Fraction::ONE,
        }
    }
}

/// Accepts both the single-letter codes and the full names.
impl FromStr for AxisAlign {
    type Err = GfxError;

    fn from_str(s: &str) -> GfxResult<Self> {
        match s {
            "s" | "start" => Ok(AxisAlign::Start),
            "c" | "center" => Ok(AxisAlign::Center),
            "e" | "end" => Ok(AxisAlign::End),
            _ => Err(GfxError::InvalidAlignmentToken(s.to_string())),
        }
    }
}

/// A two-axis alignment parsed from a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Alignment {
    pub x: AxisAlign,
    pub y: AxisAlign,
}

impl Alignment {
    pub const START: Alignment = Alignment::uniform(AxisAlign::Start);
    pub const CENTER: Alignment = Alignment::uniform(AxisAlign::Center);
    pub const END: Alignment = Alignment::uniform(AxisAlign::End);

    #[inline]
    pub const fn new(x: AxisAlign, y: AxisAlign) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn uniform(axis: AxisAlign) -> Self {
        Self { x: axis, y: axis }
    }

    pub fn parse(token: &str) -> GfxResult<Self> {
        let invalid = || GfxError::InvalidAlignmentToken(token.to_string());
        let mut chars = token.chars();
        let x = chars.next().and_then(AxisAlign::from_code).ok_or_else(invalid)?;
        let y = match chars.next() {
            None => x,
            Some(code) => AxisAlign::from_code(code).ok_or_else(invalid)?,
        };
        if chars.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { x, y })
    }

    /// `(fx, fy)` anchor fractions.
    #[inline]
    pub fn fractions(&self) -> (Fraction, Fraction) {
        (self.x.fraction(), self.y.fraction())
    }
}

/// Resolve a token straight to its `(fx, fy)` fractions.
pub fn resolve(token: &str) -> GfxResult<(Fraction, Fraction)> {
    Ok(Alignment::parse(token)?.fractions())
}

/// Split a combined `"<self>,<parent>"` (or `"<self>@<parent>"`) string into
/// the self and parent alignments.
pub fn parse_pair(spec: &str) -> GfxResult<(Alignment, Alignment)> {
    let (self_token, parent_token) = spec
        .split_once([',', '@'])
        .ok_or_else(|| GfxError::InvalidAlignmentToken(spec.to_string()))?;
    let self_align = Alignment::parse(self_token.trim())?;
    let parent_align = Alignment::parse(parent_token.trim())?;
    Ok((self_align, parent_align))
}

impl FromStr for Alignment {
    type Err = GfxError;

    fn from_str(s: &str) -> GfxResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Alignment {
    type Error = GfxError;

    fn try_from(value: String) -> GfxResult<Self> {
        Self::parse(&value)
    }
}

impl From<Alignment> for String {
    fn from(align: Alignment) -> Self {
        align.to_string()
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.x == self.y {
            write!(f, "{}", self.x.code())
        } else {
            write!(f, "{}{}", self.x.code(), self.y.code())
        }
    }
}
