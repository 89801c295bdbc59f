//! Blend modes and the per-pixel compositing kernel.
//!
//! All channel math is integer. Colors are straight alpha; a blended source
//! pixel is combined with the destination using the separable blending model:
//!
//! ```text
//! ao = sa + da·(1 − sa)
//! co = sa·(1 − da)·cs + sa·da·B(cs, cd) + (1 − sa)·da·cd
//! out = co / ao
//! ```
//!
//! Every division rounds half to even.

use common::error::{GfxError, GfxResult};
use common::fixed::{div_round_half_even, Opacity};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX: u32 = 255;

/// Per-channel blend formula `B(src, dst)` over 8-bit straight channel values.
pub type BlendFn = fn(u32, u32) -> u32;

/// Blend mode for compositing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum BlendMode {
    #[default]
    Normal = 0,
    Multiply = 1,
    Screen = 2,
    Overlay = 3,
    Darken = 4,
    Lighten = 5,
    Add = 6,
}

/// Formulas indexed by `BlendMode` discriminant.
const BLEND_TABLE: [BlendFn; 7] = [
    normal, multiply, screen, overlay, darken, lighten, add,
];

impl BlendMode {
    pub const ALL: [BlendMode; 7] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::Add,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::Add => "add",
        }
    }

    #[inline]
    pub fn formula(self) -> BlendFn {
        BLEND_TABLE[self as usize]
    }
}

impl FromStr for BlendMode {
    type Err = GfxError;

    fn from_str(s: &str) -> GfxResult<Self> {
        BlendMode::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| GfxError::UnknownBlendMode(s.to_string()))
    }
}

impl TryFrom<String> for BlendMode {
    type Error = GfxError;

    fn try_from(value: String) -> GfxResult<Self> {
        value.parse()
    }
}

impl From<BlendMode> for &'static str {
    fn from(mode: BlendMode) -> Self {
        mode.name()
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[inline]
fn div255(value: u32) -> u32 {
    div_round_half_even(u64::from(value), u64::from(MAX)) as u32
}

fn normal(src: u32, _dst: u32) -> u32 {
    src
}

fn multiply(src: u32, dst: u32) -> u32 {
    div255(src * dst)
}

fn screen(src: u32, dst: u32) -> u32 {
    MAX - div255((MAX - src) * (MAX - dst))
}

fn overlay(src: u32, dst: u32) -> u32 {
    if 2 * dst < MAX {
        div255(2 * src * dst)
    } else {
        MAX - div255(2 * (MAX - src) * (MAX - dst))
    }
}

fn darken(src: u32, dst: u32) -> u32 {
    src.min(dst)
}

fn lighten(src: u32, dst: u32) -> u32 {
    src.max(dst)
}

fn add(src: u32, dst: u32) -> u32 {
    (src + dst).min(MAX)
}

/// Composite one source pixel onto one destination pixel in place.
///
/// `src` and `dst` are 4-byte RGBA slices. The source alpha is scaled by
/// `opacity` before blending.
#[inline]
pub fn composite_pixel(dst: &mut [u8], src: &[u8], opacity: Opacity, blend: BlendFn) {
    let sa = u64::from(opacity.apply(src[3]));
    if sa == 0 {
        return;
    }
    let max = u64::from(MAX);
    let da = u64::from(dst[3]);
    // Output alpha in units of 1/255².
    let ao = sa * max + da * (max - sa);

    for c in 0..3 {
        let cs = u64::from(src[c]);
        let cd = u64::from(dst[c]);
        let blended = u64::from(blend(u32::from(src[c]), u32::from(dst[c])));
        let co = cs * sa * (max - da) + blended * sa * da + cd * da * (max - sa);
        dst[c] = div_round_half_even(co, ao) as u8;
    }
    dst[3] = div_round_half_even(ao, max) as u8;
}
