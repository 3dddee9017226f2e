use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{SlideReelError, SlideReelResult};

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> SlideReelResult<Self> {
        if den == 0 {
            return Err(SlideReelError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(SlideReelError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Number of whole frames needed to show `secs`, rounding up to the next frame boundary.
    ///
    /// `secs` is first quantized to microseconds so that values such as `3.0` or `0.5 + 2.5`
    /// never round up because of float noise. Never returns less than one frame.
    pub fn secs_to_frames_ceil(self, secs: f64) -> u64 {
        if !secs.is_finite() || secs <= 0.0 {
            return 1;
        }
        let micros = (secs * 1_000_000.0).round() as u128;
        let num = micros * u128::from(self.num);
        let den = 1_000_000u128 * u128::from(self.den);
        (num.div_ceil(den) as u64).max(1)
    }
}

impl fmt::Display for Fps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// Output frame size in pixels, written as `WxH`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Text area left after removing `margin` pixels on every side.
    pub fn canvas(self, margin: u32) -> Canvas {
        let w = self.width.saturating_sub(margin.saturating_mul(2));
        let h = self.height.saturating_sub(margin.saturating_mul(2));
        Canvas {
            x: margin as f32,
            y: margin as f32,
            width: w as f32,
            height: h as f32,
        }
    }
}

impl FromStr for Resolution {
    type Err = SlideReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| SlideReelError::validation(format!("resolution '{s}' is not WxH")))?;
        let parse = |v: &str| {
            v.trim().parse::<u32>().map_err(|_| {
                SlideReelError::validation(format!("resolution '{s}' has a non-integer side"))
            })
        };
        Ok(Self::new(parse(w)?, parse(h)?))
    }
}

impl TryFrom<String> for Resolution {
    type Error = SlideReelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Renderable rectangle for slide text, in output pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Canvas {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Usable width.
    pub width: f32,
    /// Usable height.
    pub height: f32,
}

impl Canvas {
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Straight-alpha RGBA8 color.
///
/// Parses `#RRGGBB`, `#RRGGBBAA` and a small set of CSS color names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    pub const WHITE: Self = Self::opaque(255, 255, 255);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Hex form understood by both this parser and ffmpeg (`0xRRGGBBAA` style is not used).
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }

    fn named(name: &str) -> Option<Self> {
        let c = match name {
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "red" => Self::opaque(255, 0, 0),
            "green" => Self::opaque(0, 128, 0),
            "blue" => Self::opaque(0, 0, 255),
            "yellow" => Self::opaque(255, 255, 0),
            "gray" | "grey" => Self::opaque(128, 128, 128),
            "darkgray" | "darkgrey" => Self::opaque(169, 169, 169),
            "navy" => Self::opaque(0, 0, 128),
            "orange" => Self::opaque(255, 165, 0),
            _ => return None,
        };
        Some(c)
    }
}

impl FromStr for Rgba8 {
    type Err = SlideReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(c) = Self::named(&s.to_ascii_lowercase()) {
            return Ok(c);
        }
        let hex = s.strip_prefix('#').unwrap_or(s);
        let byte = |pair: &str| {
            u8::from_str_radix(pair, 16).map_err(|_| {
                SlideReelError::validation(format!("invalid hex byte \"{pair}\" in color '{s}'"))
            })
        };
        if !hex.is_ascii() {
            return Err(SlideReelError::validation(format!("unknown color '{s}'")));
        }
        match hex.len() {
            6 => Ok(Self::opaque(
                byte(&hex[0..2])?,
                byte(&hex[2..4])?,
                byte(&hex[4..6])?,
            )),
            8 => Ok(Self {
                r: byte(&hex[0..2])?,
                g: byte(&hex[2..4])?,
                b: byte(&hex[4..6])?,
                a: byte(&hex[6..8])?,
            }),
            _ => Err(SlideReelError::validation(format!(
                "unknown color '{s}' (expected a name, #RRGGBB or #RRGGBBAA)"
            ))),
        }
    }
}

impl TryFrom<String> for Rgba8 {
    type Error = SlideReelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba8> for String {
    fn from(value: Rgba8) -> Self {
        value.to_hex()
    }
}

/// Audio stream format of one segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AudioDescriptor {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Codec name as reported by `ffprobe` (`aac`, `pcm_s16le`, ...).
    pub codec: String,
}

impl AudioDescriptor {
    /// Canonical stream format used when no other is configured: 48 kHz stereo AAC.
    pub fn canonical_default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            codec: "aac".to_owned(),
        }
    }

    /// `ffmpeg` channel layout name for this channel count, when there is one.
    pub fn known_channel_layout(&self) -> Option<&'static str> {
        let layout = match self.channels {
            1 => "mono",
            2 => "stereo",
            3 => "2.1",
            4 => "quad",
            5 => "5.0",
            6 => "5.1",
            7 => "6.1",
            8 => "7.1",
            _ => return None,
        };
        Some(layout)
    }

    /// Layout used in filter graphs. Validated configs always have a known layout.
    pub fn channel_layout(&self) -> &'static str {
        self.known_channel_layout().unwrap_or("stereo")
    }

    /// First field that differs from `other`, for diagnostics.
    pub fn first_mismatch(&self, other: &Self) -> Option<&'static str> {
        if self.sample_rate != other.sample_rate {
            Some("sample_rate")
        } else if self.channels != other.channels {
            Some("channels")
        } else if self.codec != other.codec {
            Some("codec")
        } else {
            None
        }
    }
}

impl fmt::Display for AudioDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} Hz x{}", self.codec, self.sample_rate, self.channels)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
