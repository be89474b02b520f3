use std::str::FromStr;

use crate::DomainError;

pub const PASSPORT_DPI: u32 = 300;
pub const MAX_PASSPORT_DPI: u32 = 1200;
const MM_PER_INCH: f64 = 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassportSize {
    pub name: &'static str,
    pub width_mm: u32,
    pub height_mm: u32,
    pub label: &'static str,
}

pub const PASSPORT_SIZES: [PassportSize; 4] = [
    PassportSize {
        name: "US_PASSPORT",
        width_mm: 51,
        height_mm: 51,
        label: "2 x 2 inch (US Passport)",
    },
    PassportSize {
        name: "UK_PASSPORT",
        width_mm: 35,
        height_mm: 45,
        label: "35 x 45 mm (UK/EU/Visa)",
    },
    PassportSize {
        name: "IN_PASSPORT",
        width_mm: 35,
        height_mm: 35,
        label: "35 x 35 mm (India)",
    },
    PassportSize {
        name: "CN_PASSPORT",
        width_mm: 33,
        height_mm: 48,
        label: "33 x 48 mm (China)",
    },
];

impl PassportSize {
    /// Accepts the preset name (`UK_PASSPORT`) or its country code (`uk`).
    pub fn find(value: &str) -> Result<Self, DomainError> {
        let wanted = value.trim().to_ascii_uppercase();
        PASSPORT_SIZES
            .into_iter()
            .find(|size| {
                size.name == wanted
                    || size
                        .name
                        .split_once('_')
                        .is_some_and(|(code, _)| code == wanted)
            })
            .ok_or_else(|| DomainError::UnknownPreset {
                kind: "passport size",
                value: value.to_string(),
            })
    }

    pub fn pixel_dimensions(self, dpi: u32) -> (u32, u32) {
        (mm_to_px(self.width_mm, dpi), mm_to_px(self.height_mm, dpi))
    }
}

fn mm_to_px(mm: u32, dpi: u32) -> u32 {
    ((f64::from(mm) / MM_PER_INCH * f64::from(dpi)).round() as u32).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BgColor {
    pub name: &'static str,
    pub value: &'static str,
}

pub const BG_COLORS: [BgColor; 6] = [
    BgColor {
        name: "White",
        value: "#FFFFFF",
    },
    BgColor {
        name: "Off White",
        value: "#F5F5F5",
    },
    BgColor {
        name: "Studio Blue",
        value: "#1E40AF",
    },
    BgColor {
        name: "Light Blue",
        value: "#BFDBFE",
    },
    BgColor {
        name: "Formal Grey",
        value: "#9CA3AF",
    },
    BgColor {
        name: "Light Red",
        value: "#FEE2E2",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([255, 255, 255]);

    /// Resolves a preset name (case and spacing insensitive) or a `#RRGGBB` value.
    pub fn resolve(value: &str) -> Result<Self, DomainError> {
        let normalized: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        if let Some(preset) = BG_COLORS.iter().find(|color| {
            color.name.replace(' ', "").to_ascii_lowercase() == normalized
        }) {
            return preset.value.parse();
        }
        value.parse()
    }
}

impl FromStr for Rgb {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let hex = value
            .trim()
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.is_ascii())
            .ok_or_else(|| DomainError::InvalidColor(value.to_string()))?;
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| DomainError::InvalidColor(value.to_string()))
        };
        Ok(Self([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropRatio {
    Square,
    Portrait4x5,
    Widescreen16x9,
    Free,
}

impl CropRatio {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Square => Some(1.0),
            Self::Portrait4x5 => Some(4.0 / 5.0),
            Self::Widescreen16x9 => Some(16.0 / 9.0),
            Self::Free => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Square => "Square",
            Self::Portrait4x5 => "4:5 (Insta)",
            Self::Widescreen16x9 => "16:9",
            Self::Free => "Free",
        }
    }
}

impl FromStr for CropRatio {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "square" | "1:1" => Ok(Self::Square),
            "4:5" | "insta" => Ok(Self::Portrait4x5),
            "16:9" => Ok(Self::Widescreen16x9),
            "free" => Ok(Self::Free),
            _ => Err(DomainError::UnknownPreset {
                kind: "crop ratio",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest rectangle of the given ratio centered in a `width x height` frame.
pub fn center_crop(width: u32, height: u32, ratio: CropRatio) -> CropRect {
    let full = CropRect {
        x: 0,
        y: 0,
        width,
        height,
    };
    let Some(ratio) = ratio.value() else {
        return full;
    };
    if width == 0 || height == 0 {
        return full;
    }

    let frame_ratio = f64::from(width) / f64::from(height);
    let (crop_w, crop_h) = if frame_ratio > ratio {
        (((f64::from(height) * ratio).round() as u32).clamp(1, width), height)
    } else {
        (width, ((f64::from(width) / ratio).round() as u32).clamp(1, height))
    };
    CropRect {
        x: (width - crop_w) / 2,
        y: (height - crop_h) / 2,
        width: crop_w,
        height: crop_h,
    }
}

/// Where a cutout lands on a passport canvas: scaled to 110% of the canvas
/// height, centered horizontally, top edge at 10% of the height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

pub fn passport_placement(
    canvas_width: u32,
    canvas_height: u32,
    subject_width: u32,
    subject_height: u32,
) -> Placement {
    let aspect = f64::from(subject_width) / f64::from(subject_height.max(1));
    let draw_h = f64::from(canvas_height) * 1.1;
    let draw_w = draw_h * aspect;
    Placement {
        x: ((f64::from(canvas_width) - draw_w) / 2.0).round() as i64,
        y: (f64::from(canvas_height) * 0.1).round() as i64,
        width: (draw_w.round() as u32).max(1),
        height: (draw_h.round() as u32).max(1),
    }
}
