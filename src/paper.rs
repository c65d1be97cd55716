use std::fmt;
use std::str::FromStr;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PaperError {
    #[error("Unknown paper format: {0} (expected one of Letter, Legal, Tabloid, Ledger, A0-A6)")]
    UnknownFormat(String),
    #[error("Can't parse length {0:?}, expected a number optionally followed by px, in, cm or mm")]
    InvalidLength(String),
    #[error("Length can't be negative: {0}")]
    NegativeLength(String),
    #[error("Invalid page range {0:?}, expected e.g. '1-5, 8, 11-13'")]
    InvalidPageRange(String),
}

pub type Result<T> = std::result::Result<T, PaperError>;

/// CSS pixels per inch
pub const CSS_DPI: f64 = 96.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PaperFormat {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    #[default]
    A4,
    A5,
    A6,
}

impl PaperFormat {

    pub const ALL: [PaperFormat; 11] = [
        PaperFormat::Letter, PaperFormat::Legal, PaperFormat::Tabloid, PaperFormat::Ledger,
        PaperFormat::A0, PaperFormat::A1, PaperFormat::A2, PaperFormat::A3,
        PaperFormat::A4, PaperFormat::A5, PaperFormat::A6,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PaperFormat::Letter => "Letter",
            PaperFormat::Legal => "Legal",
            PaperFormat::Tabloid => "Tabloid",
            PaperFormat::Ledger => "Ledger",
            PaperFormat::A0 => "A0",
            PaperFormat::A1 => "A1",
            PaperFormat::A2 => "A2",
            PaperFormat::A3 => "A3",
            PaperFormat::A4 => "A4",
            PaperFormat::A5 => "A5",
            PaperFormat::A6 => "A6",
        }
    }

    /// Portrait (width, height) in inches, the sizes Chrome's print dialog uses
    pub fn size_in_inches(&self) -> (f64, f64) {
        match self {
            PaperFormat::Letter => (8.5, 11.0),
            PaperFormat::Legal => (8.5, 14.0),
            PaperFormat::Tabloid => (11.0, 17.0),
            PaperFormat::Ledger => (17.0, 11.0),
            PaperFormat::A0 => (33.1, 46.8),
            PaperFormat::A1 => (23.4, 33.1),
            PaperFormat::A2 => (16.54, 23.4),
            PaperFormat::A3 => (11.7, 16.54),
            PaperFormat::A4 => (8.27, 11.7),
            PaperFormat::A5 => (5.83, 8.27),
            PaperFormat::A6 => (4.13, 5.83),
        }
    }

    /// Paper size in CSS pixels
    pub fn viewport(&self) -> (u32, u32) {
        let (width, height) = self.size_in_inches();
        ((width * CSS_DPI).round() as u32, (height * CSS_DPI).round() as u32)
    }

    /// Screenshots are taken at Letter or A4 width, anything else uses A4
    pub fn screenshot_viewport(&self) -> (u32, u32) {
        match self {
            PaperFormat::Letter => PaperFormat::Letter.viewport(),
            _ => PaperFormat::A4.viewport(),
        }
    }
}

impl fmt::Display for PaperFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaperFormat {
    type Err = PaperError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        PaperFormat::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PaperError::UnknownFormat(s.to_string()))
    }
}

/// A margin length, stored in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Length {
    pixels: f64,
}

impl Length {

    const UNITS: [(&'static str, f64); 4] = [
        ("px", 1.0),
        ("in", 96.0),
        ("cm", 37.8),
        ("mm", 3.78),
    ];

    pub fn from_pixels(pixels: f64) -> Self {
        Self { pixels }
    }

    pub fn pixels(&self) -> f64 {
        self.pixels
    }

    pub fn inches(&self) -> f64 {
        self.pixels / CSS_DPI
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.pixels)
    }
}

impl FromStr for Length {
    type Err = PaperError;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim().to_ascii_lowercase();

        let (number, factor) = Self::UNITS
            .iter()
            .find_map(|(unit, factor)| text.strip_suffix(unit).map(|n| (n, *factor)))
            .unwrap_or((text.as_str(), 1.0));

        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| PaperError::InvalidLength(s.to_string()))?;

        if !value.is_finite() {
            return Err(PaperError::InvalidLength(s.to_string()));
        }
        if value < 0.0 {
            return Err(PaperError::NegativeLength(s.to_string()));
        }

        Ok(Self::from_pixels(value * factor))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Margins {
    pub top: Length,
    pub bottom: Length,
    pub left: Length,
    pub right: Length,
}

/// Pages to print, e.g. `1-5, 8, 11-13`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRanges(String);

impl PageRanges {

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parse_page(page: &str, range: &str) -> Result<u32> {
        match page.trim().parse::<u32>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(PaperError::InvalidPageRange(range.to_string())),
        }
    }

    fn normalize_range(range: &str) -> Result<String> {
        let Some((start, end)) = range.split_once('-') else {
            return Ok(Self::parse_page(range, range)?.to_string());
        };

        let start = start.trim();
        let end = end.trim();

        let start = (!start.is_empty()).then(|| Self::parse_page(start, range)).transpose()?;
        let end = (!end.is_empty()).then(|| Self::parse_page(end, range)).transpose()?;

        match (start, end) {
            (None, None) => Err(PaperError::InvalidPageRange(range.to_string())),
            (Some(a), Some(b)) if a > b => Err(PaperError::InvalidPageRange(range.to_string())),
            (Some(a), Some(b)) => Ok(format!("{}-{}", a, b)),
            (Some(a), None) => Ok(format!("{}-", a)),
            (None, Some(b)) => Ok(format!("-{}", b)),
        }
    }
}

impl fmt::Display for PageRanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PageRanges {
    type Err = PaperError;

    fn from_str(s: &str) -> Result<Self> {
        let ranges = s
            .split(',')
            .map(str::trim)
            .map(|range| {
                if range.is_empty() {
                    Err(PaperError::InvalidPageRange(s.to_string()))
                } else {
                    Self::normalize_range(range)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self(ranges.join(", ")))
    }
}
