//! Region text reading: crop, binarize, recognize a single line.

use image::RgbaImage;

use super::engine::{TextMode, TextRecognizer};
use super::extract::{parse_count, parse_fans, parse_percentage};
use super::preprocess::{binarize, crop_gray, downscale_half, prepare_numeric};
use crate::vision::Region;

/// Small numeric labels read with per-field cleanup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericField {
    FailureChance,
    DayNumber,
    SkillPoints,
    Fans,
}

struct FieldPrep {
    blur_sigma: f32,
    threshold: u8,
    downscale: bool,
    mode: TextMode,
}

impl NumericField {
    fn prep(self) -> FieldPrep {
        match self {
            NumericField::FailureChance => FieldPrep {
                blur_sigma: 0.5,
                threshold: 200,
                downscale: false,
                mode: TextMode::Line,
            },
            NumericField::DayNumber => FieldPrep {
                blur_sigma: 0.0,
                threshold: 200,
                downscale: true,
                mode: TextMode::Digits,
            },
            NumericField::SkillPoints => FieldPrep {
                blur_sigma: 0.5,
                threshold: 160,
                downscale: false,
                mode: TextMode::Digits,
            },
            NumericField::Fans => FieldPrep {
                blur_sigma: 0.0,
                threshold: 150,
                downscale: false,
                mode: TextMode::Line,
            },
        }
    }

    fn parse(self, text: &str) -> i32 {
        match self {
            NumericField::FailureChance => parse_percentage(text),
            NumericField::DayNumber | NumericField::SkillPoints => parse_count(text),
            NumericField::Fans => parse_fans(text),
        }
    }

    /// Value reported when recognition itself failed.
    fn unreadable(self) -> i32 {
        match self {
            NumericField::FailureChance => 0,
            _ => -1,
        }
    }
}

pub struct RegionTextReader<'a> {
    recognizer: &'a dyn TextRecognizer,
    base_threshold: u8,
}

impl<'a> RegionTextReader<'a> {
    pub fn new(recognizer: &'a dyn TextRecognizer, base_threshold: u8) -> Self {
        Self {
            recognizer,
            base_threshold,
        }
    }

    /// Reads one line of text from `region`, binarized at base + `increment`.
    ///
    /// Returns an empty string when recognition fails or reads nothing.
    pub fn read_line(&self, frame: &RgbaImage, region: Region, increment: u8) -> String {
        let gray = crop_gray(frame, region);
        let threshold = self.base_threshold.saturating_add(increment);
        let bw = binarize(&gray, threshold);

        match self.recognizer.recognize(&bw, TextMode::Line) {
            Ok(text) => text,
            Err(e) => {
                crate::log(&format!("OCR failed: {}", e));
                String::new()
            }
        }
    }

    /// Reads and parses a numeric label.
    pub fn read_field(&self, frame: &RgbaImage, region: Region, field: NumericField) -> i32 {
        let prep = field.prep();
        let mut gray = crop_gray(frame, region);
        if prep.downscale {
            gray = downscale_half(&gray);
        }
        let bw = prepare_numeric(&gray, prep.blur_sigma, prep.threshold);

        match self.recognizer.recognize(&bw, prep.mode) {
            Ok(text) => field.parse(&text),
            Err(e) => {
                crate::log(&format!("OCR failed for {:?}: {}", field, e));
                field.unreadable()
            }
        }
    }
}
