//! What the orchestrator can ask about the screen.
//!
//! Every probe captures a fresh frame. Nothing is cached between probes.

use image::RgbaImage;
use std::time::Duration;

use super::geometry::ScreenGeometry;
use super::matcher::TemplateMatcher;
use super::region::{Point, Region};
use super::templates::TemplateStore;
use crate::automation::config::Campaign;
use crate::automation::input::InputSurface;
use crate::automation::pacing::Pacer;
use crate::capture::FrameSource;
use crate::decision::{RaceCandidate, Stat};
use crate::error::BotResult;
use crate::ocr::{NumericField, RegionTextReader};

const FIND_RETRY_DELAY: Duration = Duration::from_millis(100);
const CAPTURE_BACKOFF: Duration = Duration::from_millis(250);
/// Capture failures between wake nudges.
const NUDGE_EVERY: u32 = 3;
/// Shift applied to the event title crop for events with a leading icon.
const TITLE_SHIFT: u32 = 70;

pub trait Perception {
    fn geometry(&self) -> ScreenGeometry;

    /// Location of `template`, trying up to `tries` fresh frames.
    fn find(&self, template: &str, tries: u32, region: Region) -> BotResult<Option<Point>>;

    /// True if the `<location>_header` template is on screen.
    fn confirm(&self, location: &str, tries: u32, region: Region) -> BotResult<bool>;

    /// Every occurrence, top to bottom then left to right.
    fn find_all(&self, template: &str, region: Region) -> BotResult<Vec<Point>>;

    fn color_matches(&self, point: Point, rgb: [u8; 3], tolerance: u8) -> BotResult<bool>;

    /// Event title text below the energy bar. Empty when nothing was read.
    fn read_event_title(&self, increment: u8) -> BotResult<String>;

    /// Failure chance of the selected training. -1 when the label is not visible.
    fn read_failure_chance(&self) -> BotResult<i32>;

    fn read_day_number(&self, campaign: Campaign) -> BotResult<i32>;

    fn read_skill_points(&self) -> BotResult<i32>;

    /// Estimated total stat gain of the selected training.
    fn stat_gain(&self, stat: Stat, campaign: Campaign) -> BotResult<i32>;

    fn evaluate_race_candidate(&self, anchor: Point) -> BotResult<RaceCandidate>;
}

/// Perception over real captured frames.
pub struct Vision<'a> {
    frames: &'a dyn FrameSource,
    input: &'a dyn InputSurface,
    templates: &'a TemplateStore,
    reader: RegionTextReader<'a>,
    pacer: &'a dyn Pacer,
    matcher: TemplateMatcher,
    geometry: ScreenGeometry,
    debug: bool,
}

impl<'a> Vision<'a> {
    /// Captures one frame to learn the screen size.
    pub fn new(
        frames: &'a dyn FrameSource,
        input: &'a dyn InputSurface,
        templates: &'a TemplateStore,
        reader: RegionTextReader<'a>,
        pacer: &'a dyn Pacer,
        matcher: TemplateMatcher,
    ) -> BotResult<Self> {
        let mut vision = Self {
            frames,
            input,
            templates,
            reader,
            pacer,
            matcher,
            geometry: ScreenGeometry::new(0, 0),
            debug: false,
        };
        let frame = vision.capture()?;
        vision.geometry = ScreenGeometry::new(frame.width(), frame.height());
        crate::log(&format!(
            "Screen is {}x{}{}",
            frame.width(),
            frame.height(),
            if vision.geometry.is_wide() { " (wide layout)" } else { "" }
        ));
        Ok(vision)
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Captures a frame, retrying until one arrives or a stop is requested.
    fn capture(&self) -> BotResult<RgbaImage> {
        let mut failures = 0u32;
        loop {
            self.pacer.check_stop()?;
            match self.frames.capture_frame() {
                Ok(frame) => return Ok(frame),
                Err(e) => {
                    failures += 1;
                    if failures == 1 || self.debug {
                        crate::log(&format!("Screen capture not ready: {}", e));
                    }
                    if failures % NUDGE_EVERY == 0 {
                        self.input.nudge();
                    }
                    self.pacer.wait(CAPTURE_BACKOFF)?;
                }
            }
        }
    }

    /// Finds `template` and returns the frame it was found in.
    fn locate(
        &self,
        template: &str,
        tries: u32,
        region: Region,
    ) -> BotResult<Option<(Point, RgbaImage)>> {
        let Some(reference) = self.templates.get(template) else {
            crate::log(&format!("[WARNING] Template {} is not loaded", template));
            return Ok(None);
        };

        let tries = tries.max(1);
        for attempt in 1..=tries {
            let frame = self.capture()?;
            let result = self.matcher.find(&frame, reference, region);
            if let Some(point) = result.location() {
                if self.debug {
                    crate::log(&format!(
                        "[DEBUG] Found {} at {} (score {:.3})",
                        template.to_uppercase(),
                        point,
                        result.score
                    ));
                }
                return Ok(Some((point, frame)));
            }
            if attempt < tries {
                self.pacer.wait(FIND_RETRY_DELAY)?;
            }
        }
        if self.debug {
            crate::log(&format!("[DEBUG] Failed to find {}", template.to_uppercase()));
        }
        Ok(None)
    }

    fn matches_in(&self, frame: &RgbaImage, template: &str, region: Region) -> bool {
        self.templates
            .get(template)
            .is_some_and(|t| self.matcher.find(frame, t, region).found)
    }

    fn count_in(&self, frame: &RgbaImage, template: &str, region: Region) -> i32 {
        self.templates
            .get(template)
            .map_or(0, |t| self.matcher.find_all(frame, t, region).len() as i32)
    }

    fn wide(&self) -> bool {
        self.geometry.is_wide()
    }
}

impl Perception for Vision<'_> {
    fn geometry(&self) -> ScreenGeometry {
        self.geometry
    }

    fn find(&self, template: &str, tries: u32, region: Region) -> BotResult<Option<Point>> {
        Ok(self.locate(template, tries, region)?.map(|(p, _)| p))
    }

    fn confirm(&self, location: &str, tries: u32, region: Region) -> BotResult<bool> {
        let header = format!("{}_header", location);
        let found = self.locate(&header, tries, region)?.is_some();
        if found {
            crate::log(&format!(
                "Current location confirmed to be at {}.",
                location.to_uppercase()
            ));
        }
        Ok(found)
    }

    fn find_all(&self, template: &str, region: Region) -> BotResult<Vec<Point>> {
        let Some(reference) = self.templates.get(template) else {
            return Ok(Vec::new());
        };
        let frame = self.capture()?;
        Ok(self
            .matcher
            .find_all(&frame, reference, region)
            .into_iter()
            .map(|m| m.point)
            .collect())
    }

    fn color_matches(&self, point: Point, rgb: [u8; 3], tolerance: u8) -> BotResult<bool> {
        let frame = self.capture()?;
        Ok(pixel_matches(&frame, point, rgb, tolerance))
    }

    fn read_event_title(&self, increment: u8) -> BotResult<String> {
        let Some((energy, frame)) = self.locate("energy", 1, Region::FULL)? else {
            return Ok(String::new());
        };

        let mut region = if self.wide() {
            Region::around(energy, -250, 154, 746, 85)
        } else {
            Region::around(energy, -125, 116, 645, 65)
        };
        if self.matches_in(&frame, "shift", region) {
            region = region.shifted_right(TITLE_SHIFT);
        }

        let text = self.reader.read_line(&frame, region, increment);
        if self.debug {
            crate::log(&format!("[DEBUG] Event title read as \"{}\"", text));
        }
        Ok(text)
    }

    fn read_failure_chance(&self) -> BotResult<i32> {
        let Some((anchor, frame)) = self.locate("training_failure_chance", 5, Region::FULL)? else {
            return Ok(-1);
        };
        let region = if self.wide() {
            Region::around(anchor, -65, 23, 130, 50)
        } else {
            Region::around(anchor, -45, 15, 100, 37)
        };
        Ok(self
            .reader
            .read_field(&frame, region, NumericField::FailureChance))
    }

    fn read_day_number(&self, campaign: Campaign) -> BotResult<i32> {
        let top = self.geometry.top_half();
        let Some((energy, frame)) = self.locate("energy", 1, top)? else {
            return Ok(-1);
        };
        let region = day_region(energy, campaign, self.wide());
        Ok(self.reader.read_field(&frame, region, NumericField::DayNumber))
    }

    fn read_skill_points(&self) -> BotResult<i32> {
        let Some((anchor, frame)) = self.locate("skill_points", 5, Region::FULL)? else {
            return Ok(-1);
        };
        let g = self.geometry;
        let region = if self.wide() {
            Region::around(anchor, -75, 45, 150, 70)
        } else {
            Region::around(
                anchor,
                -g.rel(70),
                g.rel(28),
                g.rel(135) as u32,
                g.rel(70) as u32,
            )
        };
        Ok(self.reader.read_field(&frame, region, NumericField::SkillPoints))
    }

    fn stat_gain(&self, stat: Stat, campaign: Campaign) -> BotResult<i32> {
        let frame = self.capture()?;
        let area = self.geometry.stat_gain_area();

        let mut gain = 10;
        for other in Stat::ALL {
            let blocks = self.count_in(&frame, &other.block_template(), area);
            gain += blocks * if other == stat { 20 } else { 10 };
        }
        if campaign == Campaign::AoHaru {
            gain += self.count_in(&frame, "aoharu_special_training", area) * 10;
            gain += self.count_in(&frame, "aoharu_spirit_explosion", area) * 20;
        }
        Ok(gain)
    }

    fn evaluate_race_candidate(&self, anchor: Point) -> BotResult<RaceCandidate> {
        let frame = self.capture()?;
        let prediction = if self.wide() {
            Region::around(anchor, -231, -142, 220, 125)
        } else {
            Region::around(anchor, -173, -106, 163, 96)
        };
        if !self.matches_in(&frame, "race_extra_double_prediction", prediction) {
            if self.debug {
                crate::log(&format!("[DEBUG] Race at {} has no double prediction.", anchor));
            }
            return Ok(RaceCandidate::ineligible(anchor));
        }

        let fans_region = if self.wide() {
            Region::around(anchor, -747, -100, 221, 40)
        } else {
            Region::around(anchor, -534, -75, 150, 30)
        };
        let fan_gain = self.reader.read_field(&frame, fans_region, NumericField::Fans);
        Ok(RaceCandidate {
            location: anchor,
            fan_gain,
            has_double_prediction: true,
        })
    }
}

/// Crop holding the day number, relative to the energy label.
fn day_region(energy: Point, campaign: Campaign, wide: bool) -> Region {
    match (campaign, wide) {
        (Campaign::AoHaru, true) => Region::around(energy, -343, -184, 135, 100),
        (Campaign::AoHaru, false) => Region::around(energy, -260, -140, 105, 75),
        (Campaign::Normal, true) => Region::around(energy, -324, -126, 175, 116),
        (Campaign::Normal, false) => Region::around(energy, -246, -100, 140, 100),
    }
}

fn pixel_matches(frame: &RgbaImage, point: Point, rgb: [u8; 3], tolerance: u8) -> bool {
    if point.x < 0 || point.y < 0 {
        return false;
    }
    let (x, y) = (point.x as u32, point.y as u32);
    if x >= frame.width() || y >= frame.height() {
        return false;
    }
    let pixel = frame.get_pixel(x, y);
    (0..3).all(|c| pixel[c].abs_diff(rgb[c]) <= tolerance)
}
