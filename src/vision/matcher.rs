//! Template matching against captured frames.
//!
//! Both the frame (optionally cropped to a region) and the template are
//! reduced to single-channel intensity before running normalized matching.
//! Correlation subtracts the window and template means, so a flat patch never
//! scores. Acceptance thresholds are fixed; callers tune behavior with retries.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma, RgbaImage};
use imageproc::integral_image::{integral_image, integral_squared_image};
use imageproc::template_matching::{match_template, MatchTemplateMethod};

use super::region::{Point, Region};

/// Minimum similarity for correlation methods.
pub const SIMILARITY_THRESHOLD: f32 = 0.8;

/// Maximum difference for squared-error methods.
pub const DIFFERENCE_THRESHOLD: f32 = 0.2;

/// Normalized matching strategy. The polarity of the score depends on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchMethod {
    /// Higher is better, accepted at `>= SIMILARITY_THRESHOLD`.
    #[default]
    CrossCorrelation,
    /// Lower is better, accepted at `<= DIFFERENCE_THRESHOLD`.
    SquaredDifference,
}

impl MatchMethod {
    fn score_map(self, image: &GrayImage, template: &GrayImage) -> ScoreMap {
        match self {
            MatchMethod::CrossCorrelation => zero_mean_correlation(image, template),
            MatchMethod::SquaredDifference => {
                match_template(image, template, MatchTemplateMethod::SumOfSquaredErrorsNormalized)
            }
        }
    }

    pub fn accepts(self, score: f32) -> bool {
        match self {
            MatchMethod::CrossCorrelation => score >= SIMILARITY_THRESHOLD,
            MatchMethod::SquaredDifference => score <= DIFFERENCE_THRESHOLD,
        }
    }

    fn is_better(self, candidate: f32, current: f32) -> bool {
        match self {
            MatchMethod::CrossCorrelation => candidate > current,
            MatchMethod::SquaredDifference => candidate < current,
        }
    }

    fn worst_score(self) -> f32 {
        match self {
            MatchMethod::CrossCorrelation => 0.0,
            MatchMethod::SquaredDifference => f32::INFINITY,
        }
    }
}

/// Outcome of a single search. `point` is only meaningful when `found`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
    pub found: bool,
    /// Center of the template footprint in full-frame coordinates
    pub point: Point,
    pub score: f32,
}

impl MatchResult {
    fn miss(score: f32) -> Self {
        Self {
            found: false,
            point: Point::default(),
            score,
        }
    }

    pub fn location(&self) -> Option<Point> {
        self.found.then_some(self.point)
    }
}

type ScoreMap = ImageBuffer<Luma<f32>, Vec<f32>>;
type SumMap = ImageBuffer<Luma<u64>, Vec<u64>>;

/// Prepared search: score map plus the geometry needed to translate hits.
struct Search {
    scores: ScoreMap,
    origin: Region,
    template_width: u32,
    template_height: u32,
}

impl Search {
    fn center_of(&self, x: u32, y: u32) -> Point {
        Point::new(
            (self.origin.x + x + self.template_width / 2) as i32,
            (self.origin.y + y + self.template_height / 2) as i32,
        )
    }
}

#[derive(Clone, Debug)]
pub struct TemplateMatcher {
    method: MatchMethod,
    scale: f32,
}

impl Default for TemplateMatcher {
    fn default() -> Self {
        Self::new(MatchMethod::CrossCorrelation, 1.0)
    }
}

impl TemplateMatcher {
    /// `scale` resizes templates before matching, for devices that are not 1080 wide.
    pub fn new(method: MatchMethod, scale: f32) -> Self {
        Self { method, scale }
    }

    /// Finds the single best match of `template` inside `region` of `frame`.
    pub fn find(&self, frame: &RgbaImage, template: &GrayImage, region: Region) -> MatchResult {
        let Some(search) = self.prepare(frame, template, region) else {
            return MatchResult::miss(self.method.worst_score());
        };

        match best_position(&search.scores, self.method, |_, _| false) {
            Some((x, y, score)) if self.method.accepts(score) => MatchResult {
                found: true,
                point: search.center_of(x, y),
                score,
            },
            Some((_, _, score)) => MatchResult::miss(score),
            None => MatchResult::miss(self.method.worst_score()),
        }
    }

    /// Finds every accepted occurrence, ordered top to bottom then left to right.
    ///
    /// The score map is computed once. Each round takes the best remaining
    /// position and suppresses every position whose footprint would overlap it,
    /// so the same element is never reported twice.
    pub fn find_all(
        &self,
        frame: &RgbaImage,
        template: &GrayImage,
        region: Region,
    ) -> Vec<MatchResult> {
        let Some(search) = self.prepare(frame, template, region) else {
            return Vec::new();
        };

        let (map_w, map_h) = search.scores.dimensions();
        let mut suppressed = vec![false; (map_w * map_h) as usize];
        let mut results: Vec<MatchResult> = Vec::new();

        loop {
            let best = best_position(&search.scores, self.method, |x, y| {
                suppressed[(y * map_w + x) as usize]
            });
            let Some((x, y, score)) = best else { break };
            if !self.method.accepts(score) {
                break;
            }

            results.push(MatchResult {
                found: true,
                point: search.center_of(x, y),
                score,
            });

            let x0 = x.saturating_sub(search.template_width - 1);
            let y0 = y.saturating_sub(search.template_height - 1);
            let x1 = (x + search.template_width).min(map_w);
            let y1 = (y + search.template_height).min(map_h);
            for sy in y0..y1 {
                for sx in x0..x1 {
                    suppressed[(sy * map_w + sx) as usize] = true;
                }
            }
        }

        results.sort_by_key(|r| (r.point.y, r.point.x));
        results
    }

    fn prepare(&self, frame: &RgbaImage, template: &GrayImage, region: Region) -> Option<Search> {
        let (frame_w, frame_h) = frame.dimensions();
        let origin = region.resolve(frame_w, frame_h);
        if origin.width == 0 || origin.height == 0 {
            return None;
        }

        let cropped = imageops::crop_imm(frame, origin.x, origin.y, origin.width, origin.height)
            .to_image();
        let gray = imageops::grayscale(&cropped);

        let template = self.scaled(template);
        let (tw, th) = template.dimensions();
        if tw == 0 || th == 0 || tw > gray.width() || th > gray.height() {
            return None;
        }

        let scores = self.method.score_map(&gray, &template);
        Some(Search {
            scores,
            origin,
            template_width: tw,
            template_height: th,
        })
    }

    fn scaled<'a>(&self, template: &'a GrayImage) -> Cow<'a, GrayImage> {
        if (self.scale - 1.0).abs() <= 0.01 {
            return Cow::Borrowed(template);
        }
        let w = (template.width() as f32 * self.scale).round() as u32;
        let h = (template.height() as f32 * self.scale).round() as u32;
        Cow::Owned(imageops::resize(template, w.max(1), h.max(1), FilterType::Lanczos3))
    }
}

/// Zero-mean normalized cross-correlation (OpenCV's `TM_CCOEFF_NORMED`).
///
/// The raw correlation comes from imageproc; window sums and squared sums come
/// from integral images. Windows without variance score NaN.
fn zero_mean_correlation(image: &GrayImage, template: &GrayImage) -> ScoreMap {
    let (tw, th) = template.dimensions();
    let n = u64::from(tw) * u64::from(th);
    let t_mean = template.pixels().map(|p| f64::from(p[0])).sum::<f64>() / n as f64;
    let t_norm = template
        .pixels()
        .map(|p| (f64::from(p[0]) - t_mean).powi(2))
        .sum::<f64>()
        .sqrt();

    let raw = match_template(image, template, MatchTemplateMethod::CrossCorrelation);
    let sums: SumMap = integral_image(image);
    let squares: SumMap = integral_squared_image(image);

    ScoreMap::from_fn(raw.width(), raw.height(), |x, y| {
        let sum = window_sum(&sums, x, y, tw, th);
        let square_sum = window_sum(&squares, x, y, tw, th);
        // n * variance, exact in integers
        let spread = u128::from(n) * u128::from(square_sum) - u128::from(sum) * u128::from(sum);
        if spread == 0 || t_norm == 0.0 {
            return Luma([f32::NAN]);
        }
        let window_norm = (spread as f64 / n as f64).sqrt();
        let numerator = f64::from(raw.get_pixel(x, y)[0]) - t_mean * sum as f64;
        Luma([(numerator / (t_norm * window_norm)).clamp(-1.0, 1.0) as f32])
    })
}

/// Sum over the `w`x`h` window at (`x`, `y`) of a zero-padded integral image.
fn window_sum(integral: &SumMap, x: u32, y: u32, w: u32, h: u32) -> u64 {
    let at = |x: u32, y: u32| integral.get_pixel(x, y)[0];
    at(x + w, y + h) + at(x, y) - at(x + w, y) - at(x, y + h)
}

/// Scans for the best finite score, skipping excluded positions.
///
/// Flat windows have no defined correlation, so non-finite scores are ignored
/// rather than allowed to win.
fn best_position(
    scores: &ScoreMap,
    method: MatchMethod,
    excluded: impl Fn(u32, u32) -> bool,
) -> Option<(u32, u32, f32)> {
    let mut best: Option<(u32, u32, f32)> = None;
    for (x, y, pixel) in scores.enumerate_pixels() {
        let score = pixel[0];
        if !score.is_finite() || excluded(x, y) {
            continue;
        }
        match best {
            Some((_, _, current)) if !method.is_better(score, current) => {}
            _ => best = Some((x, y, score)),
        }
    }
    best
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgba;

    pub(crate) const BACKGROUND: u8 = 10;

    /// 16x16 checkerboard of 4px cells. Distinct enough that only the exact
    /// placement clears the similarity threshold.
    pub(crate) fn checker_template() -> GrayImage {
        ImageBuffer::from_fn(16, 16, |x, y| {
            if ((x / 4) + (y / 4)) % 2 == 0 {
                Luma([250])
            } else {
                Luma([0])
            }
        })
    }

    pub(crate) fn frame_with(template: &GrayImage, at: &[(u32, u32)], w: u32, h: u32) -> RgbaImage {
        let mut frame = RgbaImage::from_pixel(w, h, Rgba([BACKGROUND, BACKGROUND, BACKGROUND, 255]));
        for &(ox, oy) in at {
            for (x, y, p) in template.enumerate_pixels() {
                let v = p[0];
                frame.put_pixel(ox + x, oy + y, Rgba([v, v, v, 255]));
            }
        }
        frame
    }

    #[test]
    fn test_find_reports_template_center() {
        let template = checker_template();
        let frame = frame_with(&template, &[(40, 30)], 100, 80);
        let result = TemplateMatcher::default().find(&frame, &template, Region::FULL);
        assert!(result.found);
        assert_eq!(result.point, Point::new(48, 38));
        assert!(result.score > 0.99);
    }

    #[test]
    fn test_find_misses_on_blank_frame() {
        let template = checker_template();
        let frame = frame_with(&template, &[], 100, 80);
        let result = TemplateMatcher::default().find(&frame, &template, Region::FULL);
        assert!(!result.found);
        assert!(result.location().is_none());
        assert!(result.score < SIMILARITY_THRESHOLD);
    }

    #[test]
    fn test_region_search_translates_to_full_frame() {
        let template = checker_template();
        let frame = frame_with(&template, &[(40, 30)], 100, 80);
        let matcher = TemplateMatcher::default();

        let full = matcher.find(&frame, &template, Region::FULL);
        let sub = matcher.find(&frame, &template, Region::new(30, 20, 40, 40));
        assert!(sub.found);
        assert_eq!(sub.point, full.point);
    }

    #[test]
    fn test_region_excluding_template_misses() {
        let template = checker_template();
        let frame = frame_with(&template, &[(40, 30)], 100, 80);
        let result = TemplateMatcher::default().find(&frame, &template, Region::new(0, 0, 30, 30));
        assert!(!result.found);
    }

    #[test]
    fn test_template_larger_than_region_misses() {
        let template = checker_template();
        let frame = frame_with(&template, &[(40, 30)], 100, 80);
        let result = TemplateMatcher::default().find(&frame, &template, Region::new(40, 30, 8, 8));
        assert!(!result.found);
    }

    #[test]
    fn test_black_frame_does_not_produce_match() {
        let template = checker_template();
        let frame = RgbaImage::from_pixel(60, 60, Rgba([0, 0, 0, 255]));
        let result = TemplateMatcher::default().find(&frame, &template, Region::FULL);
        assert!(!result.found);
    }

    /// Bright 40x20 plate with one dark vertical stroke.
    fn low_contrast_template() -> GrayImage {
        ImageBuffer::from_fn(40, 20, |x, _| {
            if (18..22).contains(&x) {
                Luma([40])
            } else {
                Luma([235])
            }
        })
    }

    #[test]
    fn test_flat_frame_does_not_match_low_contrast_template() {
        let frame = RgbaImage::from_pixel(200, 200, Rgba([120, 120, 120, 255]));
        let result =
            TemplateMatcher::default().find(&frame, &low_contrast_template(), Region::FULL);
        assert!(!result.found);
        assert!(result.score < SIMILARITY_THRESHOLD);
    }

    #[test]
    fn test_correlation_ignores_brightness_offset() {
        let template = low_contrast_template();
        let mut frame = RgbaImage::from_pixel(200, 200, Rgba([120, 120, 120, 255]));
        for (x, y, pixel) in template.enumerate_pixels() {
            let v = pixel[0] - 20;
            frame.put_pixel(50 + x, 70 + y, Rgba([v, v, v, 255]));
        }
        let result = TemplateMatcher::default().find(&frame, &template, Region::FULL);
        assert!(result.found);
        assert_eq!(result.location(), Some(Point::new(70, 80)));
        assert!(result.score > 0.99);
    }

    #[test]
    fn test_squared_difference_polarity() {
        let template = checker_template();
        let frame = frame_with(&template, &[(12, 20)], 64, 64);
        let matcher = TemplateMatcher::new(MatchMethod::SquaredDifference, 1.0);
        let result = matcher.find(&frame, &template, Region::FULL);
        assert!(result.found);
        assert_eq!(result.point, Point::new(20, 28));
        assert!(result.score <= DIFFERENCE_THRESHOLD);

        let blank = frame_with(&template, &[], 64, 64);
        assert!(!matcher.find(&blank, &template, Region::FULL).found);
    }

    #[test]
    fn test_find_all_orders_by_y_then_x() {
        let template = checker_template();
        let frame = frame_with(&template, &[(70, 10), (10, 50), (10, 10)], 120, 90);
        let results = TemplateMatcher::default().find_all(&frame, &template, Region::FULL);
        let points: Vec<Point> = results.iter().map(|r| r.point).collect();
        assert_eq!(
            points,
            vec![Point::new(18, 18), Point::new(78, 18), Point::new(18, 58)]
        );
    }

    #[test]
    fn test_find_all_within_region() {
        let template = checker_template();
        let frame = frame_with(&template, &[(10, 10), (10, 60)], 60, 100);
        let results =
            TemplateMatcher::default().find_all(&frame, &template, Region::new(0, 50, 60, 50));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].point, Point::new(18, 68));
    }

    #[test]
    fn test_find_all_empty_when_absent() {
        let template = checker_template();
        let frame = frame_with(&template, &[], 60, 60);
        assert!(TemplateMatcher::default()
            .find_all(&frame, &template, Region::FULL)
            .is_empty());
    }
}
