//! Gesture dispatch to the device.
//!
//! Taps land at a random offset inside the matched element, bounded to a
//! quarter of the template's footprint so repeated taps do not hit the exact
//! same pixel.

use rand::Rng;
use std::time::Duration;

use crate::capture::AdbDevice;
use crate::vision::{Point, TemplateStore};

/// Duration of a long press, sent as a swipe that does not move.
const LONG_PRESS: Duration = Duration::from_millis(1000);
/// Gap between consecutive taps on the same element.
const TAP_INTERVAL: Duration = Duration::from_millis(100);

pub trait InputSurface {
    /// Taps `point` `taps` times. `template` names the matched element and bounds the jitter.
    fn tap(&self, point: Point, template: &str, taps: u32, long_press: bool) -> bool;

    fn swipe(&self, from: Point, to: Point, duration: Duration) -> bool;

    /// Wakes the device when captures keep failing.
    fn nudge(&self);
}

pub struct AdbInput<'a> {
    device: AdbDevice,
    templates: &'a TemplateStore,
}

impl<'a> AdbInput<'a> {
    pub fn new(device: AdbDevice, templates: &'a TemplateStore) -> Self {
        Self { device, templates }
    }

    fn jittered(&self, point: Point, template: &str) -> Point {
        let (w, h) = self.templates.dimensions(template).unwrap_or((0, 0));
        jitter(point, (w / 4) as i32, (h / 4) as i32, &mut rand::thread_rng())
    }
}

/// Random point within `dx`/`dy` of `point` on each axis.
fn jitter<R: Rng>(point: Point, dx: i32, dy: i32, rng: &mut R) -> Point {
    let ox = if dx > 0 { rng.gen_range(-dx..=dx) } else { 0 };
    let oy = if dy > 0 { rng.gen_range(-dy..=dy) } else { 0 };
    Point::new((point.x + ox).max(0), (point.y + oy).max(0))
}

impl InputSurface for AdbInput<'_> {
    fn tap(&self, point: Point, template: &str, taps: u32, long_press: bool) -> bool {
        for i in 0..taps.max(1) {
            let p = self.jittered(point, template);
            let (x, y) = (p.x.to_string(), p.y.to_string());
            let result = if long_press {
                let ms = LONG_PRESS.as_millis().to_string();
                self.device.shell(&["input", "swipe", &x, &y, &x, &y, &ms])
            } else {
                self.device.shell(&["input", "tap", &x, &y])
            };
            if let Err(e) = result {
                crate::log(&format!("Tap at {} failed: {}", p, e));
                return false;
            }
            if i + 1 < taps {
                std::thread::sleep(TAP_INTERVAL);
            }
        }
        true
    }

    fn swipe(&self, from: Point, to: Point, duration: Duration) -> bool {
        let args = [
            from.x.to_string(),
            from.y.to_string(),
            to.x.to_string(),
            to.y.to_string(),
            duration.as_millis().to_string(),
        ];
        let mut full = vec!["input", "swipe"];
        full.extend(args.iter().map(String::as_str));
        match self.device.shell(&full) {
            Ok(()) => true,
            Err(e) => {
                crate::log(&format!("Swipe {} -> {} failed: {}", from, to, e));
                false
            }
        }
    }

    fn nudge(&self) {
        if let Err(e) = self.device.shell(&["input", "keyevent", "KEYCODE_WAKEUP"]) {
            crate::log(&format!("Wake key failed: {}", e));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;

    #[derive(Clone, Debug, PartialEq)]
    pub(crate) enum Gesture {
        Tap {
            point: Point,
            template: String,
            taps: u32,
            long_press: bool,
        },
        Swipe {
            from: Point,
            to: Point,
        },
        Nudge,
    }

    /// Records every gesture instead of sending it.
    #[derive(Default)]
    pub(crate) struct RecordingInput {
        pub gestures: RefCell<Vec<Gesture>>,
    }

    impl RecordingInput {
        pub(crate) fn tapped(&self, template: &str) -> usize {
            self.gestures
                .borrow()
                .iter()
                .filter(|g| matches!(g, Gesture::Tap { template: t, .. } if t == template))
                .count()
        }
    }

    impl InputSurface for RecordingInput {
        fn tap(&self, point: Point, template: &str, taps: u32, long_press: bool) -> bool {
            self.gestures.borrow_mut().push(Gesture::Tap {
                point,
                template: template.to_string(),
                taps,
                long_press,
            });
            true
        }

        fn swipe(&self, from: Point, to: Point, _duration: Duration) -> bool {
            self.gestures.borrow_mut().push(Gesture::Swipe { from, to });
            true
        }

        fn nudge(&self) {
            self.gestures.borrow_mut().push(Gesture::Nudge);
        }
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = jitter(Point::new(100, 200), 10, 4, &mut rng);
            assert!((90..=110).contains(&p.x));
            assert!((196..=204).contains(&p.y));
        }
    }

    #[test]
    fn test_jitter_without_template_is_exact() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(jitter(Point::new(5, 6), 0, 0, &mut rng), Point::new(5, 6));
    }

    #[test]
    fn test_jitter_clamps_at_origin() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let p = jitter(Point::new(0, 0), 8, 8, &mut rng);
            assert!(p.x >= 0 && p.y >= 0);
        }
    }
}
