//! Template matching and screen probes.

pub mod geometry;
pub mod matcher;
pub mod perception;
pub mod region;
pub mod templates;

pub use geometry::ScreenGeometry;
pub use matcher::{MatchMethod, MatchResult, TemplateMatcher};
pub use perception::{Perception, Vision};
pub use region::{Point, Region};
pub use templates::{TemplateStore, AO_HARU_TEMPLATES, REQUIRED_TEMPLATES};
