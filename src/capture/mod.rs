//! Screen capture from the attached device.
//!
//! - `FrameSource`: anything that can hand over the current screen
//! - `AdbScreencap`: frames pulled over adb

pub mod adb;

use anyhow::Result;
use image::RgbaImage;

pub use adb::{AdbDevice, AdbScreencap};

pub trait FrameSource {
    /// Captures the current screen. Fails when the capture surface is not ready.
    fn capture_frame(&self) -> Result<RgbaImage>;
}
