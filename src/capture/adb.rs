//! Android debug bridge access: screen capture and raw shell commands.

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use std::process::{Command, Output};

use super::FrameSource;

/// One attached device, addressed through the adb executable.
#[derive(Clone, Debug)]
pub struct AdbDevice {
    adb_path: String,
    serial: Option<String>,
}

impl AdbDevice {
    pub fn new(adb_path: &str, serial: Option<&str>) -> Self {
        Self {
            adb_path: adb_path.to_string(),
            serial: serial.map(str::to_string),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.adb_path);
        if let Some(serial) = &self.serial {
            command.arg("-s").arg(serial);
        }
        command
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        let output = self
            .command()
            .args(args)
            .output()
            .with_context(|| format!("Failed to run {} {}", self.adb_path, args.join(" ")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("adb {} failed: {}", args.join(" "), stderr.trim()));
        }
        Ok(output)
    }

    /// Runs `adb shell <args>`.
    pub fn shell(&self, args: &[&str]) -> Result<()> {
        let mut full = vec!["shell"];
        full.extend_from_slice(args);
        self.run(&full).map(|_| ())
    }

    /// Checks that the device answers.
    pub fn verify(&self) -> Result<()> {
        let output = self.run(&["get-state"])?;
        let state = String::from_utf8_lossy(&output.stdout);
        if state.trim() != "device" {
            return Err(anyhow!("Device not ready (state: {})", state.trim()));
        }
        crate::log(&format!(
            "Connected to device {}",
            self.serial.as_deref().unwrap_or("(default)")
        ));
        Ok(())
    }
}

/// Captures frames with `adb exec-out screencap -p`.
pub struct AdbScreencap {
    device: AdbDevice,
}

impl AdbScreencap {
    pub fn new(device: AdbDevice) -> Self {
        Self { device }
    }
}

impl FrameSource for AdbScreencap {
    fn capture_frame(&self) -> Result<RgbaImage> {
        let output = self.device.run(&["exec-out", "screencap", "-p"])?;
        if output.stdout.is_empty() {
            return Err(anyhow!("screencap returned no data"));
        }
        decode_png(&output.stdout)
    }
}

fn decode_png(bytes: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes).context("Failed to decode screencap output")?;
    Ok(img.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    #[test]
    fn test_decode_png() {
        let img = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let decoded = decode_png(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(1, 1), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_png(b"not a png").is_err());
    }

    #[test]
    fn test_serial_is_passed_first() {
        let device = AdbDevice::new("adb", Some("emulator-5554"));
        let cmd = device.command();
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-s", "emulator-5554"]);
    }
}
