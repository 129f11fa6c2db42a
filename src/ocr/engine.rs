use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

/// What the recognizer should expect in the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextMode {
    /// A single line of free text
    Line,
    /// A single line of digits only
    Digits,
}

/// Single-line text recognition over a preprocessed image.
pub trait TextRecognizer {
    /// Returns the recognized text, trimmed. Empty when nothing was read.
    fn recognize(&self, img: &GrayImage, mode: TextMode) -> Result<String>;
}

/// Tesseract invoked as an external process.
pub struct TesseractCli {
    executable: PathBuf,
    tessdata: PathBuf,
    language: String,
}

impl TesseractCli {
    pub fn new(executable: PathBuf, tessdata: PathBuf, language: &str) -> Self {
        Self {
            executable,
            tessdata,
            language: language.to_string(),
        }
    }
}

impl TextRecognizer for TesseractCli {
    fn recognize(&self, img: &GrayImage, mode: TextMode) -> Result<String> {
        if img.width() == 0 || img.height() == 0 {
            return Ok(String::new());
        }

        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write OCR input image")?;

        let mut command = Command::new(&self.executable);
        command
            .arg(temp_input.path())
            .arg("stdout")
            .arg("--tessdata-dir")
            .arg(&self.tessdata)
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg("7"); // Treat the image as a single text line
        if mode == TextMode::Digits {
            command.arg("-c").arg("tessedit_char_whitelist=0123456789");
        }

        let output = command.output().context("Failed to run Tesseract")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        Ok(clean_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Joins non-empty output lines. Single-line mode still emits a trailing form feed.
fn clean_output(raw: &str) -> String {
    raw.lines()
        .map(|l| l.trim_matches(|c: char| c.is_whitespace() || c == '\u{c}'))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_output_strips_form_feed() {
        assert_eq!(clean_output("Hello World\n\u{c}"), "Hello World");
    }

    #[test]
    fn test_clean_output_empty() {
        assert_eq!(clean_output("\n \n\u{c}"), "");
    }
}
