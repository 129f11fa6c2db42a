use anyhow::{anyhow, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::log;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

/// Install locations checked when tesseract is not on PATH.
const COMMON_EXECUTABLES: &[&str] = &[
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];

const COMMON_TESSDATA: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];

pub struct TesseractPaths {
    pub executable: PathBuf,
    pub tessdata: PathBuf,
}

/// Returns the directory for storing downloaded Tesseract data
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("uma-career-bot")
        .join("tesseract")
}

/// Ensures Tesseract and the trained data for `language` are available.
/// Downloads the trained data if no copy is found.
pub fn ensure_tesseract(language: &str) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable()?;

    let tessdata = match find_tessdata_dir(language) {
        Ok(dir) => dir,
        Err(_) => {
            log(&format!(
                "{}.traineddata not found locally, downloading...",
                language
            ));
            let tessdata_dir = get_tesseract_dir().join("tessdata");
            fs::create_dir_all(&tessdata_dir)?;
            download_tessdata(&tessdata_dir, language)?;
            tessdata_dir
        }
    };

    log(&format!(
        "Tesseract ready: {} (tessdata {})",
        executable.display(),
        tessdata.display()
    ));

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Downloads trained data for one language
fn download_tessdata(tessdata_dir: &Path, language: &str) -> Result<()> {
    let url = format!("{}/{}.traineddata", TESSDATA_REPO, language);
    let path = tessdata_dir.join(format!("{}.traineddata", language));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "uma-career-bot")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}.traineddata: HTTP {}",
            language,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&path)?;
    file.write_all(&bytes)?;

    log(&format!(
        "Downloaded {}.traineddata ({} bytes)",
        language,
        bytes.len()
    ));

    Ok(())
}

/// Finds the Tesseract executable on PATH or in common install locations
pub fn find_tesseract_executable() -> Result<PathBuf> {
    if let Ok(output) = std::process::Command::new("tesseract")
        .arg("--version")
        .output()
    {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    COMMON_EXECUTABLES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory holding `<language>.traineddata`
pub fn find_tessdata_dir(language: &str) -> Result<PathBuf> {
    let file = format!("{}.traineddata", language);
    let local = get_tesseract_dir().join("tessdata");

    let mut candidates = vec![local];
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        candidates.push(PathBuf::from(&prefix));
        candidates.push(PathBuf::from(&prefix).join("tessdata"));
    }
    candidates.extend(COMMON_TESSDATA.iter().map(PathBuf::from));

    candidates
        .into_iter()
        .find(|dir| dir.join(&file).exists())
        .ok_or_else(|| anyhow!("tessdata directory not found. Please ensure {} is available.", file))
}
