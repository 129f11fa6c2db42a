//! Uma Musume career bot
//!
//! Drives a training career on an Android device over adb: it reads the screen
//! with template matching and OCR, picks trainings, event options and races,
//! and stops when the career ends or a configured goal is met.

mod automation;
mod capture;
mod decision;
mod error;
mod events;
mod ocr;
mod paths;
mod vision;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

use automation::{
    run_career, spawn_stop_listener, AdbInput, Campaign, CareerRun, DecisionJournal, RealPacer,
    RunLog, StopToken,
};
use capture::{AdbDevice, AdbScreencap};
use events::{EventCorpus, EventResolver, ResolverScope};
use ocr::{RegionTextReader, TesseractCli};
use vision::{MatchMethod, TemplateMatcher, TemplateStore, Vision, AO_HARU_TEMPLATES, REQUIRED_TEMPLATES};

const LOG_FILE: &str = "uma_career_bot.log";

/// Logs a message to stdout and the diagnostics file.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join(LOG_FILE);
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        let log_path = paths::get_logs_dir().join(LOG_FILE);
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));

    paths::ensure_directories().context("Failed to create working directories")?;
    log("Uma career bot starting");

    automation::init_config();
    let config = automation::get_config();

    let mut required = REQUIRED_TEMPLATES.to_vec();
    if config.campaign == Campaign::AoHaru {
        required.extend_from_slice(AO_HARU_TEMPLATES);
    }
    let templates = TemplateStore::load(&paths::get_template_dir(), &required)?;
    let corpus = EventCorpus::load(&paths::get_data_dir())?;
    log(&format!("Loaded {} events", corpus.event_count()));

    let tesseract = ocr::ensure_tesseract(&config.ocr.language)
        .context("Tesseract is required for reading the screen")?;
    let recognizer = TesseractCli::new(tesseract.executable, tesseract.tessdata, &config.ocr.language);
    let reader = RegionTextReader::new(&recognizer, config.ocr.threshold);

    let device = AdbDevice::new(&config.device.adb_path, config.device.serial.as_deref());
    device.verify().context("No usable device found over adb")?;
    let frames = AdbScreencap::new(device.clone());
    let input = AdbInput::new(device, &templates);

    let stop = StopToken::new();
    let pacer = RealPacer::new(stop.clone());
    let matcher = TemplateMatcher::new(MatchMethod::CrossCorrelation, config.device.template_scale);
    let vision = Vision::new(&frames, &input, &templates, reader, &pacer, matcher)?
        .with_debug(config.debug_mode);

    // Per-run files share one timestamp: logs/run_<ts>.log and output/<ts>/
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let run_log_path = paths::get_logs_dir().join(format!("run_{}.log", timestamp));
    let mut run_log = RunLog::to_file(&run_log_path);
    let journal = DecisionJournal::create(&paths::get_output_dir().join(&timestamp))?;
    log(&format!("Run log: {}", run_log_path.display()));
    if let Some(path) = journal.path() {
        log(&format!("Decision journal: {}", path.display()));
    }

    let resolver = EventResolver::new(&corpus, ResolverScope::from_config(&config.events));

    // Detached: it blocks on stdin until a command or EOF arrives.
    let _listener = spawn_stop_listener(stop.clone());
    log("Type \"stop\" and press Enter to end the run.");

    let mut run = CareerRun::new(config, &vision, &input, &pacer, resolver, &mut run_log, &journal);
    match run_career(&mut run) {
        Ok(outcome) => {
            log(&format!("Finished: {}", outcome));
            Ok(())
        }
        Err(e) => Err(anyhow!(e).context("Career run failed")),
    }
}
