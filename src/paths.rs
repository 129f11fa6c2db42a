use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the output directory for decision journals: `<exe_dir>/output/`
pub fn get_output_dir() -> PathBuf {
    get_exe_dir().join("output")
}

/// Returns the template image directory: `<exe_dir>/resources/images/`
pub fn get_template_dir() -> PathBuf {
    get_exe_dir().join("resources").join("images")
}

/// Returns the event corpus directory: `<exe_dir>/resources/data/`
pub fn get_data_dir() -> PathBuf {
    get_exe_dir().join("resources").join("data")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(get_output_dir())?;
    std::fs::create_dir_all(get_template_dir())?;
    std::fs::create_dir_all(get_data_dir())?;
    Ok(())
}
