pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod reader;
pub mod setup;

pub use engine::{TesseractCli, TextMode, TextRecognizer};
pub use reader::{NumericField, RegionTextReader};
pub use setup::ensure_tesseract;
