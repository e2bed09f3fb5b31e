pub mod downloader;
pub mod errors;
pub mod media;
pub mod pdf;
pub mod transcriber;

pub use downloader::DownloaderPort;
pub use errors::{ErrorLog, ErrorMonitorPort};
pub use media::MediaToolsPort;
pub use pdf::PdfWriterPort;
pub use transcriber::{TranscriberPort, TranscriptionResult};
