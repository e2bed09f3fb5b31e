pub mod error_monitor;
pub mod ffmpeg_media;
pub mod http_downloader;
pub mod pdf;
pub mod test_support;

pub use error_monitor::JsonErrorMonitorAdapter;
pub use ffmpeg_media::FfmpegMediaTools;
pub use http_downloader::HttpDownloaderAdapter;
pub use pdf::GenPdfWriterAdapter;
