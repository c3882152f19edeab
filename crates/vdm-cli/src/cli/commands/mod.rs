mod download;
mod export;
mod file;
mod status;

pub use download::run_download;
pub use export::run_export;
pub use file::run_file;
pub use status::run_status;
