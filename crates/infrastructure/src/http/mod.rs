pub mod filter_download_client;

pub use filter_download_client::HttpFilterDownloadClient;
