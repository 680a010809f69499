//! Common utilities shared by export providers
//!
//! - **ftp**: async wrapper around the blocking FTP client with retry logic
//! - **decompression**: streaming gzip and zip decoding
//! - **stream**: bounded byte pipe between producer threads and readers
//! - **version_discovery**: export filename convention and newest-export selection

pub mod decompression;
pub mod ftp;
pub mod stream;
pub mod version_discovery;

pub use decompression::{decompress, Compression, ExportStream};
pub use version_discovery::{is_newer, newest_export, ExportName};
