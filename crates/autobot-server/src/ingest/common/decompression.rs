//! Streaming decompression of export files
//!
//! # Supported Formats
//!
//! - **Gzip** (.gz): `flate2` decoder wrapped around the raw stream
//! - **Zip** (.zip): the first file entry, extracted on a background thread
//! - anything else is passed through untouched
//!
//! Nothing here buffers a whole file; every variant returns a reader that
//! decompresses as it is consumed.

use autobot_common::Result;
use flate2::read::GzDecoder;
use std::io::{self, Read};
use tracing::debug;

use super::stream::{spawn_producer, DEFAULT_PIPE_CAPACITY};

/// Boxed byte stream handed from providers to the pipeline
pub type ExportStream = Box<dyn Read + Send>;

/// Compression of an export, derived from its file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zip,
}

impl Compression {
    pub fn from_filename(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Compression::Zip
        } else if lower.ends_with(".gz") {
            Compression::Gzip
        } else {
            Compression::None
        }
    }
}

/// Wrap `raw` so that reading it yields decompressed bytes
pub fn decompress(raw: ExportStream, compression: Compression) -> Result<ExportStream> {
    match compression {
        Compression::None => Ok(raw),
        Compression::Gzip => Ok(Box::new(GzDecoder::new(raw))),
        Compression::Zip => unzip_first_file(raw),
    }
}

/// Stream the first regular file of a zip archive
///
/// Zip entries are read from the local headers as they arrive, so the
/// archive does not need to be seekable.
fn unzip_first_file(mut raw: ExportStream) -> Result<ExportStream> {
    let reader = spawn_producer("export-unzip", DEFAULT_PIPE_CAPACITY, move |writer| {
        loop {
            let entry = zip::read::read_zipfile_from_stream(&mut raw)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let Some(mut file) = entry else {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "zip archive contains no file entry",
                ));
            };

            if file.is_dir() {
                continue;
            }

            debug!(entry = %file.name(), size = file.size(), "Extracting zip entry");
            io::copy(&mut file, writer)?;
            return Ok(());
        }
    })?;

    Ok(Box::new(reader))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::io::{Cursor, Write};

    const PAYLOAD: &str = "<Statistik>\n  <KoeretoejIdent>1</KoeretoejIdent>\n</Statistik>\n";

    #[test]
    fn test_compression_from_filename() {
        assert_eq!(Compression::from_filename("A-20240101-000000.ZIP"), Compression::Zip);
        assert_eq!(Compression::from_filename("export.xml.gz"), Compression::Gzip);
        assert_eq!(Compression::from_filename("export.xml"), Compression::None);
    }

    #[test]
    fn test_gzip_stream() {
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(PAYLOAD.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut stream = decompress(Box::new(Cursor::new(compressed)), Compression::Gzip).unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        assert_eq!(out, PAYLOAD);
    }

    #[test]
    fn test_zip_stream_skips_directories() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut archive = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::SimpleFileOptions::default();
            archive.add_directory("data/", options).unwrap();
            archive.start_file("data/export.xml", options).unwrap();
            archive.write_all(PAYLOAD.as_bytes()).unwrap();
            archive.finish().unwrap();
        }

        let mut stream =
            decompress(Box::new(Cursor::new(buffer.into_inner())), Compression::Zip).unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        assert_eq!(out, PAYLOAD);
    }

    #[test]
    fn test_corrupt_zip_is_a_read_error() {
        let mut stream =
            decompress(Box::new(Cursor::new(b"not a zip".to_vec())), Compression::Zip).unwrap();
        let mut out = Vec::new();
        assert!(stream.read_to_end(&mut out).is_err());
    }
}
