// ABOUTME: Compression codecs for downloaded dataset exports (gzip, zstd, uncompressed)
// ABOUTME: Streams a compressed file into a plain file without buffering it in memory
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::errors::{AppError, AppResult};
use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Compression applied to the dataset export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetCodec {
    /// `.gz`
    #[default]
    Gzip,
    /// `.zst`
    Zstd,
    /// Plain text
    None,
}

impl DatasetCodec {
    /// Infer the codec from the URL's file suffix; unknown suffixes are plain text
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let path = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .to_ascii_lowercase();
        if path.ends_with(".gz") || path.ends_with(".gzip") {
            Self::Gzip
        } else if path.ends_with(".zst") || path.ends_with(".zstd") {
            Self::Zstd
        } else {
            Self::None
        }
    }

    /// Stream-decode `src` into `dst`, returning the decoded byte count
    ///
    /// `dst` is created or truncated; it is flushed before returning.
    ///
    /// # Errors
    ///
    /// Returns a storage error if either file cannot be opened, or if the
    /// input is not valid for this codec
    pub fn decompress(self, src: &Path, dst: &Path) -> AppResult<u64> {
        let mut input = BufReader::new(File::open(src)?);
        let mut output = BufWriter::new(File::create(dst)?);

        let written = match self {
            Self::Gzip => copy_decoded(&mut MultiGzDecoder::new(input), &mut output),
            Self::Zstd => {
                let mut decoder = zstd::stream::Decoder::with_buffer(input)?;
                copy_decoded(&mut decoder, &mut output)
            }
            Self::None => copy_decoded(&mut input, &mut output),
        }
        .map_err(|e| {
            AppError::storage(format!("Failed to decode {self} dataset: {e}")).with_source(e)
        })?;

        output.flush()?;
        Ok(written)
    }
}

fn copy_decoded(reader: &mut dyn Read, writer: &mut dyn Write) -> std::io::Result<u64> {
    std::io::copy(reader, writer)
}

impl fmt::Display for DatasetCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
            Self::None => "none",
        })
    }
}

impl FromStr for DatasetCodec {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gzip" | "gz" => Ok(Self::Gzip),
            "zstd" | "zst" => Ok(Self::Zstd),
            "none" | "plain" | "csv" => Ok(Self::None),
            other => Err(AppError::invalid_input(format!(
                "Unknown dataset codec '{other}' (expected gzip, zstd or none)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    #[test]
    fn test_codec_from_url_suffix() {
        assert_eq!(
            DatasetCodec::from_url("https://host/products.csv.gz"),
            DatasetCodec::Gzip
        );
        assert_eq!(
            DatasetCodec::from_url("https://host/products.csv.zst?sig=1"),
            DatasetCodec::Zstd
        );
        assert_eq!(
            DatasetCodec::from_url("https://host/products.csv"),
            DatasetCodec::None
        );
    }

    #[test]
    fn test_gzip_and_zstd_decode_to_the_same_text() {
        let dir = tempfile::tempdir().unwrap();
        let text = b"product_name,energy_100g\nrice,544\n";

        let gz_path = dir.path().join("data.csv.gz");
        let mut encoder = GzEncoder::new(File::create(&gz_path).unwrap(), Compression::fast());
        encoder.write_all(text).unwrap();
        encoder.finish().unwrap();

        let zst_path = dir.path().join("data.csv.zst");
        std::fs::write(&zst_path, zstd::encode_all(&text[..], 3).unwrap()).unwrap();

        for (codec, src) in [(DatasetCodec::Gzip, &gz_path), (DatasetCodec::Zstd, &zst_path)] {
            let out = dir.path().join(format!("{codec}.csv"));
            let written = codec.decompress(src, &out).unwrap();
            assert_eq!(written, text.len() as u64);
            assert_eq!(std::fs::read(&out).unwrap(), text);
        }
    }

    #[test]
    fn test_corrupt_gzip_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("broken.gz");
        std::fs::write(&src, b"definitely not gzip").unwrap();
        let err = DatasetCodec::Gzip
            .decompress(&src, &dir.path().join("out.csv"))
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::StorageError);
    }
}
