//! Streaming reader for SVMlight-format text files.
//!
//! Lines look like `+1 3:0.5 12:1 97:2.5`; the leading token is the label
//! (any value > 0 is positive), the rest are one-based or zero-based
//! `feature:value` pairs depending on the file. Feature indices are taken
//! verbatim and must be below the declared feature count. Zero-valued
//! features are omitted from the file and read back as 0.0 through the
//! sparse sample map.

use crate::core::error::{Result, SpdtError};
use crate::core::types::Label;
use crate::dataset::{DataBatch, Sample, StreamingDataset};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Buffered streaming reader over one SVMlight file.
#[derive(Debug)]
pub struct SvmLightReader {
    path: PathBuf,
    reader: BufReader<File>,
    num_features: usize,
    exhausted: bool,
    line_number: usize,
}

impl SvmLightReader {
    /// Opens a file for streaming reads. `num_features` is the dataset
    /// feature-space size, which sparse files cannot self-describe.
    pub fn open<P: AsRef<Path>>(path: P, num_features: usize) -> Result<Self> {
        if num_features == 0 {
            return Err(SpdtError::data_loading("num_features must be at least 1"));
        }
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(SvmLightReader {
            path,
            reader: BufReader::new(file),
            num_features,
            exhausted: false,
            line_number: 0,
        })
    }

    fn parse_line(&self, line: &str) -> Result<Sample> {
        let mut tokens = line.split_whitespace();
        let label_token = tokens.next().ok_or_else(|| {
            SpdtError::data_loading(format!("{}:{}: empty line", self.path.display(), self.line_number))
        })?;
        let raw_label: f64 = label_token.parse().map_err(|_| {
            SpdtError::data_loading(format!(
                "{}:{}: invalid label '{}'",
                self.path.display(),
                self.line_number,
                label_token
            ))
        })?;
        let label = if raw_label > 0.0 {
            Label::Positive
        } else {
            Label::Negative
        };

        let mut sample = Sample::new(label);
        for token in tokens {
            // Trailing comments are allowed by the format.
            if token.starts_with('#') {
                break;
            }
            let (index_str, value_str) = token.split_once(':').ok_or_else(|| {
                SpdtError::data_loading(format!(
                    "{}:{}: malformed feature token '{}'",
                    self.path.display(),
                    self.line_number,
                    token
                ))
            })?;
            let index: usize = index_str.parse().map_err(|_| {
                SpdtError::data_loading(format!(
                    "{}:{}: invalid feature index '{}'",
                    self.path.display(),
                    self.line_number,
                    index_str
                ))
            })?;
            let value: f64 = value_str.parse().map_err(|_| {
                SpdtError::data_loading(format!(
                    "{}:{}: invalid feature value '{}'",
                    self.path.display(),
                    self.line_number,
                    value_str
                ))
            })?;
            if index >= self.num_features {
                return Err(SpdtError::data_loading(format!(
                    "{}:{}: feature index {} out of range (num_features = {})",
                    self.path.display(),
                    self.line_number,
                    index,
                    self.num_features
                )));
            }
            sample.set_value(index, value);
        }
        Ok(sample)
    }
}

impl StreamingDataset for SvmLightReader {
    fn num_features(&self) -> usize {
        self.num_features
    }

    fn has_more_data(&self) -> bool {
        !self.exhausted
    }

    fn next_batch(&mut self, size: usize) -> Result<DataBatch> {
        let mut samples = Vec::with_capacity(size);
        let mut line = String::new();
        while samples.len() < size {
            line.clear();
            let read = self.reader.read_line(&mut line)?;
            if read == 0 {
                self.exhausted = true;
                break;
            }
            self.line_number += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            samples.push(self.parse_line(trimmed)?);
        }
        Ok(DataBatch::from_samples(samples))
    }

    fn reset(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        self.exhausted = false;
        self.line_number = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_reads_labels_and_sparse_values() {
        let file = write_file("+1 0:1.5 3:2\n-1 1:0.25\n\n+1 2:7\n");
        let mut reader = SvmLightReader::open(file.path(), 5).unwrap();

        let batch = reader.next_batch(10).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.positive_label_count(), 2);

        let samples = batch.samples();
        assert_eq!(samples[0].label, Label::Positive);
        assert_eq!(samples[0].value(0), 1.5);
        assert_eq!(samples[0].value(3), 2.0);
        assert_eq!(samples[0].value(4), 0.0);
        assert_eq!(samples[1].label, Label::Negative);
        assert_eq!(samples[1].value(1), 0.25);
    }

    #[test]
    fn test_streaming_in_batches() {
        let lines: String = (0..25)
            .map(|i| format!("{} 0:{}\n", if i % 2 == 0 { "+1" } else { "-1" }, i))
            .collect();
        let file = write_file(&lines);
        let mut reader = SvmLightReader::open(file.path(), 1).unwrap();

        let mut total = 0;
        while reader.has_more_data() {
            let batch = reader.next_batch(10).unwrap();
            total += batch.len();
        }
        assert_eq!(total, 25);

        reader.reset().unwrap();
        assert!(reader.has_more_data());
        assert_eq!(reader.next_batch(100).unwrap().len(), 25);
    }

    #[test]
    fn test_rejects_out_of_range_feature() {
        let file = write_file("+1 9:1\n");
        let mut reader = SvmLightReader::open(file.path(), 3).unwrap();
        let err = reader.next_batch(1).unwrap_err();
        assert_eq!(err.category(), "data_loading");
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        let file = write_file("+1 abc\n");
        let mut reader = SvmLightReader::open(file.path(), 3).unwrap();
        assert!(reader.next_batch(1).is_err());

        let file = write_file("x 0:1\n");
        let mut reader = SvmLightReader::open(file.path(), 3).unwrap();
        assert!(reader.next_batch(1).is_err());
    }
}
