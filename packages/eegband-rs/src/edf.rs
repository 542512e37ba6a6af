// EDF / BDF (European Data Format, BioSemi Data Format) reader
// Specification: https://www.edfplus.info/specs/edf.html
// BDF is identical except for 24-bit samples and a 0xFF "BIOSEMI" version field.

use crate::error::{EegError, Result};
use crate::format::FileFormat;
use crate::types::DecodedSignal;
use memmap2::Mmap;
use rayon::prelude::*;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

const MAIN_HEADER_BYTES: usize = 256;
const SIGNAL_HEADER_BYTES: usize = 256;
const BDF_VERSION: &[u8; 8] = b"\xffBIOSEMI";

#[derive(Debug, Clone)]
pub struct EdfHeader {
    pub version: String,              // 8 bytes: version of this data format (0)
    pub patient_id: String,           // 80 bytes: local patient identification
    pub recording_id: String,         // 80 bytes: local recording identification
    pub start_date: String,           // 8 bytes: startdate of recording (dd.mm.yy)
    pub start_time: String,           // 8 bytes: starttime of recording (hh.mm.ss)
    pub header_bytes: usize,          // 8 bytes: number of bytes in header record
    pub reserved: String,             // 44 bytes: reserved ("EDF+C", "24BIT", ...)
    pub num_data_records: i64,        // 8 bytes: number of data records (-1 if unknown)
    pub duration_of_data_record: f64, // 8 bytes: duration of a data record, in seconds
    pub num_signals: usize,           // 4 bytes: number of signals (channels)
}

#[derive(Debug, Clone)]
pub struct EdfSignalHeader {
    pub label: String,                 // 16 bytes: label (e.g. EEG Fpz-Cz)
    pub transducer_type: String,       // 80 bytes
    pub physical_dimension: String,    // 8 bytes: physical dimension (e.g. uV)
    pub physical_minimum: f64,         // 8 bytes
    pub physical_maximum: f64,         // 8 bytes
    pub digital_minimum: i64,          // 8 bytes
    pub digital_maximum: i64,          // 8 bytes
    pub prefiltering: String,          // 80 bytes
    pub num_samples_per_record: usize, // 8 bytes: number of samples in each data record
}

impl EdfSignalHeader {
    pub fn sample_frequency(&self, record_duration: f64) -> f64 {
        self.num_samples_per_record as f64 / record_duration
    }

    pub fn gain(&self) -> f64 {
        (self.physical_maximum - self.physical_minimum)
            / (self.digital_maximum - self.digital_minimum) as f64
    }

    pub fn offset(&self) -> f64 {
        self.physical_maximum - self.gain() * self.digital_maximum as f64
    }

    /// EDF+/BDF+ annotation channels carry TAL text, not samples
    pub fn is_annotation(&self) -> bool {
        self.label == "EDF Annotations" || self.label == "BDF Annotations"
    }
}

/// Reads fixed-width ASCII header fields in order
struct HeaderCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> HeaderCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos + len;
        let field = self.bytes.get(self.pos..end).ok_or_else(|| {
            EegError::Decode(format!(
                "header truncated at byte {} (file has {} bytes)",
                self.pos,
                self.bytes.len()
            ))
        })?;
        self.pos = end;
        Ok(field)
    }

    fn string(&mut self, len: usize) -> Result<String> {
        Ok(String::from_utf8_lossy(self.take(len)?).trim().to_string())
    }

    fn number<T: FromStr>(&mut self, len: usize, what: &str) -> Result<T> {
        let raw = self.string(len)?;
        raw.parse::<T>()
            .map_err(|_| EegError::Decode(format!("invalid {} '{}'", what, raw)))
    }

    fn numbers<T: FromStr>(&mut self, count: usize, len: usize, what: &str) -> Result<Vec<T>> {
        (0..count).map(|_| self.number(len, what)).collect()
    }

    fn strings(&mut self, count: usize, len: usize) -> Result<Vec<String>> {
        (0..count).map(|_| self.string(len)).collect()
    }
}

/// Parse the main header and all signal headers from the start of a file
pub fn parse_headers(bytes: &[u8]) -> Result<(EdfHeader, Vec<EdfSignalHeader>)> {
    let mut cursor = HeaderCursor::new(bytes);

    let version = cursor.string(8)?;
    let patient_id = cursor.string(80)?;
    let recording_id = cursor.string(80)?;
    let start_date = cursor.string(8)?;
    let start_time = cursor.string(8)?;
    let header_bytes: usize = cursor.number(8, "header byte count")?;
    let reserved = cursor.string(44)?;
    let num_data_records: i64 = cursor.number(8, "number of data records")?;
    let duration_of_data_record: f64 = cursor.number(8, "data record duration")?;
    let num_signals: usize = cursor.number(4, "number of signals")?;

    log::debug!(
        "EDF header parsed: num_data_records={}, duration_of_data_record={}, num_signals={}",
        num_data_records,
        duration_of_data_record,
        num_signals
    );

    if num_signals == 0 {
        return Err(EegError::Decode("file declares zero signals".to_string()));
    }
    if !(duration_of_data_record.is_finite() && duration_of_data_record > 0.0) {
        return Err(EegError::Decode(format!(
            "data record duration must be positive, got {}",
            duration_of_data_record
        )));
    }
    let expected_header_bytes = MAIN_HEADER_BYTES + num_signals * SIGNAL_HEADER_BYTES;
    if header_bytes != expected_header_bytes {
        return Err(EegError::Decode(format!(
            "header declares {} bytes but {} signals need {}",
            header_bytes, num_signals, expected_header_bytes
        )));
    }

    // Signal header fields are stored field-major: all labels, then all transducers, ...
    let labels = cursor.strings(num_signals, 16)?;
    let transducer_types = cursor.strings(num_signals, 80)?;
    let physical_dimensions = cursor.strings(num_signals, 8)?;
    let physical_minimums: Vec<f64> = cursor.numbers(num_signals, 8, "physical minimum")?;
    let physical_maximums: Vec<f64> = cursor.numbers(num_signals, 8, "physical maximum")?;
    let digital_minimums: Vec<i64> = cursor.numbers(num_signals, 8, "digital minimum")?;
    let digital_maximums: Vec<i64> = cursor.numbers(num_signals, 8, "digital maximum")?;
    let prefilterings = cursor.strings(num_signals, 80)?;
    let samples_per_record: Vec<usize> = cursor.numbers(num_signals, 8, "samples per record")?;
    cursor.take(num_signals * 32)?; // reserved

    let signal_headers: Vec<EdfSignalHeader> = (0..num_signals)
        .map(|i| EdfSignalHeader {
            label: labels[i].clone(),
            transducer_type: transducer_types[i].clone(),
            physical_dimension: physical_dimensions[i].clone(),
            physical_minimum: physical_minimums[i],
            physical_maximum: physical_maximums[i],
            digital_minimum: digital_minimums[i],
            digital_maximum: digital_maximums[i],
            prefiltering: prefilterings[i].clone(),
            num_samples_per_record: samples_per_record[i],
        })
        .collect();

    for sh in signal_headers.iter().filter(|sh| !sh.is_annotation()) {
        if sh.digital_maximum <= sh.digital_minimum {
            return Err(EegError::Decode(format!(
                "signal '{}' has digital range [{}, {}]",
                sh.label, sh.digital_minimum, sh.digital_maximum
            )));
        }
    }

    Ok((
        EdfHeader {
            version,
            patient_id,
            recording_id,
            start_date,
            start_time,
            header_bytes,
            reserved,
            num_data_records,
            duration_of_data_record,
            num_signals,
        },
        signal_headers,
    ))
}

/// Decode one little-endian two's complement sample of 2 (EDF) or 3 (BDF) bytes
#[inline]
fn decode_sample(bytes: &[u8]) -> Result<i32> {
    match *bytes {
        [lo, hi] => Ok(i16::from_le_bytes([lo, hi]) as i32),
        [lo, mid, hi] => {
            let raw = (lo as i32) | ((mid as i32) << 8) | ((hi as i32) << 16);
            Ok((raw << 8) >> 8)
        }
        _ => Err(EegError::Decode(format!(
            "unsupported sample width of {} bytes",
            bytes.len()
        ))),
    }
}

pub struct EdfReader {
    mmap: Mmap,
    pub header: EdfHeader,
    pub signal_headers: Vec<EdfSignalHeader>,
    sample_width: usize,
    num_records: usize,
}

impl EdfReader {
    /// Map `path` and parse its headers. `expected` is the format picked by the
    /// dispatcher; the version field wins if the two disagree.
    pub fn open(path: &Path, expected: FileFormat) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and lives as long as the reader.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < MAIN_HEADER_BYTES {
            return Err(EegError::Decode(format!(
                "file is {} bytes, shorter than the {}-byte main header",
                mmap.len(),
                MAIN_HEADER_BYTES
            )));
        }

        let is_bdf = &mmap[..8] == BDF_VERSION;
        let detected = if is_bdf { FileFormat::Bdf } else { FileFormat::Edf };
        if detected != expected {
            log::warn!(
                "{} has a {} version field but was dispatched as {}; decoding as {}",
                path.display(),
                detected.label(),
                expected.label(),
                detected.label()
            );
        }
        let sample_width = detected.sample_width().unwrap_or(2);

        let (header, signal_headers) = parse_headers(&mmap)?;

        let record_bytes: usize = signal_headers
            .iter()
            .map(|sh| sh.num_samples_per_record * sample_width)
            .sum();
        if record_bytes == 0 {
            return Err(EegError::Decode("data records are empty".to_string()));
        }

        let available = (mmap.len() - header.header_bytes.min(mmap.len())) / record_bytes;
        let num_records = if header.num_data_records < 0 {
            log::debug!("Record count unknown, derived {} from file size", available);
            available
        } else {
            let declared = header.num_data_records as usize;
            if declared > available {
                return Err(EegError::Decode(format!(
                    "header declares {} data records but file holds {}",
                    declared, available
                )));
            }
            declared
        };
        if num_records == 0 {
            return Err(EegError::Decode("file contains no data records".to_string()));
        }

        Ok(Self {
            mmap,
            header,
            signal_headers,
            sample_width,
            num_records,
        })
    }

    pub fn format(&self) -> FileFormat {
        if self.sample_width == 3 {
            FileFormat::Bdf
        } else {
            FileFormat::Edf
        }
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    pub fn total_duration(&self) -> f64 {
        self.num_records as f64 * self.header.duration_of_data_record
    }

    /// Indices of the signals that go into the matrix: non-annotation signals
    /// sharing the sample rate of the first one.
    pub fn data_signal_indices(&self) -> Vec<usize> {
        let mut data_signals = self
            .signal_headers
            .iter()
            .enumerate()
            .filter(|(_, sh)| !sh.is_annotation());

        let Some((first_idx, first)) = data_signals.next() else {
            return Vec::new();
        };
        let rate = first.num_samples_per_record;

        let mut indices = vec![first_idx];
        for (idx, sh) in data_signals {
            if sh.num_samples_per_record == rate {
                indices.push(idx);
            } else {
                log::warn!(
                    "Skipping signal '{}': {} samples/record differs from {}",
                    sh.label,
                    sh.num_samples_per_record,
                    rate
                );
            }
        }
        indices
    }

    /// Read every sample of one signal, converted to physical units
    pub fn read_physical_signal(&self, signal_index: usize) -> Result<Vec<f64>> {
        let sh = self.signal_headers.get(signal_index).ok_or_else(|| {
            EegError::InvalidParameter(format!("signal index {} out of bounds", signal_index))
        })?;

        let width = self.sample_width;
        let record_bytes: usize = self
            .signal_headers
            .iter()
            .map(|h| h.num_samples_per_record * width)
            .sum();
        let offset_in_record: usize = self.signal_headers[..signal_index]
            .iter()
            .map(|h| h.num_samples_per_record * width)
            .sum();
        let signal_bytes = sh.num_samples_per_record * width;

        let gain = sh.gain();
        let offset = sh.offset();
        let mut samples = Vec::with_capacity(self.num_records * sh.num_samples_per_record);

        for record in 0..self.num_records {
            let start = self.header.header_bytes + record * record_bytes + offset_in_record;
            let chunk = self.mmap.get(start..start + signal_bytes).ok_or_else(|| {
                EegError::Decode(format!("data record {} is truncated", record))
            })?;
            for raw in chunk.chunks_exact(width) {
                samples.push(gain * decode_sample(raw)? as f64 + offset);
            }
        }

        Ok(samples)
    }

    /// Decode all data signals into a `[channel][sample]` matrix
    pub fn read_all(&self) -> Result<DecodedSignal> {
        let indices = self.data_signal_indices();
        if indices.is_empty() {
            return Err(EegError::Decode("file has no data signals".to_string()));
        }

        let first = &self.signal_headers[indices[0]];
        let sample_rate = first.sample_frequency(self.header.duration_of_data_record);

        // Channels are independent, convert them in parallel
        let data = indices
            .par_iter()
            .map(|&idx| self.read_physical_signal(idx))
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let channel_names = indices
            .iter()
            .map(|&idx| self.signal_headers[idx].label.clone())
            .collect();

        log::info!(
            "Decoded {} file: {} channels x {} samples at {} Hz",
            self.format().label(),
            data.len(),
            data.first().map(|c| c.len()).unwrap_or(0),
            sample_rate
        );

        Ok(DecodedSignal {
            data,
            sample_rate,
            channel_names,
            format: self.format(),
            processing_method: format!("native {} decoder", self.format().label()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal_header(label: &str) -> EdfSignalHeader {
        EdfSignalHeader {
            label: label.to_string(),
            transducer_type: "".to_string(),
            physical_dimension: "uV".to_string(),
            physical_minimum: -100.0,
            physical_maximum: 100.0,
            digital_minimum: -32768,
            digital_maximum: 32767,
            prefiltering: "".to_string(),
            num_samples_per_record: 256,
        }
    }

    #[test]
    fn test_signal_header_calculations() {
        let header = signal_header("Fp1");

        assert_eq!(header.sample_frequency(1.0), 256.0);
        assert!((header.gain() - 0.00305).abs() < 0.001);
        let max = header.gain() * 32767.0 + header.offset();
        assert!((max - 100.0).abs() < 1e-9);
        let min = header.gain() * -32768.0 + header.offset();
        assert!((min + 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_annotation_detection() {
        assert!(signal_header("EDF Annotations").is_annotation());
        assert!(signal_header("BDF Annotations").is_annotation());
        assert!(!signal_header("EEG Fpz-Cz").is_annotation());
    }

    #[test]
    fn test_decode_sample_widths() {
        assert_eq!(decode_sample(&[0x01, 0x00]).unwrap(), 1);
        assert_eq!(decode_sample(&[0xff, 0xff]).unwrap(), -1);
        assert_eq!(decode_sample(&[0x00, 0x80]).unwrap(), -32768);
        assert_eq!(decode_sample(&[0x01, 0x00, 0x00]).unwrap(), 1);
        assert_eq!(decode_sample(&[0xff, 0xff, 0xff]).unwrap(), -1);
        assert_eq!(decode_sample(&[0x00, 0x00, 0x80]).unwrap(), -8_388_608);
        assert_eq!(decode_sample(&[0xff, 0xff, 0x7f]).unwrap(), 8_388_607);
    }

    #[test]
    fn test_decode_sample_rejects_other_widths() {
        for bytes in [&[][..], &[0x01][..], &[0x01, 0x02, 0x03, 0x04][..]] {
            let err = decode_sample(bytes).unwrap_err();
            assert!(matches!(err, EegError::Decode(_)));
        }
    }

    #[test]
    fn test_parse_headers_rejects_short_input() {
        let err = parse_headers(&[b' '; 100]).unwrap_err();
        assert!(matches!(err, EegError::Decode(_)));
    }

    #[test]
    fn test_parse_headers_rejects_garbage_numbers() {
        let mut bytes = vec![b' '; 512];
        bytes[184..192].copy_from_slice(b"abcdefgh");
        let err = parse_headers(&bytes).unwrap_err();
        assert!(err.to_string().contains("header byte count"));
    }
}
