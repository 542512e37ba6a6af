//! Fixture writers shared by the integration tests
#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

pub struct FixtureSignal {
    pub label: String,
    pub samples_per_record: usize,
    pub physical: (f64, f64),
    pub digital: (i64, i64),
    /// Digital samples for the whole recording
    pub samples: Vec<i32>,
}

/// Builds small EDF/BDF files byte by byte
pub struct EdfFixture {
    bdf: bool,
    record_duration: f64,
    unknown_record_count: bool,
    signals: Vec<FixtureSignal>,
}

impl EdfFixture {
    pub fn edf() -> Self {
        Self {
            bdf: false,
            record_duration: 1.0,
            unknown_record_count: false,
            signals: Vec::new(),
        }
    }

    pub fn bdf() -> Self {
        Self {
            bdf: true,
            ..Self::edf()
        }
    }

    fn digital_range(&self) -> (i64, i64) {
        if self.bdf {
            (-8_388_608, 8_388_607)
        } else {
            (-32_768, 32_767)
        }
    }

    /// Add a signal whose physical values equal its digital values
    pub fn signal(mut self, label: &str, samples_per_record: usize, samples: Vec<i32>) -> Self {
        let digital = self.digital_range();
        self.signals.push(FixtureSignal {
            label: label.to_string(),
            samples_per_record,
            physical: (digital.0 as f64, digital.1 as f64),
            digital,
            samples,
        });
        self
    }

    pub fn scaled_signal(
        mut self,
        label: &str,
        samples_per_record: usize,
        physical: (f64, f64),
        digital: (i64, i64),
        samples: Vec<i32>,
    ) -> Self {
        self.signals.push(FixtureSignal {
            label: label.to_string(),
            samples_per_record,
            physical,
            digital,
            samples,
        });
        self
    }

    /// Add an EDF+/BDF+ annotation signal filled with zeros
    pub fn annotations(mut self, samples_per_record: usize) -> Self {
        let label = if self.bdf { "BDF Annotations" } else { "EDF Annotations" };
        let digital = self.digital_range();
        let records = self.num_records();
        self.signals.push(FixtureSignal {
            label: label.to_string(),
            samples_per_record,
            physical: (-1.0, 1.0),
            digital,
            samples: vec![0; records * samples_per_record],
        });
        self
    }

    pub fn record_duration(mut self, seconds: f64) -> Self {
        self.record_duration = seconds;
        self
    }

    /// Write -1 in the record-count field
    pub fn unknown_record_count(mut self) -> Self {
        self.unknown_record_count = true;
        self
    }

    pub fn num_records(&self) -> usize {
        self.signals
            .first()
            .map(|s| s.samples.len() / s.samples_per_record)
            .unwrap_or(0)
    }

    fn fixed(buffer: &mut Vec<u8>, s: &str, size: usize) {
        let mut field = vec![b' '; size];
        let bytes = s.as_bytes();
        let len = bytes.len().min(size);
        field[..len].copy_from_slice(&bytes[..len]);
        buffer.extend_from_slice(&field);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let ns = self.signals.len();
        let num_records = self.num_records();
        let mut out = Vec::new();

        if self.bdf {
            out.push(0xff);
            out.extend_from_slice(b"BIOSEMI");
        } else {
            Self::fixed(&mut out, "0", 8);
        }
        Self::fixed(&mut out, "X X X X", 80);
        Self::fixed(&mut out, "Startdate 01-JAN-2024 X X X", 80);
        Self::fixed(&mut out, "01.01.24", 8);
        Self::fixed(&mut out, "00.00.00", 8);
        Self::fixed(&mut out, &(256 + ns * 256).to_string(), 8);
        Self::fixed(&mut out, if self.bdf { "24BIT" } else { "" }, 44);
        let records_field = if self.unknown_record_count {
            "-1".to_string()
        } else {
            num_records.to_string()
        };
        Self::fixed(&mut out, &records_field, 8);
        let mut duration_field = format!("{}", self.record_duration);
        if duration_field.len() > 8 {
            duration_field = format!("{:e}", self.record_duration);
        }
        Self::fixed(&mut out, &duration_field, 8);
        Self::fixed(&mut out, &ns.to_string(), 4);

        for s in &self.signals {
            Self::fixed(&mut out, &s.label, 16);
        }
        for _ in &self.signals {
            Self::fixed(&mut out, "AgAgCl electrode", 80);
        }
        for _ in &self.signals {
            Self::fixed(&mut out, "uV", 8);
        }
        for s in &self.signals {
            Self::fixed(&mut out, &format!("{}", s.physical.0), 8);
        }
        for s in &self.signals {
            Self::fixed(&mut out, &format!("{}", s.physical.1), 8);
        }
        for s in &self.signals {
            Self::fixed(&mut out, &s.digital.0.to_string(), 8);
        }
        for s in &self.signals {
            Self::fixed(&mut out, &s.digital.1.to_string(), 8);
        }
        for _ in &self.signals {
            Self::fixed(&mut out, "HP:0.1Hz", 80);
        }
        for s in &self.signals {
            Self::fixed(&mut out, &s.samples_per_record.to_string(), 8);
        }
        for _ in &self.signals {
            Self::fixed(&mut out, "", 32);
        }

        for record in 0..num_records {
            for s in &self.signals {
                let start = record * s.samples_per_record;
                for &value in &s.samples[start..start + s.samples_per_record] {
                    let bytes = value.to_le_bytes();
                    if self.bdf {
                        out.extend_from_slice(&bytes[..3]);
                    } else {
                        out.extend_from_slice(&bytes[..2]);
                    }
                }
            }
        }
        out
    }

    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.to_bytes()).unwrap();
        path
    }
}

pub fn write_text(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Standard normal samples via Box-Muller, reproducible from `seed`
pub fn gaussian_noise(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let u1: f64 = rng.random_range(f64::EPSILON..1.0);
            let u2: f64 = rng.random_range(0.0..1.0);
            (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
        })
        .collect()
}

pub fn sine_digital(freq: f64, sample_rate: f64, n: usize, amplitude: f64) -> Vec<i32> {
    (0..n)
        .map(|i| (amplitude * (2.0 * PI * freq * i as f64 / sample_rate).sin()).round() as i32)
        .collect()
}

/// Comma-separated matrix, one row per channel
pub fn csv_matrix(rows: &[Vec<f64>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|v| format!("{:.6}", v))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
