use eegband_rs::SignalRecord;
use std::io::Write;
use std::path::Path;

/// Write JSON string to stdout or a file.
pub fn write_output(json: &str, output_path: Option<&str>) -> Result<(), String> {
    match output_path {
        Some(path) => std::fs::write(Path::new(path), json)
            .map_err(|e| format!("Failed to write output file '{}': {}", path, e)),
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(json.as_bytes())
                .and_then(|_| handle.write_all(b"\n"))
                .map_err(|e| format!("Failed to write to stdout: {}", e))
        }
    }
}

/// Serialize a value to JSON (pretty or compact).
pub fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<String, String> {
    if compact {
        serde_json::to_string(value).map_err(|e| format!("JSON serialization failed: {}", e))
    } else {
        serde_json::to_string_pretty(value)
            .map_err(|e| format!("JSON serialization failed: {}", e))
    }
}

/// Where a batch result for `input` goes inside `dir`
pub fn record_path(dir: &str, input: &str) -> String {
    let stem = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    Path::new(dir)
        .join(format!("{}_bands.json", stem))
        .display()
        .to_string()
}

/// One-line human summary for stderr
pub fn describe(record: &SignalRecord) -> String {
    let bands = record
        .band_powers()
        .iter()
        .map(|(band, value)| format!("{}={:.2}", band, value))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{} [{}] {} ch, {:.2}s @ {} Hz, quality {:.1}, {}",
        record.file_path(),
        record.source_kind().as_str(),
        record.channel_count(),
        record.duration_seconds(),
        record.sampling_rate_hz(),
        record.quality_score(),
        bands
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_path() {
        assert_eq!(
            record_path("/out", "/data/sub-01_rest.edf"),
            "/out/sub-01_rest_bands.json"
        );
        assert_eq!(record_path("out", "noext"), "out/noext_bands.json");
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&vec![1, 2], true).unwrap();
        assert_eq!(json, "[1,2]");
        assert!(to_json(&vec![1, 2], false).unwrap().contains('\n'));
    }
}
