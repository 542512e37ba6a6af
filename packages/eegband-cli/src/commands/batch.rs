use crate::cli::BatchArgs;
use crate::exit_codes;
use crate::output;
use crate::pipeline_args;
use eegband_rs::{SignalPipeline, SignalRecord, SourceKind};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

pub fn execute(args: BatchArgs) -> i32 {
    // Resolve file list
    let files = match resolve_files(&args) {
        Ok(f) => f,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    if files.is_empty() {
        eprintln!("Error: No matching files found");
        return exit_codes::INPUT_ERROR;
    }

    let pipeline = match pipeline_args::build_pipeline(&args.pipeline) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    // Create output directory if specified
    if let Some(ref dir) = args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Error: Failed to create output directory '{}': {}", dir, e);
            return exit_codes::EXECUTION_ERROR;
        }
    }

    let total = files.len();
    if !args.quiet {
        eprintln!("Processing {} file(s)...", total);
    }
    let start_time = Instant::now();

    let results = run_files(&pipeline, &files, !args.continue_on_error);

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    let mut simulated = 0usize;

    for (i, (file_path, result)) in files.iter().zip(results).enumerate() {
        // Skipped files all come after the first failure, which ends the loop
        let Some(result) = result else {
            break;
        };
        if !args.quiet {
            eprintln!("[{}/{}] {}", i + 1, total, file_path);
        }

        let written = result
            .map_err(|e| format!("Analysis failed: {}", e))
            .and_then(|record| {
                emit(&record, file_path, &args)?;
                Ok(record)
            });

        match written {
            Ok(record) => {
                if record.source_kind() == SourceKind::FallbackSimulated {
                    simulated += 1;
                }
                succeeded += 1;
            }
            Err(msg) => {
                eprintln!("  Error: {}", msg);
                failed += 1;
                if !args.continue_on_error {
                    break;
                }
            }
        }
    }

    let elapsed = start_time.elapsed();

    if !args.quiet {
        eprintln!(
            "Batch complete: {}/{} succeeded ({} simulated), {}/{} failed, {:.1}s",
            succeeded,
            total,
            simulated,
            failed,
            total,
            elapsed.as_secs_f64()
        );
    }

    if failed == 0 {
        exit_codes::SUCCESS
    } else if succeeded > 0 {
        exit_codes::PARTIAL_FAILURE
    } else {
        exit_codes::EXECUTION_ERROR
    }
}

/// Analyze files in parallel, returning results in input order.
///
/// With `stop_on_error`, a file is skipped (None) once an earlier file in the
/// list has failed. Every file before the first failure is always analyzed.
fn run_files(
    pipeline: &SignalPipeline,
    files: &[String],
    stop_on_error: bool,
) -> Vec<Option<eegband_rs::Result<SignalRecord>>> {
    let first_failure = AtomicUsize::new(usize::MAX);

    files
        .par_iter()
        .enumerate()
        .map(|(i, file)| {
            if stop_on_error && i > first_failure.load(Ordering::Relaxed) {
                log::debug!("Skipping {} after an earlier failure", file);
                return None;
            }
            let result = pipeline.run(file);
            if stop_on_error && result.is_err() {
                first_failure.fetch_min(i, Ordering::Relaxed);
            }
            Some(result)
        })
        .collect()
}

/// Write one record to its output file, or as a JSON line on stdout
fn emit(record: &SignalRecord, file_path: &str, args: &BatchArgs) -> Result<(), String> {
    match args.output_dir {
        Some(ref dir) => {
            let json = output::to_json(record, args.compact)?;
            let out_path = output::record_path(dir, file_path);
            output::write_output(&json, Some(&out_path))
        }
        None => {
            let json = output::to_json(record, true)?;
            output::write_output(&json, None)
        }
    }
}

fn resolve_files(args: &BatchArgs) -> Result<Vec<String>, String> {
    if let Some(ref pattern) = args.glob {
        resolve_glob(pattern)
    } else if let Some(ref files) = args.files {
        Ok(files.clone())
    } else {
        Err("One of --glob or --files must be specified".to_string())
    }
}

fn resolve_glob(pattern: &str) -> Result<Vec<String>, String> {
    let paths = glob::glob(pattern)
        .map_err(|e| format!("Invalid glob pattern '{}': {}", pattern, e))?;

    let mut files: Vec<String> = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    if let Some(s) = path.to_str() {
                        files.push(s.to_string());
                    }
                }
            }
            Err(e) => {
                log::warn!("glob error: {}", e);
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PipelineArgs;
    use std::fs;

    fn make_batch_args() -> BatchArgs {
        BatchArgs {
            glob: None,
            files: None,
            output_dir: None,
            continue_on_error: false,
            compact: false,
            quiet: true,
            pipeline: PipelineArgs::default(),
        }
    }

    #[test]
    fn test_resolve_files_no_input() {
        let args = make_batch_args();
        let result = resolve_files(&args);
        assert!(result.unwrap_err().contains("must be specified"));
    }

    #[test]
    fn test_resolve_files_explicit_list() {
        let mut args = make_batch_args();
        args.files = Some(vec!["/tmp/a.edf".to_string(), "/tmp/b.csv".to_string()]);
        let result = resolve_files(&args).unwrap();
        assert_eq!(result, vec!["/tmp/a.edf", "/tmp/b.csv"]);
    }

    #[test]
    fn test_resolve_glob_no_matches() {
        let result = resolve_glob("/nonexistent_dir_12345/*.edf").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_resolve_glob_invalid_pattern() {
        assert!(resolve_glob("[").is_err());
    }

    #[test]
    fn test_resolve_glob_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("b.csv"), "").unwrap();
        fs::write(tmp.path().join("a.csv"), "").unwrap();
        fs::write(tmp.path().join("c.edf"), "").unwrap();

        let pattern = format!("{}/*.csv", tmp.path().to_str().unwrap());
        let result = resolve_glob(&pattern).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result[0].ends_with("a.csv"));
        assert!(result[1].ends_with("b.csv"));
    }

    #[test]
    fn test_strict_batch_partial_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("good.csv");
        fs::write(&good, "1,2,3,4,5,6,7,8\n8,7,6,5,4,3,2,1\n").unwrap();
        let bad = tmp.path().join("bad.xyz");
        fs::write(&bad, "").unwrap();

        let mut args = make_batch_args();
        args.files = Some(vec![
            good.to_str().unwrap().to_string(),
            bad.to_str().unwrap().to_string(),
        ]);
        args.output_dir = Some(tmp.path().join("out").to_str().unwrap().to_string());
        args.continue_on_error = true;
        args.pipeline.strict = true;

        assert_eq!(execute(args), exit_codes::PARTIAL_FAILURE);
        assert!(tmp.path().join("out").join("good_bands.json").exists());
        assert!(!tmp.path().join("out").join("bad_bands.json").exists());
    }

    fn strict_pipeline() -> SignalPipeline {
        let args = PipelineArgs {
            strict: true,
            ..Default::default()
        };
        pipeline_args::build_pipeline(&args).unwrap()
    }

    fn csv_files(dir: &std::path::Path, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("rec{}.csv", i));
                fs::write(&path, "1,2,3,4,5,6,7,8\n8,7,6,5,4,3,2,1\n").unwrap();
                path.to_str().unwrap().to_string()
            })
            .collect()
    }

    #[test]
    fn test_stop_on_error_skips_later_files() {
        let tmp = tempfile::tempdir().unwrap();
        let bad = tmp.path().join("bad.xyz");
        fs::write(&bad, "").unwrap();
        let mut files = vec![bad.to_str().unwrap().to_string()];
        files.extend(csv_files(tmp.path(), 6));

        let pipeline = strict_pipeline();
        let single = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let results = single.install(|| run_files(&pipeline, &files, true));

        assert_eq!(results.len(), 7);
        assert!(matches!(results[0], Some(Err(_))));
        assert!(results[1..].iter().all(Option::is_none));
    }

    #[test]
    fn test_files_before_failure_always_run() {
        let tmp = tempfile::tempdir().unwrap();
        let mut files = csv_files(tmp.path(), 5);
        let bad = tmp.path().join("bad.xyz");
        fs::write(&bad, "").unwrap();
        files.push(bad.to_str().unwrap().to_string());

        let results = run_files(&strict_pipeline(), &files, true);
        assert!(results[..5].iter().all(|r| matches!(r, Some(Ok(_)))));
        assert!(matches!(results[5], Some(Err(_))));

        let results = run_files(&strict_pipeline(), &files, false);
        assert!(results.iter().all(Option::is_some));
    }

    #[test]
    fn test_strict_batch_stops_at_first_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let bad = tmp.path().join("bad.xyz");
        fs::write(&bad, "").unwrap();
        let mut files = vec![bad.to_str().unwrap().to_string()];
        files.extend(csv_files(tmp.path(), 3));

        let mut args = make_batch_args();
        args.files = Some(files);
        args.output_dir = Some(tmp.path().join("out").to_str().unwrap().to_string());
        args.pipeline.strict = true;

        assert_eq!(execute(args), exit_codes::EXECUTION_ERROR);
        for i in 0..3 {
            let out = tmp.path().join("out").join(format!("rec{}_bands.json", i));
            assert!(!out.exists());
        }
    }
}
