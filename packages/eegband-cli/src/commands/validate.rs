use crate::cli::ValidateArgs;
use crate::exit_codes;
use crate::output;
use eegband_rs::{FileFormat, SourceKind};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ValidateOutput {
    file: String,
    exists: bool,
    readable: bool,
    supported: bool,
    format: Option<String>,
    strategy: Option<String>,
    size_bytes: Option<u64>,
    error: Option<String>,
}

pub fn execute(args: ValidateArgs) -> i32 {
    let path = Path::new(&args.file);

    let exists = path.exists();
    let readable = path.is_file() && std::fs::File::open(path).is_ok();

    let format = FileFormat::from_path(path);
    let supported = format.is_ok();

    let size_bytes = if readable {
        std::fs::metadata(path).ok().map(|m| m.len())
    } else {
        None
    };

    let error = if !exists {
        Some(format!("File not found: {}", args.file))
    } else if !readable {
        Some(format!("File is not readable: {}", args.file))
    } else if let Err(ref e) = format {
        Some(e.to_string())
    } else {
        None
    };

    let format = format.ok();
    let result = ValidateOutput {
        file: args.file.clone(),
        exists,
        readable,
        supported,
        format: format.map(|f| f.label().to_string()),
        strategy: format.map(|f| SourceKind::from(f).as_str().to_string()),
        size_bytes,
        error: error.clone(),
    };

    if args.json {
        match output::to_json(&result, false) {
            Ok(json) => {
                if let Err(e) = output::write_output(&json, None) {
                    eprintln!("Error: {}", e);
                    return exit_codes::EXECUTION_ERROR;
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return exit_codes::EXECUTION_ERROR;
            }
        }
    } else if let Some(ref err) = error {
        eprintln!("Error: {}", err);
    } else {
        println!(
            "File '{}' is valid ({}, {} bytes)",
            args.file,
            result.format.as_deref().unwrap_or_default(),
            size_bytes.unwrap_or(0)
        );
    }

    if error.is_some() {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::SUCCESS
    }
}
