use crate::cli::FormatsArgs;
use crate::exit_codes;
use crate::output;
use eegband_rs::format::{NATIVE_EXTENSIONS, TEXT_EXTENSIONS};
use eegband_rs::{FileFormat, SourceKind};
use serde::Serialize;

#[derive(Serialize)]
struct FormatInfo {
    extension: &'static str,
    format: &'static str,
    strategy: &'static str,
    sample_bits: Option<usize>,
}

fn formats() -> Vec<FormatInfo> {
    NATIVE_EXTENSIONS
        .iter()
        .chain(TEXT_EXTENSIONS)
        .filter_map(|&ext| {
            FileFormat::from_extension(ext).map(|format| FormatInfo {
                extension: ext,
                format: format.label(),
                strategy: SourceKind::from(format).as_str(),
                sample_bits: format.sample_width().map(|w| w * 8),
            })
        })
        .collect()
}

pub fn execute(args: FormatsArgs) -> i32 {
    let formats = formats();

    if args.json {
        match output::to_json(&formats, false) {
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
    } else {
        println!("Supported formats:\n");
        println!("  {:<6} {:<16} {:<16} {:<6}", "Ext", "Format", "Strategy", "Bits");
        println!("  {}", "-".repeat(48));
        for f in &formats {
            println!(
                "  {:<6} {:<16} {:<16} {:<6}",
                f.extension,
                f.format,
                f.strategy,
                f.sample_bits.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string())
            );
        }
        println!();
        println!("Delimited text is probed for whitespace, comma, tab, then semicolon.");
        println!("Its sampling rate is not stored in the file; see --sample-rate.");
    }

    exit_codes::SUCCESS
}
