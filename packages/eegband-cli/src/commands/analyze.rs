use crate::cli::AnalyzeArgs;
use crate::exit_codes;
use crate::output;
use crate::pipeline_args;
use eegband_rs::SourceKind;
use std::path::PathBuf;

pub async fn execute(args: AnalyzeArgs) -> i32 {
    let pipeline = match pipeline_args::build_pipeline(&args.pipeline) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    if !args.quiet {
        eprintln!(
            "Analyzing {} ({} backend)...",
            args.file,
            pipeline.backend_name()
        );
    }

    let result = if pipeline.config().simulate_on_failure {
        Ok(pipeline.process_async(PathBuf::from(&args.file)).await)
    } else {
        pipeline.analyze(&args.file)
    };

    let record = match result {
        Ok(record) => record,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if !args.quiet {
        if record.source_kind() == SourceKind::FallbackSimulated {
            eprintln!(
                "Warning: simulated record, input could not be analyzed ({})",
                record.fallback_reason().unwrap_or("unknown reason")
            );
        }
        eprintln!("  {}", output::describe(&record));
    }

    let json = match output::to_json(&record, args.compact) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error serializing result: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    };

    if let Err(e) = output::write_output(&json, args.output.as_deref()) {
        eprintln!("Error: {}", e);
        return exit_codes::EXECUTION_ERROR;
    }
    if !args.quiet {
        if let Some(ref path) = args.output {
            eprintln!("Results written to {}", path);
        }
    }

    exit_codes::SUCCESS
}
