// CLI command implementations
use std::io::{self, Write};
use std::path::Path;

use serde_json::{json, Value};
use tracing::debug;
use vgmeta::{ByteSource, ContainerFormat, FileSource, InspectHost, OpenOptions, StreamDescriptor};

use crate::cli::{CliError, CliResult, Commands, Config, OutputFormatter};

/// Run the parsed command line
pub fn run(config: &Config) -> CliResult<()> {
    let formatter = OutputFormatter::new(config.format, config.quiet);
    let check_extension = !config.any_extension;

    match &config.command {
        Commands::Info { files, subsong } => command_info(files, *subsong, check_extension, &formatter),
        Commands::List { file } => command_list(file, check_extension, &formatter),
        Commands::Detect { files } => command_detect(files, &formatter),
        Commands::Batch { directory, pattern } => command_batch(directory, pattern, check_extension, &formatter),
    }
}

fn open_source(file_path: &str) -> CliResult<FileSource> {
    if !Path::new(file_path).exists() {
        return Err(CliError::FileNotFound(file_path.to_string()));
    }
    Ok(FileSource::open(file_path)?)
}

/// JSON view of a descriptor, with the derived fields listings need
fn descriptor_record(file_path: &str, descriptor: &StreamDescriptor) -> CliResult<Value> {
    let mut record = serde_json::to_value(descriptor)?;
    if let Some(obj) = record.as_object_mut() {
        obj.insert("file".to_string(), json!(file_path));
        obj.insert("codec_label".to_string(), json!(descriptor.codec.label()));
        obj.insert("duration_secs".to_string(), json!(descriptor.duration_secs()));
    }
    Ok(record)
}

/// Show the descriptor of one subsong per file
fn command_info(files: &[String], subsong: u32, check_extension: bool, formatter: &OutputFormatter) -> CliResult<()> {
    let options = OpenOptions { subsong, check_extension };
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut failures = 0;

    for file_path in files {
        let result = open_source(file_path).and_then(|source| {
            let descriptor = vgmeta::open_with(&source, &options, &mut InspectHost)?;
            descriptor_record(file_path, &descriptor)
        });
        match result {
            Ok(record) => formatter.output_record(&record, &mut writer)?,
            Err(e) => {
                formatter.print_error(&format!("{}: {}", file_path, e));
                failures += 1;
            }
        }
    }

    if failures == files.len() {
        return Err(CliError::Other(format!("no stream could be opened from {} file(s)", failures)));
    }
    Ok(())
}

/// One row per subsong
fn command_list(file_path: &str, check_extension: bool, formatter: &OutputFormatter) -> CliResult<()> {
    let source = open_source(file_path)?;
    let total = vgmeta::count_subsongs(&source, check_extension)?;
    debug!("{}: {} subsong(s)", file_path, total);

    let mut rows = Vec::new();
    for subsong in 1..=total {
        let options = OpenOptions { subsong, check_extension };
        match vgmeta::open_with(&source, &options, &mut InspectHost) {
            Ok(descriptor) => rows.push(json!({
                "subsong": subsong,
                "name": descriptor.name,
                "channels": descriptor.channels,
                "sample_rate": descriptor.sample_rate,
                "num_samples": descriptor.num_samples,
                "loop": descriptor.loop_flag,
                "codec": descriptor.codec.label(),
                "offset": descriptor.start_offset,
                "size": descriptor.stream_size,
            })),
            Err(e) => formatter.print_error(&format!("{} subsong {}: {}", file_path, subsong, e)),
        }
    }

    let stdout = io::stdout();
    formatter.output_records(&rows, &mut stdout.lock())
}

/// Detect container format
fn command_detect(files: &[String], formatter: &OutputFormatter) -> CliResult<()> {
    let mut records = Vec::with_capacity(files.len());

    for file_path in files {
        let source = match open_source(file_path) {
            Ok(source) => source,
            Err(e) => {
                formatter.print_error(&e.to_string());
                continue;
            }
        };

        let modified = std::fs::metadata(file_path)
            .and_then(|m| m.modified())
            .ok()
            .map(|mtime| {
                chrono::DateTime::<chrono::Utc>::from(mtime)
                    .format("%Y-%m-%d %H:%M:%S UTC")
                    .to_string()
            });

        // magic-only match; set even when validation fails
        let signature = ContainerFormat::ALL.into_iter().find(|f| f.probe(&source)).map(|f| f.name());

        records.push(json!({
            "file": file_path,
            "format": vgmeta::detect(&source).map(|f| f.name()),
            "signature": signature,
            "size": source.size(),
            "modified": modified,
        }));
    }

    let stdout = io::stdout();
    formatter.output_records(&records, &mut stdout.lock())
}

/// Inspect every matching file in a directory
fn command_batch(directory: &str, pattern: &str, check_extension: bool, formatter: &OutputFormatter) -> CliResult<()> {
    use glob::glob;

    let show_progress = !formatter.quiet;

    // Build glob pattern
    let glob_pattern = if pattern.contains('*') || pattern.contains('?') {
        format!("{}/{}", directory, pattern)
    } else {
        format!("{}/**/{}", directory, pattern)
    };

    // Find matching files
    let mut files: Vec<String> = Vec::new();
    for entry in glob(&glob_pattern).map_err(|e| CliError::Other(format!("Invalid glob pattern: {}", e)))? {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    if let Some(path_str) = path.to_str() {
                        files.push(path_str.to_string());
                    }
                }
            }
            Err(e) => {
                formatter.print_error(&format!("Error reading path: {}", e));
            }
        }
    }

    let total = files.len();
    if total == 0 {
        formatter.print_info("No files found matching pattern");
        return Ok(());
    }

    if show_progress {
        formatter.print_info(&format!("Processing {} files...", total));
    }

    let mut rows = Vec::with_capacity(total);
    let mut error_count = 0;

    for (index, file_path) in files.iter().enumerate() {
        if show_progress {
            eprint!("\r[{}/{}] {} ", index + 1, total, file_path);
            io::stderr().flush().ok();
        }

        let result = open_source(file_path).and_then(|source| {
            let subsongs = vgmeta::count_subsongs(&source, check_extension)?;
            let descriptor = vgmeta::open_with(&source, &OpenOptions { subsong: 1, check_extension }, &mut InspectHost)?;
            Ok((subsongs, descriptor))
        });

        match result {
            Ok((subsongs, descriptor)) => rows.push(json!({
                "file": file_path,
                "format": descriptor.format.name(),
                "subsongs": subsongs,
                "codec": descriptor.codec.label(),
                "channels": descriptor.channels,
                "sample_rate": descriptor.sample_rate,
            })),
            Err(e) => {
                if show_progress {
                    eprintln!();
                }
                formatter.print_error(&format!("{}: {}", file_path, e));
                error_count += 1;
            }
        }
    }

    if show_progress {
        eprintln!();
        formatter.print_info(&format!("Completed: {} successful, {} errors", rows.len(), error_count));
    }

    let stdout = io::stdout();
    formatter.output_records(&rows, &mut stdout.lock())
}
