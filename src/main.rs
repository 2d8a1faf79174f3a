use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use embedded_resource::logging::{init_tracing, init_tracing_json};
use embedded_resource::{
    decode_text, CpuType, ErrorKind, ExtractConfig, MachOImage, ResourceError, Section,
    SectionReader, SegmentedImage,
};

/// Print a string embedded in a named section of a Mach-O executable.
#[derive(Parser, Debug)]
#[command(name = "embeddedresourcetool", version, about)]
struct Cli {
    /// Image to inspect. Defaults to this executable.
    path: Option<PathBuf>,

    /// Segment holding the section.
    #[arg(long)]
    segment: Option<String>,

    /// Section to extract.
    #[arg(long)]
    section: Option<String>,

    /// Architecture to use from a fat binary (x86_64, arm64, ...).
    #[arg(long)]
    cpu: Option<CpuType>,

    /// JSON file with extraction settings; flags take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep trailing NUL padding.
    #[arg(long)]
    raw: bool,

    /// Print the section bytes as hex instead of decoding them.
    #[arg(long, conflicts_with = "raw")]
    hex: bool,

    /// List every segment and section instead of extracting one.
    #[arg(long, conflicts_with_all = ["hex", "raw"])]
    list: bool,

    /// Output format.
    #[arg(long, value_enum, default_value = "human")]
    output: OutputFormat,

    /// Emit logs as JSON on stderr.
    #[arg(long)]
    log_json: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    #[default]
    Human,
}

#[derive(Serialize)]
struct Extracted<'a> {
    path: String,
    segment: &'a str,
    section: &'a str,
    offset: u64,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hex: Option<String>,
}

#[derive(Serialize)]
struct Listing<'a> {
    path: String,
    segments: Vec<&'a str>,
    sections: Vec<&'a Section>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.log_json {
        init_tracing_json(None);
    } else {
        init_tracing(None);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = exit_code(e.kind());
            emit_error(cli.output, code, &e);
            ExitCode::from(code)
        }
    }
}

fn run(cli: &Cli) -> Result<(), ResourceError> {
    let mut config = match &cli.config {
        Some(path) => ExtractConfig::from_json_file(path)?,
        None => ExtractConfig::default(),
    };
    if let Some(segment) = &cli.segment {
        config.segment = segment.clone();
    }
    if let Some(section) = &cli.section {
        config.section = section.clone();
    }
    if cli.cpu.is_some() {
        config.cpu = cli.cpu;
    }
    if cli.raw {
        config.trim_trailing_nul = false;
    }

    let path = match &cli.path {
        Some(path) => path.clone(),
        None => std::env::current_exe()?,
    };

    let image = MachOImage::load(&path, &config)?;
    let reader = SectionReader::new(&image, config.max_section_size);

    if cli.list {
        let listing = Listing {
            path: path.display().to_string(),
            segments: image.segments().iter().map(|s| s.name.as_str()).collect(),
            sections: reader.index().entries(),
        };
        return emit_listing(cli.output, &listing);
    }

    let section = reader.index().lookup(&config.segment, &config.section)?;
    let bytes = reader.read(&config.segment, &config.section)?;
    let (text, hex) = if cli.hex {
        (None, Some(hex::encode(&bytes)))
    } else {
        (Some(decode_text(&bytes, config.trim_trailing_nul)?), None)
    };

    let extracted = Extracted {
        path: path.display().to_string(),
        segment: &config.segment,
        section: &config.section,
        offset: section.offset,
        size: section.size,
        text,
        hex,
    };
    match cli.output {
        OutputFormat::Json => print_json(&extracted)?,
        OutputFormat::Human => {
            if let Some(value) = extracted.text.as_ref().or(extracted.hex.as_ref()) {
                println!("{}", value);
            }
        }
    }
    Ok(())
}

fn emit_listing(format: OutputFormat, listing: &Listing<'_>) -> Result<(), ResourceError> {
    match format {
        OutputFormat::Json => print_json(listing),
        OutputFormat::Human => {
            println!("{}", listing.path);
            for segment in &listing.segments {
                println!("segment {}", segment);
            }
            for section in &listing.sections {
                match section.file_range() {
                    Some(range) => println!(
                        "  {},{}  offset={:#x} size={}",
                        section.segment_name,
                        section.name,
                        range.start,
                        section.size
                    ),
                    None => println!(
                        "  {},{}  zerofill size={}",
                        section.segment_name, section.name, section.size
                    ),
                }
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ResourceError> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Io => 1,
        ErrorKind::Format => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Encoding => 4,
        ErrorKind::Limit | ErrorKind::Config => 5,
    }
}

/// JSON errors go to stdout so callers always get valid JSON there.
fn emit_error(format: OutputFormat, code: u8, err: &ResourceError) {
    match format {
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "error": err.to_string(),
                "exit_code": code,
            });
            println!("{}", obj);
        }
        OutputFormat::Human => eprintln!("error: {}", err),
    }
}
