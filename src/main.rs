use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use guia_export::retrieval::RetrievalPayload;
use guia_export::{ExportConfig, export_docx, export_pdf, suggested_filename};
use guia_export::fonts::FontSet;
use guia_export::model::PageGeometry;

/// Export a construction guide record (JSON) to PDF and/or DOCX.
#[derive(Parser)]
#[command(name = "guia-export", version)]
struct Args {
    /// Guide record as JSON (the provider payload shape)
    input: PathBuf,

    /// Directory for the exported files
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    #[arg(short, long, value_enum, default_value = "pdf")]
    format: Format,

    /// Font family to resolve from the system; measurement falls back to
    /// builtin Helvetica metrics when omitted
    #[arg(long)]
    font: Option<String>,

    /// Page width in millimetres
    #[arg(long, default_value_t = 215.9)]
    page_width: f32,

    /// Page height in millimetres
    #[arg(long, default_value_t = 279.4)]
    page_height: f32,

    /// Page margin in millimetres
    #[arg(long, default_value_t = 25.4)]
    margin: f32,
}

#[derive(Clone, Copy, PartialEq, ValueEnum)]
enum Format {
    Pdf,
    Docx,
    Both,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(&args.input)?;
    let guide = RetrievalPayload::from_json(&raw)?.into_guide()?;

    let fonts = match &args.font {
        Some(family) => FontSet::discover(family)?,
        None => FontSet::builtin(),
    };
    let config = ExportConfig {
        geometry: PageGeometry::from_mm(args.page_width, args.page_height, args.margin),
        fonts,
        ..ExportConfig::default()
    };

    if matches!(args.format, Format::Pdf | Format::Both) {
        let bytes = export_pdf(&guide, &config)?;
        let path = args.out_dir.join(suggested_filename(&guide.title, "pdf"));
        std::fs::write(&path, bytes)?;
        println!("{}", path.display());
    }
    if matches!(args.format, Format::Docx | Format::Both) {
        let bytes = export_docx(&guide, &config)?;
        let path = args.out_dir.join(suggested_filename(&guide.title, "docx"));
        std::fs::write(&path, bytes)?;
        println!("{}", path.display());
    }
    Ok(())
}
