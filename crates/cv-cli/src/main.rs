//! CadView command-line entry point

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use cv_core::{
    AppConfig, Application, ApplicationItem, DocumentItem, ExportOptions, ItemContent,
    PartFormat, ProgressSink, ProgressTracker, PropertyOwner, StlFormat, StlWriterBackend,
    TreeTraversal, find_part_format, traverse_tree,
};

#[derive(Parser, Debug)]
#[command(name = "cv")]
#[command(about = "Inspect and convert IGES, STEP, BRep and STL files")]
struct Cli {
    /// Configuration file (ron)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the detected format of each file
    Detect {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Import a file and print its items
    Import { file: PathBuf },
    /// Import a file and export it again, format taken from the output extension
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Write ASCII STL
        #[arg(long, conflicts_with = "binary")]
        ascii: bool,
        /// Write binary STL
        #[arg(long)]
        binary: bool,
        /// Use the single-solid STL writer
        #[arg(long)]
        restricted: bool,
    },
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cv_core=info,cv_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => AppConfig::load(path).map_err(|e| e.to_string())?,
        None => AppConfig::default(),
    };

    match cli.command {
        Command::Detect { files } => detect(&config, &files),
        Command::Import { file } => import(config, &file),
        Command::Convert {
            input,
            output,
            ascii,
            binary,
            restricted,
        } => {
            let format = match (ascii, binary) {
                (true, _) => Some(StlFormat::Ascii),
                (_, true) => Some(StlFormat::Binary),
                _ => None,
            };
            convert(config, &input, &output, format, restricted)
        }
    }
}

fn detect(config: &AppConfig, paths: &[PathBuf]) -> Result<(), String> {
    for path in paths {
        match find_part_format(path, config.sniff_len) {
            Ok(format) => println!("{}: {}", path.display(), format),
            Err(e) => println!("{}: {}", path.display(), e),
        }
    }
    Ok(())
}

fn import(config: AppConfig, path: &Path) -> Result<(), String> {
    let mut app = Application::new(config).map_err(|e| e.to_string())?;
    let progress: Arc<dyn ProgressSink> = Arc::new(ProgressTracker::new());
    let (doc, result) = app.open_document(path, progress);
    if let Err(e) = &result {
        tracing::warn!("{}", e);
    }

    let document = app
        .document(doc)
        .ok_or_else(|| format!("Document {} vanished", doc))?;
    println!("Document '{}' ({} items)", document.label(), document.item_count());
    for item in document.items() {
        print_item(item);
    }
    result.map(|_| ()).map_err(|e| e.to_string())
}

fn print_item(item: &DocumentItem) {
    println!("- {} [{}]", item.label(), item.kind().name());
    for (_, property) in item.properties().iter() {
        println!("    {}: {}", property.label(), property.describe());
    }

    if let ItemContent::Assembly(assembly) = item.content() {
        let mut depth = 0usize;
        traverse_tree(assembly.tree(), |event| match event {
            TreeTraversal::Enter(node) => {
                let color = assembly
                    .node_color(node)
                    .map(|c| format!(" {}", c.to_hex()))
                    .unwrap_or_default();
                println!("    {}{}{}", "  ".repeat(depth), assembly.node_name(node), color);
                depth += 1;
            }
            TreeTraversal::Leave(_) => depth = depth.saturating_sub(1),
        });
    }
}

fn convert(
    config: AppConfig,
    input: &Path,
    output: &Path,
    stl_format: Option<StlFormat>,
    restricted: bool,
) -> Result<(), String> {
    let format = PartFormat::from_path(output);
    if format == PartFormat::Unknown {
        return Err(format!("Cannot tell the output format of {}", output.display()));
    }

    let mut options = ExportOptions::from_config(&config);
    if let Some(stl_format) = stl_format {
        options.stl.format = stl_format;
    }
    if restricted {
        options.stl.backend = StlWriterBackend::Restricted;
    }

    let mut app = Application::new(config).map_err(|e| e.to_string())?;
    let progress: Arc<dyn ProgressSink> = Arc::new(ProgressTracker::new());
    let (doc, result) = app.open_document(input, Arc::clone(&progress));
    result.map_err(|e| format!("Import of {} failed: {}", input.display(), e))?;

    app.export_application_items(
        &[ApplicationItem::Document(doc)],
        format,
        &options,
        output,
        progress,
    )
    .map_err(|e| format!("Export to {} failed: {}", output.display(), e))?;

    println!("{} -> {} ({})", input.display(), output.display(), format);
    Ok(())
}
