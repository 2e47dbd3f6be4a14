mod logger;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use doc_compare::{ComparisonSession, ComparisonViewer, RecordedComparison};
use docgen_wizard::services::TemplateCatalog;
use docgen_wizard::{BundledCatalog, DataPayload, LifecycleOptions, TemplateId, default_steps};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "docgen", about = "Document generation wizard tools", version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the wizard steps
    Steps,

    /// Print a bundled template's structure
    Template {
        #[arg(value_enum)]
        template: TemplateArg,
    },

    /// Validate a data payload, or print a template's sample payload
    CheckData {
        /// Payload JSON file ({ "config": {...}, "model": {...} })
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Template whose sample payload is printed when no input is given
        #[arg(long, default_value = "invoice", value_enum)]
        template: TemplateArg,
    },

    /// Fold a recorded comparison into change records
    Compare {
        /// Recorded comparison JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Gap between rendered pages in pixels
        #[arg(long, default_value = "20.0")]
        page_spacing: f32,

        /// Jump to this change and print both viewers' scroll positions
        #[arg(long)]
        jump: Option<usize>,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective lifecycle timing options
    Options {
        /// Options JSON file to load
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the effective options to this file
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TemplateArg {
    Invoice,
    Contract,
    Letter,
}

impl From<TemplateArg> for TemplateId {
    fn from(arg: TemplateArg) -> Self {
        match arg {
            TemplateArg::Invoice => Self::Invoice,
            TemplateArg::Contract => Self::Contract,
            TemplateArg::Letter => Self::Letter,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let logger = logger::CliLogger::new(200, cli.verbose)
        .init()
        .context("Failed to install logger")?;

    match cli.command {
        Commands::Steps => {
            for (index, step) in default_steps().iter().enumerate() {
                println!("{}. {} ({})", index + 1, step.title, step.id.slug());
                println!("   {}", step.description);
            }
        }

        Commands::Template { template } => {
            let structure = BundledCatalog.structured_template(template.into())?;
            println!("{}", serde_json::to_string_pretty(&structure)?);
        }

        Commands::CheckData { input, template } => match input {
            Some(path) => {
                let text = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                match DataPayload::parse(&text) {
                    Ok(payload) => {
                        println!(
                            "Valid payload: {} model fields, delimiters {} {}",
                            payload.model.len(),
                            payload.config.delimiter.start,
                            payload.config.delimiter.end
                        );
                    }
                    Err(e) => anyhow::bail!("Invalid payload in {}: {}", path.display(), e),
                }
            }
            None => {
                let payload = BundledCatalog.default_data(template.into());
                println!("{}", payload.to_pretty_json()?);
            }
        },

        Commands::Compare {
            input,
            page_spacing,
            jump,
            json,
        } => {
            let recorded = RecordedComparison::load(&input)
                .await
                .with_context(|| format!("Failed to load {}", input.display()))?;
            let original = Arc::new(recorded.original_viewer());
            let changed = Arc::new(recorded.changed_viewer());
            let mut session = ComparisonSession::new(
                original.clone(),
                changed.clone(),
                Arc::new(recorded.comparator()),
            )
            .with_page_spacing(page_spacing);

            let report = session.run().await?;
            if json {
                let records: Vec<_> = session.changes().records().collect();
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                println!("Comparison Report:");
                println!("  Pages compared: {}", report.pages_compared);
                println!("  Changes: {}", report.changes);
                if !report.skipped_pages.is_empty() {
                    println!("  Skipped pages: {:?}", report.skipped_pages);
                }
                if report.missing_highlights > 0 {
                    println!("  Missing highlights: {}", report.missing_highlights);
                }
                for (index, (key, record)) in session.changes().iter().enumerate() {
                    let kind = match (record.del, record.insert) {
                        (true, true) => "replace",
                        (true, false) => "delete",
                        _ => "insert",
                    };
                    println!(
                        "  #{index} [{key}] {kind}: {:?} -> {:?}",
                        record.delete_text.as_deref().unwrap_or(""),
                        record.insert_text.as_deref().unwrap_or("")
                    );
                }
            }

            if let Some(index) = jump {
                session.jump_to(index).await?;
                println!(
                    "Jumped to #{index}: original scroll {:.1}, changed scroll {:.1}",
                    original.view_state().scroll_top,
                    changed.view_state().scroll_top
                );
            }

            let problems = logger.problem_count();
            if problems > 0 {
                eprintln!("{problems} warning(s) logged during comparison");
            }
        }

        Commands::Options { config, write } => {
            let options = match &config {
                Some(path) => LifecycleOptions::load(path)
                    .await
                    .with_context(|| format!("Failed to load {}", path.display()))?,
                None => LifecycleOptions::default(),
            };
            println!("{}", serde_json::to_string_pretty(&options)?);
            if let Some(path) = write {
                options.save(&path).await?;
                println!("Saved → {}", path.display());
            }
        }
    }

    Ok(())
}
