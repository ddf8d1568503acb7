mod analysis;
mod catalog;
mod codemod;
mod compare;
mod db;
mod export;
mod verify;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use catalog::fields::LabelSet;
use catalog::ProductRecord;

const DEFAULT_CATALOG: &str = "CATALOG_65_PRODUTOS/CATALOGO_65_PRODUTOS.md";
const DEFAULT_SOURCE_DIR: &str = "src";

#[derive(Parser)]
#[command(name = "catalog_audit", about = "Product catalog audit tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CatalogArgs {
    /// Markdown catalog to parse
    #[arg(short, long, env = "CATALOG_PATH", default_value = DEFAULT_CATALOG)]
    catalog: PathBuf,
    /// Field label language used in the catalog
    #[arg(short, long, value_enum, default_value_t = LabelSet::Pt)]
    labels: LabelSet,
}

impl CatalogArgs {
    fn load(&self) -> anyhow::Result<Vec<ProductRecord>> {
        catalog::load_catalog(&self.catalog, &self.labels.labels())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print parsed products as JSON
    Parse {
        #[command(flatten)]
        catalog: CatalogArgs,
    },
    /// Price ranges, product list and price statistics
    Analyze {
        #[command(flatten)]
        catalog: CatalogArgs,
        /// JSON export path
        #[arg(short, long, default_value = export::ANALYSIS_FILE)]
        output: PathBuf,
    },
    /// Data completeness check per field
    Verify {
        #[command(flatten)]
        catalog: CatalogArgs,
        /// JSON export path
        #[arg(short, long, default_value = export::VERIFICATION_FILE)]
        output: PathBuf,
    },
    /// Compare catalog prices against a product export or the stored catalog
    Compare {
        #[command(flatten)]
        catalog: CatalogArgs,
        /// Product export (JSON array)
        #[arg(short, long, conflicts_with = "db", required_unless_present = "db")]
        reference: Option<PathBuf>,
        /// SQLite database written by `store`
        #[arg(long)]
        db: Option<PathBuf>,
        /// JSON export path
        #[arg(short, long, default_value = export::COMPARISON_FILE)]
        output: PathBuf,
    },
    /// Save parsed products into SQLite
    Store {
        #[command(flatten)]
        catalog: CatalogArgs,
        #[arg(long, default_value = db::DB_PATH)]
        db: PathBuf,
    },
    /// Inject missing `id` / `updatedAt` into prisma create calls
    FixCreates {
        /// Source directory to rewrite
        #[arg(default_value = DEFAULT_SOURCE_DIR)]
        dir: PathBuf,
        /// Model to fix (repeatable; default: built-in list)
        #[arg(short, long = "model")]
        models: Vec<String>,
        /// Report changes without writing files
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { catalog } => {
            let products = catalog.load()?;
            println!("{}", serde_json::to_string_pretty(&products)?);
            Ok(())
        }
        Commands::Analyze { catalog, output } => {
            let products = catalog.load()?;
            let report = analysis::analyze(&products);
            analysis::print_report(&products, &report);
            export::write_json(&output, &export::AnalysisExport::new(&products, &report))?;
            println!("\nExported to: {}", output.display());
            Ok(())
        }
        Commands::Verify { catalog, output } => {
            let products = catalog.load()?;
            let v = verify::verify(&products);
            verify::print_report(&products, &v);
            export::write_json(&output, &export::VerificationExport::new(&products, &v))?;
            println!("\nFull data exported to: {}", output.display());
            Ok(())
        }
        Commands::Compare {
            catalog,
            reference,
            db: db_path,
            output,
        } => {
            let products = catalog.load()?;
            let reference = match (reference, db_path) {
                (Some(path), _) => compare::load_reference_json(&path)?,
                (None, Some(path)) => {
                    let conn = db::open_existing(&path)?;
                    db::fetch_reference(&conn)
                        .with_context(|| format!("No stored catalog in {}", path.display()))?
                }
                (None, None) => anyhow::bail!("Either --reference or --db is required"),
            };
            if reference.is_empty() {
                println!("Reference has no products.");
                return Ok(());
            }
            let c = compare::compare(&products, &reference);
            compare::print_report(&c);
            export::write_json(&output, &export::ComparisonExport::new(&c))?;
            println!("\nComparison exported to: {}", output.display());
            Ok(())
        }
        Commands::Store { catalog, db: path } => {
            let products = catalog.load()?;
            let conn = open_store(&path)?;
            let saved = db::save_products(&conn, &products)?;
            let s = db::get_stats(&conn)?;
            println!("Saved {} products to {}", saved, path.display());
            println!("Total:   {}", s.total);
            println!("With ID: {}", s.with_id);
            println!("Priced:  {}", s.priced);
            println!(
                "Sum:     {}",
                catalog::record::format_eur(s.total_minor)
            );
            Ok(())
        }
        Commands::FixCreates { dir, models, dry_run } => {
            let rewriter = if models.is_empty() {
                codemod::CreateCallRewriter::new(codemod::MODELS_NEEDING_ID)
            } else {
                codemod::CreateCallRewriter::new(models.as_slice())
            }
            .context("Invalid model name")?;

            let files = codemod::walk::collect_sources(&dir)?;
            println!("Processing {} files in {}", files.len(), dir.display());
            println!("{}", "-".repeat(60));
            let (results, stats) = codemod::walk::rewrite_files(&rewriter, &files, dry_run);
            for r in &results {
                let verb = if dry_run { "Would modify" } else { "Modified" };
                println!("{} {}", verb, r.path.display());
                for inj in &r.injections {
                    println!("  + {:?} in {}.create()", inj.field, inj.model);
                }
            }
            println!("{}", "-".repeat(60));
            println!(
                "{} scanned, {} modified, {} failed, {} fields injected",
                stats.scanned, stats.modified, stats.failed, stats.injections
            );
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn open_store(path: &Path) -> anyhow::Result<rusqlite::Connection> {
    let conn = db::connect(path)?;
    db::init_schema(&conn)?;
    Ok(conn)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
