//! labcrawl - discover experiment directory hierarchies and crawl them.
//!
//! Usage:
//!   labcrawl tree [PATH]     Build and print the hierarchy
//!   labcrawl crawl [PATH]    Build the hierarchy and run the built-in kernels
//!   labcrawl --help          Show help

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use labcrawl_build::{BuildStats, HierTree, Layout, TreeBuilder};
use labcrawl_core::{NoParams, ProjectConfig, ProjectParams};
use labcrawl_crawl::kernels::DEFAULT_MANIFEST_NAME;
use labcrawl_crawl::{CrawlOptions, Crawler, LevelSummary, ManifestKernel};

#[derive(Parser)]
#[command(
    name = "labcrawl",
    version,
    about = "Discover experiment directory hierarchies and crawl them",
    long_about = "labcrawl turns a project directory laid out as cond*/subject/day* \
                  (behavior) or cond*/*XY* (slice) into a hierarchy of nodes, \
                  normalizing session directory names on the way, and runs \
                  analysis kernels over it."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the hierarchy and print it
    Tree {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Build the hierarchy and run the level summary and manifest kernels
    Crawl {
        #[command(flatten)]
        project: ProjectArgs,

        /// Glob for files to dispatch inside every node (e.g. "*.csv")
        #[arg(long)]
        files: Option<String>,

        /// Manifest file name, written inside the project directory
        #[arg(long, default_value = DEFAULT_MANIFEST_NAME)]
        manifest: String,

        /// Replace an existing manifest
        #[arg(short, long)]
        overwrite: bool,
    },
}

#[derive(Args)]
struct ProjectArgs {
    /// Project directory (defaults to the config's prj_dir, then ".")
    path: Option<PathBuf>,

    /// Directory layout of the project
    #[arg(short, long, default_value_t = Layout::Behavior)]
    layout: Layout,

    /// Project configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A resolved project: where it lives and which parameters apply.
struct Project {
    root: PathBuf,
    params: Box<dyn ProjectParams>,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Tree { project } => run_tree(&project),
        Command::Crawl {
            project,
            files,
            manifest,
            overwrite,
        } => run_crawl(&project, files.as_deref(), &manifest, overwrite),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_project(args: &ProjectArgs) -> Result<Project> {
    let config = args
        .config
        .as_deref()
        .map(|path| {
            ProjectConfig::load(path)
                .wrap_err_with(|| format!("Failed to load config {}", path.display()))
        })
        .transpose()?;

    let root = args
        .path
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.prj_dir.clone()))
        .unwrap_or_else(|| PathBuf::from("."));
    let root = root.canonicalize().wrap_err("Invalid project path")?;
    tracing::debug!(root = %root.display(), config = ?args.config, "project resolved");

    let params: Box<dyn ProjectParams> = match config {
        Some(config) => Box::new(config),
        None => Box::new(NoParams),
    };
    Ok(Project { root, params })
}

fn build(project: &Project, layout: Layout) -> Result<(HierTree, BuildStats)> {
    eprintln!("Building {} hierarchy in {}...", layout, project.root.display());
    TreeBuilder::for_layout(layout)
        .build_with_stats(&project.root, project.params.as_ref(), &layout.kind())
        .wrap_err("Failed to build hierarchy")
}

/// Build the hierarchy and print it.
fn run_tree(args: &ProjectArgs) -> Result<()> {
    let project = open_project(args)?;
    let (tree, stats) = build(&project, args.layout)?;

    match args.format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(60));
            println!(" {}", project.root.display());
            println!(" {} nodes, {} roots", tree.len(), tree.roots().count());
            if !stats.renamed.is_empty() {
                println!(" {} session directories renamed", stats.renamed.len());
            }
            println!("{}", "─".repeat(60));
            println!();
            print_tree(&tree);
        }
        OutputFormat::Json => {
            let output = json!({
                "project_dir": project.root,
                "layout": args.layout,
                "stats": stats,
                "tree": tree,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn print_tree(tree: &HierTree) {
    if tree.is_empty() {
        println!(" No matching directories found.");
        return;
    }
    for node in tree.iter() {
        let indent = "  ".repeat(node.depth() + 1);
        let missing = node.payload().values().filter(|v| v.is_null()).count();
        if missing > 0 {
            println!("{indent}{}  [{}] (no params)", node.name(), node.level());
        } else {
            println!("{indent}{}  [{}]", node.name(), node.level());
        }
    }
}

/// Build the hierarchy and run the built-in kernels over it.
fn run_crawl(
    args: &ProjectArgs,
    files: Option<&str>,
    manifest_name: &str,
    overwrite: bool,
) -> Result<()> {
    let project = open_project(args)?;
    let (tree, build_stats) = build(&project, args.layout)?;

    let options = CrawlOptions::builder()
        .project_dir(project.root.clone())
        .overwrite(overwrite)
        .build()
        .wrap_err("Invalid crawl options")?;

    let mut summary = LevelSummary::new();
    let mut manifest = ManifestKernel::new(manifest_name);
    if let Some(pattern) = files {
        summary = summary.with_files(pattern, None);
        manifest = manifest.with_files(pattern);
    }

    eprintln!("Crawling {} nodes...", tree.len());
    let crawl_stats = Crawler::new(
        vec![&mut summary, &mut manifest],
        project.params.as_ref(),
        options,
    )
    .crawl(&tree)
    .wrap_err("Crawl failed")?;

    let written = manifest.written().map(Path::to_path_buf);
    let report = summary.into_report();

    match args.format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(60));
            println!(" Crawl of {}", project.root.display());
            println!("{}", "─".repeat(60));
            println!();
            println!(" {report}");
            println!();
            println!(
                " {} node events, {} files dispatched",
                crawl_stats.node_events, crawl_stats.files_dispatched
            );
            match &written {
                Some(path) => println!(" Manifest written to {}", path.display()),
                None => println!(" Existing manifest kept (use --overwrite to replace it)"),
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "project_dir": project.root,
                "layout": args.layout,
                "build": build_stats,
                "crawl": crawl_stats,
                "summary": report,
                "manifest": written,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
