use clap::{Parser, Subcommand};
use sitekit::{config, generate, output, process, scan};
use std::path::PathBuf;

/// Shared flags for commands that process images.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the encode cache — force re-encoding of all images
    #[arg(long)]
    no_cache: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "sitekit")]
#[command(about = "Asset pipeline for hand-written static sites")]
#[command(long_about = "\
Asset pipeline for hand-written static sites

Top-level HTML files are pages, SCSS compiles to CSS, scripts concatenate
into one bundle, and raster images are optimized with WebP variants
generated alongside when the toolchain supports it.

Source structure:

  site/
  ├── config.toml                  # Site config (optional)
  ├── index.html                   # Pages (top-level .html, tera templates)
  ├── layouts/base.html            # Layouts pages extend
  ├── partials/header.html         # Fragments pages include
  └── assets/
      ├── scss/style.scss          # Entry stylesheets (_name.scss = partial)
      ├── js/main.js               # Scripts, bundled in filename order
      ├── images/hero.png          # JPEG/PNG optimized + .webp variant
      ├── images/anim.gif          # Everything else copied through
      └── fonts/site.woff2         # Copied through

Stylesheet background-image rules referencing JPEG/PNG are split into
.webp / .no-webp rule pairs; a bundled probe script picks the right one
per visitor at page load.

Run 'sitekit gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Source directory
    #[arg(long, default_value = "site", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate manifests
    #[arg(long, default_value = ".sitekit-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the source directory into a manifest
    Scan,
    /// Optimize images and generate WebP variants
    Process(CacheArgs),
    /// Produce the final site from processed assets
    Generate,
    /// Run the full pipeline: scan → process → generate
    Build(CacheArgs),
    /// Validate the source directory without building
    Check,
    /// Delete the output and intermediate directories
    Clean,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // By reference: the arms keep borrowing cli's global flags
    match &cli.command {
        Command::Scan => {
            let manifest = scan::scan(&cli.source)?;
            std::fs::create_dir_all(&cli.temp_dir)?;
            let manifest_path = cli.temp_dir.join("scan-manifest.json");
            let json = serde_json::to_string_pretty(&manifest)?;
            std::fs::write(&manifest_path, json)?;
            output::print_scan_output(&manifest);
        }
        Command::Process(cache_args) => {
            let scan_manifest_path = cli.temp_dir.join("scan-manifest.json");
            let manifest_content = std::fs::read_to_string(&scan_manifest_path)?;
            let manifest: scan::Manifest = serde_json::from_str(&manifest_content)?;
            init_thread_pool(&manifest.config.processing);

            let result = run_process_stage(&cli, &scan_manifest_path, cache_args.no_cache)?;
            process::write_manifest(&result.site, &cli.temp_dir)?;
            println!("{}", output::format_process_summary(&result.stats));
        }
        Command::Generate => {
            let processed_manifest_path = cli.temp_dir.join("manifest.json");
            let summary =
                generate::generate(&processed_manifest_path, &cli.source, &cli.output)?;
            output::print_generate_output(&summary);
        }
        Command::Build(cache_args) => {
            std::fs::create_dir_all(&cli.temp_dir)?;

            println!("==> Stage 1: Scanning {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            let scan_manifest_path = cli.temp_dir.join("scan-manifest.json");
            let json = serde_json::to_string_pretty(&manifest)?;
            std::fs::write(&scan_manifest_path, json)?;
            output::print_scan_output(&manifest);

            println!("==> Stage 2: Processing images");
            init_thread_pool(&manifest.config.processing);
            let result = run_process_stage(&cli, &scan_manifest_path, cache_args.no_cache)?;
            let processed_manifest_path = process::write_manifest(&result.site, &cli.temp_dir)?;
            println!("{}", output::format_process_summary(&result.stats));

            println!("==> Stage 3: Generating site → {}", cli.output.display());
            let summary =
                generate::generate(&processed_manifest_path, &cli.source, &cli.output)?;
            output::print_generate_output(&summary);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            output::print_scan_output(&manifest);
            generate::check(&cli.source, &manifest.config, &manifest.stylesheets)?;
            println!("==> Source is valid");
        }
        Command::Clean => {
            for dir in [&cli.output, &cli.temp_dir] {
                if dir.exists() {
                    std::fs::remove_dir_all(dir)?;
                    println!("Removed {}", dir.display());
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run the process stage with a printer thread consuming progress events.
fn run_process_stage(
    cli: &Cli,
    scan_manifest_path: &std::path::Path,
    no_cache: bool,
) -> Result<process::ProcessResult, process::ProcessError> {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });

    let options = process::ProcessOptions {
        use_cache: !no_cache,
    };
    let result = process::process(
        scan_manifest_path,
        &cli.source,
        &cli.output,
        &options,
        Some(&tx),
    );
    drop(tx);
    printer.join().expect("printer thread panicked");
    result
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
