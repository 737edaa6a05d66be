use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use zine_impose::{
    AssetProvider, DirectoryAssets, ExportOptions, FontBook, NoAssets, Project, Template,
    TemplateCatalog, TemplateProvider,
};

#[derive(Parser)]
#[command(name = "zinet", about = "Zine imposition and export CLI", version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Extra template definitions (JSON array) added to the built-in catalog
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a project to a print-ready PDF
    Export {
        /// Project JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        /// Also write one PNG per sheet side into this directory
        #[arg(long)]
        png_dir: Option<PathBuf>,

        /// Export options JSON; flags below override it
        #[arg(long)]
        options: Option<PathBuf>,

        /// Directory holding managed assets, one file per asset id
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Font file used when no other font matches
        #[arg(long)]
        font: Option<PathBuf>,

        /// Do not search system font directories
        #[arg(long)]
        no_system_fonts: bool,

        /// Draw page numbers
        #[arg(long)]
        page_numbers: bool,

        /// Add fold marks
        #[arg(long)]
        fold_marks: bool,

        /// Add cut marks
        #[arg(long)]
        cut_marks: bool,

        /// Raster pixels per point
        #[arg(long)]
        pixel_ratio: Option<f32>,

        /// Extra wait before each sheet capture, in milliseconds
        #[arg(long)]
        settle_delay: Option<u64>,
    },

    /// Show how a project will be imposed, without rendering
    Plan {
        /// Project JSON file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// List available templates
    Templates,

    /// Create an empty project from a template
    New {
        /// Project name
        #[arg(short, long)]
        name: String,

        /// Template id (see `zinet templates`)
        #[arg(short, long)]
        template: String,

        /// Output project JSON file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let catalog = load_catalog(cli.templates.as_deref()).await?;

    match cli.command {
        Commands::Export {
            input,
            output,
            png_dir,
            options,
            assets,
            font,
            no_system_fonts,
            page_numbers,
            fold_marks,
            cut_marks,
            pixel_ratio,
            settle_delay,
        } => {
            let project = Project::load(&input)
                .await
                .with_context(|| format!("Failed to load project {}", input.display()))?;

            let mut export_options = match &options {
                Some(path) => ExportOptions::load(path).await?,
                None => ExportOptions::default(),
            };
            export_options.show_page_numbers |= page_numbers;
            export_options.show_fold_marks |= fold_marks;
            export_options.show_cut_marks |= cut_marks;
            if let Some(ratio) = pixel_ratio {
                export_options.pixel_ratio = ratio;
            }
            if let Some(delay) = settle_delay {
                export_options.settle_delay_ms = delay;
            }

            let mut fonts = if no_system_fonts {
                FontBook::without_system_fonts()
            } else {
                FontBook::new()
            };
            if let Some(path) = &font {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read font {}", path.display()))?;
                fonts.register_fallback(bytes)?;
            }

            let target = Target {
                pdf: &output,
                png_dir: png_dir.as_deref(),
            };
            match assets {
                Some(dir) => {
                    let assets = DirectoryAssets::new(dir);
                    export(&project, &catalog, &assets, &fonts, &export_options, target).await?
                }
                None => export(&project, &catalog, &NoAssets, &fonts, &export_options, target).await?,
            }
        }

        Commands::Plan { input } => {
            let project = Project::load(&input)
                .await
                .with_context(|| format!("Failed to load project {}", input.display()))?;
            let Some(template) = catalog.get_template(&project.template.id) else {
                bail!("Template '{}' is not available", project.template.id);
            };
            let plan = zine_impose::plan_statistics(&project, &template)?;

            println!("Imposition Plan:");
            println!("  Template: {} ({})", template.name, template.format);
            println!("  Project pages: {}", project.page_count());
            println!("  Sheets: {}", plan.sheet_count);
            println!("  Printed sides: {}", plan.side_count);
            println!("  Page slots: {}", plan.slot_count);
            println!("  Blank slots: {}", plan.blank_slots);
            if !plan.missing_pages.is_empty() {
                println!("  Missing pages: {:?}", plan.missing_pages);
            }
        }

        Commands::Templates => {
            for template in catalog.templates() {
                let (w, h) = template.sheet_size();
                println!(
                    "{:<26} {:<13} {:>3} pages  {}x{}pt  {}",
                    template.id,
                    template.format.as_str(),
                    template.page_count,
                    w,
                    h,
                    template.name
                );
            }
        }

        Commands::New {
            name,
            template,
            output,
        } => {
            let Some(template) = catalog.get_template(&template) else {
                bail!("Unknown template '{}'", template);
            };
            let project = Project::new(name, template);
            project.save(&output).await?;
            println!(
                "Created {} with {} pages → {}",
                project.name,
                project.page_count(),
                output.display()
            );
        }
    }

    Ok(())
}

struct Target<'a> {
    pdf: &'a Path,
    png_dir: Option<&'a Path>,
}

async fn export<A: AssetProvider>(
    project: &Project,
    catalog: &TemplateCatalog,
    assets: &A,
    fonts: &FontBook,
    options: &ExportOptions,
    target: Target<'_>,
) -> Result<()> {
    let result = zine_impose::export_project(project, catalog, assets, fonts, options).await?;

    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }

    zine_impose::save_document(&result.document, target.pdf).await?;
    println!(
        "Exported {} sheet side(s) at {}x{}px → {}",
        result.images.len(),
        result.width,
        result.height,
        target.pdf.display()
    );

    if let Some(dir) = target.png_dir {
        let stem = target
            .pdf
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("zine");
        let written = result.save_images(dir, stem).await?;
        println!("Wrote {} image(s) → {}", written.len(), dir.display());
    }

    Ok(())
}

async fn load_catalog(extra: Option<&Path>) -> Result<TemplateCatalog> {
    let mut catalog = TemplateCatalog::builtin();
    if let Some(path) = extra {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read templates {}", path.display()))?;
        let templates: Vec<Template> = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse templates {}", path.display()))?;
        log::info!("loaded {} template(s) from {}", templates.len(), path.display());
        for template in templates {
            catalog.upsert(template);
        }
    }
    Ok(catalog)
}
