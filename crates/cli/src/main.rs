//! Rubblescan CLI - texture-based damage indicators from Sentinel-2 mosaics

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use rubblescan_algorithms::change::{absolute_difference, change_summary};
use rubblescan_algorithms::imagery::{band_math, cloud_vegetation_mask, scale_reflectance, MaskParams};
use rubblescan_algorithms::texture::{glcm_texture, TextureMetric};
use rubblescan_catalog::{clip_to_aoi, DateRange, ImageCollection};
use rubblescan_colormap::{render_single, save_png, vis_params, HOMOGENEITY_DIFF_MAX};
use rubblescan_core::io::{read_geotiff, write_geotiff};
use rubblescan_core::{AreaOfInterest, FeatureCollection, Raster, RasterElement};
use rubblescan_pipeline::{run_region, write_outputs, PipelineConfig, RegionConfig, MOSAIC_BANDS};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rubblescan")]
#[command(author, version, about = "Texture-based damage indicators from Sentinel-2 mosaics", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured regions with their AOI and date ranges
    Regions {
        /// Region configuration (TOML); built-in presets when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run the pre/post pipeline for one or more regions
    Run {
        /// Scene catalog manifest (JSON); overrides the config file
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Region to process (repeatable); all configured regions when omitted
        #[arg(short, long = "region")]
        regions: Vec<String>,
        /// Region configuration (TOML); built-in presets when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Building footprints (GeoJSON)
        #[arg(short, long)]
        footprints: Option<PathBuf>,
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build a mosaic over an AOI and write its cloud/vegetation keep-mask
    Mask {
        /// Scene catalog manifest (JSON)
        manifest: PathBuf,
        /// First acquisition date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        start: String,
        /// Last acquisition date (YYYY-MM-DD, exclusive)
        #[arg(long)]
        end: String,
        /// Closed AOI ring as "lon,lat;lon,lat;..."
        #[arg(long)]
        aoi: String,
        /// Output keep-mask (1 = kept, 0 = masked)
        output: PathBuf,
    },
    /// GLCM texture of a single band
    Texture {
        /// Input band (reflectance in [0, 1] after --scale)
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Texture statistic: homogeneity or dissimilarity
        #[arg(short, long, default_value = "homogeneity")]
        metric: TextureMetric,
        /// Multiplier applied before quantization (0.0001 for raw Sentinel-2 DN)
        #[arg(short, long, default_value = "1.0")]
        scale: f64,
    },
    /// Absolute difference between two rasters
    Diff {
        /// Pre-event raster
        pre: PathBuf,
        /// Post-event raster
        post: PathBuf,
        /// Output file
        output: PathBuf,
        /// Also render the difference as PNG
        #[arg(long)]
        png: Option<PathBuf>,
        /// Display maximum for the PNG
        #[arg(long, default_value_t = HOMOGENEITY_DIFF_MAX)]
        max: f64,
    },
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_band(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> = read_geotiff(path)
        .with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn write_result<T: RasterElement>(raster: &Raster<T>, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path)
        .with_context(|| format!("Failed to write output {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => PipelineConfig::with_presets().context("Failed to load built-in regions"),
    }
}

fn select_regions<'a>(config: &'a PipelineConfig, names: &[String]) -> Result<Vec<&'a RegionConfig>> {
    if names.is_empty() {
        return Ok(config.regions.iter().collect());
    }
    names
        .iter()
        .map(|n| config.region(n).context("Unknown region"))
        .collect()
}

fn print_region(region: &RegionConfig) {
    println!("{}", region.name);
    println!("  Pre:  {} ({} days)", region.pre, region.pre.days());
    println!("  Post: {} ({} days)", region.post, region.post.days());
    match region.area_of_interest() {
        Ok(aoi) => {
            let b = aoi.bounds();
            println!(
                "  AOI:  ({:.4}, {:.4}) - ({:.4}, {:.4}), {} vertices, {:.5} deg²",
                b.west,
                b.south,
                b.east,
                b.north,
                region.aoi.len(),
                aoi.area_deg2()
            );
        }
        Err(e) => println!("  AOI:  invalid ({})", e),
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Regions ──────────────────────────────────────────────────
        Commands::Regions { config } => {
            let config = load_config(config.as_deref())?;
            for (i, region) in config.regions.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print_region(region);
            }
        }

        // ── Run ──────────────────────────────────────────────────────
        Commands::Run {
            catalog,
            regions,
            config,
            footprints,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            let manifest = catalog
                .or_else(|| config.catalog.clone())
                .context("No scene catalog given; use --catalog or set `catalog` in the config")?;
            let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
            let selected = select_regions(&config, &regions)?;

            let collection = ImageCollection::open(&manifest)
                .with_context(|| format!("Failed to open catalog {}", manifest.display()))?;
            info!("Catalog: {} scenes", collection.len());

            let footprints = match footprints.or_else(|| config.footprints.clone()) {
                Some(path) => {
                    let pb = spinner("Reading building footprints...");
                    let fc = FeatureCollection::from_geojson_file(&path)
                        .with_context(|| format!("Failed to read footprints {}", path.display()))?;
                    pb.finish_and_clear();
                    info!("Footprints: {} features", fc.len());
                    Some(fc)
                }
                None => None,
            };

            for region in selected {
                let pb = spinner(&format!("Processing {}...", region.name));
                let start = Instant::now();
                let result = run_region(region, &collection, footprints.as_ref(), &config.vis)
                    .with_context(|| format!("Pipeline failed for region '{}'", region.name));
                pb.finish_and_clear();
                let result = result?;
                let elapsed = start.elapsed();

                let written = write_outputs(&result, &output_dir)
                    .with_context(|| format!("Failed to write outputs for '{}'", region.name))?;

                println!("{}", region.name);
                println!("  Scenes: {} pre, {} post", result.pre_scenes, result.post_scenes);
                for (metric, summary) in &result.summaries {
                    match summary.mean {
                        Some(mean) => println!(
                            "  {} difference: mean {:.4}, max {:.4}, {:.1}% above {}",
                            metric,
                            mean,
                            summary.max.unwrap_or(f64::NAN),
                            100.0 * summary.fraction_above(),
                            summary.threshold
                        ),
                        None => println!("  {} difference: no valid pixels", metric),
                    }
                }
                if let Some(count) = result.building_count {
                    println!("  Buildings in AOI: {}", count);
                }
                println!("  {} files in {}", written.len(), output_dir.join(&region.name).display());
                println!("  Processing time: {:.2?}", elapsed);
            }
        }

        // ── Mask ─────────────────────────────────────────────────────
        Commands::Mask {
            manifest,
            start,
            end,
            aoi,
            output,
        } => {
            let range = DateRange::parse(&start, &end).context("Invalid date range")?;
            let aoi = AreaOfInterest::parse(&aoi).context("Invalid AOI")?;
            let collection = ImageCollection::open(&manifest)
                .with_context(|| format!("Failed to open catalog {}", manifest.display()))?;

            let t0 = Instant::now();
            let filtered = collection.filter_date(&range).filter_bounds(&aoi);
            info!("{} scenes after filtering", filtered.len());
            let pb = spinner("Building mosaic...");
            let mosaic = filtered.mosaic(&MOSAIC_BANDS).context("Failed to build mosaic")?;
            pb.finish_and_clear();
            let clipped = clip_to_aoi(&mosaic, &aoi).context("Failed to clip mosaic")?;

            let params = MaskParams::default();
            let scaled = scale_reflectance(&clipped, &params.reflectance_bands, params.scale)
                .context("Failed to scale reflectance")?;
            let mask = cloud_vegetation_mask(&scaled, &params).context("Failed to build mask")?;
            let elapsed = t0.elapsed();

            let kept = mask.data().iter().filter(|&&v| v == 1).count();
            println!(
                "Kept {} of {} pixels ({:.1}%)",
                kept,
                mask.len(),
                100.0 * kept as f64 / mask.len().max(1) as f64
            );
            write_result(&mask, &output)?;
            done("Keep-mask", &output, elapsed);
        }

        // ── Texture ──────────────────────────────────────────────────
        Commands::Texture {
            input,
            output,
            metric,
            scale,
        } => {
            let band = read_band(&input)?;
            let start = Instant::now();
            let band = if (scale - 1.0).abs() > f64::EPSILON {
                band_math(&band, |v| v * scale).context("Failed to scale input")?
            } else {
                band
            };
            let result = glcm_texture(&band, metric)
                .with_context(|| format!("Failed to calculate {}", metric))?;
            let elapsed = start.elapsed();
            write_result(&result, &output)?;
            done(metric.name(), &output, elapsed);
        }

        // ── Diff ─────────────────────────────────────────────────────
        Commands::Diff {
            pre,
            post,
            output,
            png,
            max,
        } => {
            let pre = read_band(&pre)?;
            let post = read_band(&post)?;
            let start = Instant::now();
            let diff = absolute_difference(&pre, &post).context("Failed to calculate difference")?;
            let elapsed = start.elapsed();

            let summary = change_summary(&diff, max);
            if summary.valid == 0 {
                warn!("Difference has no valid pixels");
            }
            write_result(&diff, &output)?;
            done("Difference", &output, elapsed);
            println!(
                "  {:.1}% of valid pixels above {}",
                100.0 * summary.fraction_above(),
                max
            );

            if let Some(png) = png {
                let rgba = render_single(&diff, &vis_params(max));
                save_png(&png, &rgba, diff.cols(), diff.rows())
                    .with_context(|| format!("Failed to write {}", png.display()))?;
                println!("  Preview saved to: {}", png.display());
            }
        }

        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_band(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
            );
        }
    }

    Ok(())
}
