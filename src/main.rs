use clap::{Parser, Subcommand};
use rasterkit::config::{self, ToolConfig};
use rasterkit::output::{self, ImageInfo};
use rasterkit::{
    Angle, Color, FlipMode, Image, ImportableFormat, PixelateMode, Point, RasterError, Rectangle,
    Size, batch,
};
use std::path::{Path, PathBuf};

/// Input and output files shared by every single-image command.
#[derive(clap::Args, Clone)]
struct FileArgs {
    /// Image to read (format from the extension; sniffed only when the extension is unknown)
    input: PathBuf,

    /// Image to write (format chosen by the extension)
    output: PathBuf,

    /// Replace the output file if it already exists
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
#[command(name = "rasterkit")]
#[command(about = "Decode, draw on, transform, and re-encode raster images")]
#[command(long_about = "\
Decode, draw on, transform, and re-encode raster images

Readable: png, jpeg, gif, webp, tiff, bmp, tga, wbmp
Writable: the same set. The output format is taken from the output file's
extension; JPEG quality, BMP compression and the WBMP foreground color come
from rasterkit.toml.

Angles are in degrees, counter-clockwise. Colors are hex: rgb, rgba, rrggbb
or rrggbbaa, with or without a leading '#'.

Run 'rasterkit gen-config' to generate a documented rasterkit.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing rasterkit.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print format, dimensions and transparency of an image
    Info {
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-encode an image in the format implied by the output extension
    Convert {
        #[command(flatten)]
        files: FileArgs,

        /// JPEG quality 1-100 (overrides export.jpeg_quality)
        #[arg(long)]
        quality: Option<u32>,
    },
    /// Scale an image; give one edge to keep the aspect ratio
    Resize {
        #[command(flatten)]
        files: FileArgs,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        /// Nearest-neighbour sampling
        #[arg(long)]
        no_smoothing: bool,
    },
    /// Cut out a rectangle, clipped to the image
    Crop {
        #[command(flatten)]
        files: FileArgs,

        #[arg(long, allow_hyphen_values = true)]
        x: i32,

        #[arg(long, allow_hyphen_values = true)]
        y: i32,

        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,
    },
    /// Rotate counter-clockwise, growing the canvas to fit
    Rotate {
        #[command(flatten)]
        files: FileArgs,

        #[arg(long, allow_hyphen_values = true)]
        degrees: f64,
    },
    /// Mirror an image
    Flip {
        #[command(flatten)]
        files: FileArgs,

        #[arg(long, value_enum)]
        mode: FlipMode,
    },
    /// Apply filters, in order: pixelate, blur, colorize, desaturate, reduce colors
    Adjust {
        #[command(flatten)]
        files: FileArgs,

        /// Block size in pixels
        #[arg(long)]
        pixelate: Option<u32>,

        #[arg(long, value_enum, default_value_t = PixelateMode::UpperLeft)]
        pixelate_mode: PixelateMode,

        /// Blur radius in pixels
        #[arg(long)]
        blur: Option<u32>,

        /// Hex color added to every pixel
        #[arg(long)]
        colorize: Option<Color>,

        #[arg(long)]
        desaturate: bool,

        /// Maximum number of colors
        #[arg(long)]
        reduce_colors: Option<u32>,
    },
    /// Draw text; prints the corners of the drawn box
    Text {
        #[command(flatten)]
        files: FileArgs,

        /// Text to draw; '\n' starts a new line
        #[arg(long)]
        text: String,

        /// Baseline start, x
        #[arg(long, allow_hyphen_values = true)]
        x: i32,

        /// Baseline start, y
        #[arg(long, allow_hyphen_values = true)]
        y: i32,

        /// Size in points (default: text.size)
        #[arg(long)]
        size: Option<f64>,

        /// Hex color (default: text.color)
        #[arg(long)]
        color: Option<Color>,

        /// Counter-clockwise rotation in degrees
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        angle: f64,

        /// Font file; repeat to give fallbacks (default: text.fonts)
        #[arg(long)]
        font: Vec<PathBuf>,
    },
    /// Convert every image under a directory, mirroring the layout
    Batch {
        source: PathBuf,

        output: PathBuf,

        /// Target format extension, e.g. png, webp, jpg
        #[arg(long)]
        format: String,

        /// Replace output files that already exist
        #[arg(long)]
        force: bool,
    },
    /// Print a stock rasterkit.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        _ => config::load_config(&cli.config_dir)?,
    };

    match cli.command {
        Command::Info { file, json } => {
            let bytes = std::fs::read(&file)?;
            let (format, raster) = ImportableFormat::Any.import_detected(&bytes)?;
            let image = Image::from_raster(raster)?;
            let info = ImageInfo::new(&file, format, &image, bytes.len() as u64);
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                output::print_info(&info);
            }
        }
        Command::Convert { files, quality } => {
            if let Some(q) = quality {
                config.export.jpeg_quality = q;
                config.validate()?;
            }
            let image = open(&files.input)?;
            save(&image, &files, &config)?;
        }
        Command::Resize {
            files,
            width,
            height,
            no_smoothing,
        } => {
            let image = open(&files.input)?;
            let smoothing = config.resize.smoothing && !no_smoothing;
            let resized = match (width, height) {
                (Some(w), Some(h)) => image.resized_to(Size::new(w, h), smoothing)?,
                (Some(w), None) => image.resized_to_width(w, smoothing)?,
                (None, Some(h)) => image.resized_to_height(h, smoothing)?,
                (None, None) => return Err("resize needs --width, --height, or both".into()),
            };
            save(&resized, &files, &config)?;
        }
        Command::Crop {
            files,
            x,
            y,
            width,
            height,
        } => {
            let image = open(&files.input)?;
            let cropped = image.cropped(Rectangle::new(x, y, width, height))?;
            save(&cropped, &files, &config)?;
        }
        Command::Rotate { files, degrees } => {
            let image = open(&files.input)?;
            save(&image.rotated(Angle::from_degrees(degrees)), &files, &config)?;
        }
        Command::Flip { files, mode } => {
            let image = open(&files.input)?;
            save(&image.flipped(mode), &files, &config)?;
        }
        Command::Adjust {
            files,
            pixelate,
            pixelate_mode,
            blur,
            colorize,
            desaturate,
            reduce_colors,
        } => {
            let mut image = open(&files.input)?;
            if let Some(block) = pixelate {
                image.pixelate(block, pixelate_mode)?;
            }
            if let Some(radius) = blur {
                image.blur(radius);
            }
            if let Some(color) = colorize {
                image.colorize(color);
            }
            if desaturate {
                image.desaturate();
            }
            if let Some(max) = reduce_colors {
                image.reduce_colors(max)?;
            }
            save(&image, &files, &config)?;
        }
        Command::Text {
            files,
            text,
            x,
            y,
            size,
            color,
            angle,
            font,
        } => {
            let mut image = open(&files.input)?;
            let fonts = if font.is_empty() {
                config.text.fonts.clone()
            } else {
                font
            };
            let color = match color {
                Some(c) => c,
                None => config.text.color.parse()?,
            };
            let bounds = image.render_text(
                &text,
                Point::new(x, y),
                &fonts,
                color,
                size.unwrap_or(config.text.size),
                Angle::from_degrees(angle),
            )?;
            output::print_text_bounds(&bounds);
            save(&image, &files, &config)?;
        }
        Command::Batch {
            source,
            output: dest,
            format,
            force,
        } => {
            let target = config
                .export_format(&format.to_ascii_lowercase())
                .ok_or_else(|| RasterError::UnsupportedExtension(format.clone()))?;
            config.export.allow_overwrite |= force;
            init_thread_pool(&config.processing);

            let (tx, rx) = std::sync::mpsc::channel();
            let (source_root, dest_root) = (source.clone(), dest.clone());
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event, &source_root, &dest_root) {
                        println!("{}", line);
                    }
                }
            });
            let summary = batch::convert_dir(&source, &dest, target, &config, Some(tx))?;
            printer
                .join()
                .map_err(|_| "batch progress printer panicked")?;
            output::print_batch_summary(&summary);
            if summary.failed > 0 {
                return Err(format!("{} of {} files failed", summary.failed, summary.total()).into());
            }
        }
        Command::GenConfig => {}
    }

    Ok(())
}

/// Read an image for editing. Alpha is kept on export so transparent
/// sources stay transparent.
fn open(path: &Path) -> Result<Image, RasterError> {
    let mut image = Image::open(path)?;
    image.set_save_alpha(true);
    Ok(image)
}

/// Write `image` to the command's output path, in the format its extension
/// names, and report it.
fn save(image: &Image, files: &FileArgs, config: &ToolConfig) -> Result<(), RasterError> {
    let ext = extension(&files.output);
    let format = config
        .export_format(&ext)
        .ok_or(RasterError::UnsupportedExtension(ext))?;
    let allow_overwrite = files.force || config.export.allow_overwrite;
    image.write_as(&files.output, format, allow_overwrite)?;
    output::print_write(&files.output, format, image.size());
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
