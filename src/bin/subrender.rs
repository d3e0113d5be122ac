use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Parser, Subcommand};
use colored::Colorize;
use image::RgbaImage;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use subrender::{Overlay, RenderParams, SubRenderError, SubtitleCue, SubtitleRenderer};

const CLI_AFTER_HELP: &str = "Examples:\n  subrender info episode.ass --at 42.5 --size 1920x1080 --json\n  subrender render episode.ass --at 0:00:42.50 --size 1920x1080 --out frame.png\n  subrender sequence episode.ass --from 40 --to 50 --fps 5 --size 1280x720 --out frames --progress";

#[derive(Debug, Parser)]
#[command(
    name = "subrender",
    version,
    about = "Render ASS/text subtitle scripts into overlay images",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Allow overwriting existing output files.
    #[arg(long)]
    overwrite: bool,

    /// Additional font directory to load faces from.
    #[arg(long)]
    font_dir: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone, Default)]
struct StyleOptions {
    /// Font family override.
    #[arg(long)]
    font: Option<String>,

    /// Font size override in script units.
    #[arg(long)]
    font_size: Option<f32>,

    /// Font scale multiplier.
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Primary colour override as RRGGBB hex.
    #[arg(long)]
    color: Option<String>,

    /// Vertical position bias in -1.0..=1.0 (positive moves up).
    #[arg(long, default_value_t = 0.0)]
    offset: f64,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the bounding box a cue occupies at a timestamp.
    #[command(
        about = "Probe a cue's bounding box",
        after_help = "Examples:\n  subrender info episode.ass --at 42.5 --size 1920x1080\n  subrender info episode.ass --at 0:00:42.50 --size 1920x1080 --json"
    )]
    Info {
        /// Input script path (.ass/.ssa markup or plain text).
        input: PathBuf,

        /// Timestamp (seconds, or H:MM:SS.cc).
        #[arg(long)]
        at: String,

        /// Overlay size as WIDTHxHEIGHT.
        #[arg(long, default_value = "1920x1080")]
        size: String,

        /// Pixel aspect ratio of the target surface.
        #[arg(long, default_value_t = 1.0)]
        par: f32,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        style: StyleOptions,
    },

    /// Render one overlay frame to a PNG.
    #[command(
        about = "Render a single overlay frame",
        after_help = "Examples:\n  subrender render episode.ass --at 42.5 --size 1920x1080 --out frame.png\n  subrender render notes.txt --at 1 --size 1280x720 --out hello.png --color ffff00"
    )]
    Render {
        /// Input script path (.ass/.ssa markup or plain text).
        input: PathBuf,

        /// Timestamp (seconds, or H:MM:SS.cc).
        #[arg(long)]
        at: String,

        /// Overlay size as WIDTHxHEIGHT.
        #[arg(long, default_value = "1920x1080")]
        size: String,

        /// Pixel aspect ratio of the target surface.
        #[arg(long, default_value_t = 1.0)]
        par: f32,

        /// Output PNG path.
        #[arg(long)]
        out: PathBuf,

        /// Save only the bounding box instead of the full overlay.
        #[arg(long)]
        crop: bool,

        #[command(flatten)]
        style: StyleOptions,
    },

    /// Render a sequence of overlay frames to a directory.
    #[command(
        about = "Render a frame sequence",
        after_help = "Examples:\n  subrender sequence episode.ass --from 40 --to 50 --fps 5 --size 1280x720 --out frames --progress"
    )]
    Sequence {
        /// Input script path (.ass/.ssa markup or plain text).
        input: PathBuf,

        /// Start timestamp (seconds, or H:MM:SS.cc).
        #[arg(long)]
        from: String,

        /// End timestamp (seconds, or H:MM:SS.cc), inclusive.
        #[arg(long)]
        to: String,

        /// Frames per second to sample.
        #[arg(long, default_value_t = 1.0)]
        fps: f64,

        /// Overlay size as WIDTHxHEIGHT.
        #[arg(long, default_value = "1920x1080")]
        size: String,

        /// Pixel aspect ratio of the target surface.
        #[arg(long, default_value_t = 1.0)]
        par: f32,

        /// Output directory for frame PNGs.
        #[arg(long)]
        out: PathBuf,

        /// Show a progress bar.
        #[arg(long)]
        progress: bool,

        #[command(flatten)]
        style: StyleOptions,
    },
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info {
            input,
            at,
            size,
            par,
            json,
            style,
        } => {
            let cue = load_cue(&input)?;
            let (width, height) = parse_size(&size)?;
            let timestamp = parse_timecode(&at)?;
            let params = style.to_params()?;

            let mut renderer = new_renderer(&cli.global);
            let display_size = renderer.render_to_display_size(&cue);
            let bbox = renderer.prerender(&cue, timestamp, &params, width, height, par);

            if json {
                let payload = json!({
                    "input": input.display().to_string(),
                    "timestamp_secs": timestamp.as_secs_f64(),
                    "overlay": { "width": width, "height": height, "pixel_aspect_ratio": par },
                    "render_to_display_size": display_size,
                    "bounding_box": {
                        "x": bbox.x,
                        "y": bbox.y,
                        "width": bbox.width,
                        "height": bbox.height,
                    },
                    "empty": bbox.is_empty(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{} {}", "input:".cyan().bold(), input.display());
                println!("{} {:?}", "timestamp:".cyan().bold(), timestamp);
                println!(
                    "{} {}x{} (par {par})",
                    "overlay:".cyan().bold(),
                    width,
                    height
                );
                println!("{} {display_size}", "display size:".cyan().bold());
                if bbox.is_empty() {
                    println!("{} empty (nothing to draw)", "bounding box:".cyan().bold());
                } else {
                    println!(
                        "{} {}x{} at ({}, {})",
                        "bounding box:".cyan().bold(),
                        bbox.width,
                        bbox.height,
                        bbox.x,
                        bbox.y
                    );
                }
            }
        }
        Commands::Render {
            input,
            at,
            size,
            par,
            out,
            crop,
            style,
        } => {
            let cue = load_cue(&input)?;
            let (width, height) = parse_size(&size)?;
            let timestamp = parse_timecode(&at)?;
            let params = style.to_params()?;
            ensure_writable_path(&out, cli.global.overwrite)?;

            let mut renderer = new_renderer(&cli.global);
            let bbox = renderer.prerender(&cue, timestamp, &params, width, height, par);
            let mut overlay = Overlay::for_bounding_box(bbox);
            renderer.render(overlay.data_mut());

            let image = if crop {
                overlay.to_rgba_image()
            } else {
                paste_into_frame(&overlay, width, height)
            };
            image.save(&out)?;

            if cli.global.verbose {
                eprintln!("bounding box: {bbox:?}");
            }
            println!(
                "{} {}",
                "success:".green().bold(),
                format!("Rendered {} -> {}", input.display(), out.display()).green()
            );
        }
        Commands::Sequence {
            input,
            from,
            to,
            fps,
            size,
            par,
            out,
            progress,
            style,
        } => {
            let cue = load_cue(&input)?;
            let (width, height) = parse_size(&size)?;
            let start = parse_timecode(&from)?;
            let end = parse_timecode(&to)?;
            if start > end {
                return Err(SubRenderError::InvalidParameter(
                    "--from must be <= --to".to_string(),
                )
                .into());
            }
            if !(fps.is_finite() && fps > 0.0) {
                return Err(SubRenderError::InvalidParameter(
                    "--fps must be positive".to_string(),
                )
                .into());
            }
            let params = style.to_params()?;

            fs::create_dir_all(&out)?;
            let step = Duration::from_secs_f64(1.0 / fps);
            let frame_count = ((end - start).as_secs_f64() * fps).floor() as u64 + 1;

            let progress_bar = if progress {
                let pb = ProgressBar::new(frame_count);
                let style = ProgressStyle::with_template(
                    "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
                )?;
                pb.set_style(style.progress_chars("##-"));
                Some(pb)
            } else {
                None
            };

            let mut renderer = new_renderer(&cli.global);
            let mut rendered = 0_u64;
            for frame_number in 0..frame_count {
                let timestamp = start + step * frame_number as u32;
                let output_path = out.join(format!("frame_{frame_number:06}.png"));
                if output_path.exists() && !cli.global.overwrite {
                    return Err(format!(
                        "output file already exists: {} (use --overwrite)",
                        output_path.display()
                    )
                    .into());
                }

                let bbox = renderer.prerender(&cue, timestamp, &params, width, height, par);
                let mut overlay = Overlay::for_bounding_box(bbox);
                renderer.render(overlay.data_mut());
                paste_into_frame(&overlay, width, height).save(&output_path)?;
                rendered += 1;

                if let Some(pb) = &progress_bar {
                    pb.inc(1);
                }
                if cli.global.verbose {
                    eprintln!(
                        "saved frame {} ({timestamp:?}) -> {}",
                        frame_number,
                        output_path.display()
                    );
                }
            }

            if let Some(pb) = progress_bar {
                pb.finish_with_message("done");
            }
            println!(
                "{} {}",
                "success:".green().bold(),
                format!("Rendered {rendered} frame(s) to {}", out.display()).green()
            );
        }
    }

    Ok(())
}

impl StyleOptions {
    fn to_params(&self) -> Result<RenderParams, SubRenderError> {
        let color = match &self.color {
            Some(value) => Some(parse_color(value)?),
            None => None,
        };
        if !(-1.0..=1.0).contains(&self.offset) {
            return Err(SubRenderError::InvalidParameter(
                "--offset must be in -1.0..=1.0".to_string(),
            ));
        }
        Ok(RenderParams {
            font: self.font.clone(),
            font_size: self.font_size,
            scale: self.scale,
            color,
            vertical_offset: self.offset,
        })
    }
}

fn new_renderer(global: &GlobalOptions) -> SubtitleRenderer {
    match &global.font_dir {
        Some(dir) => SubtitleRenderer::with_font_dir(dir),
        None => SubtitleRenderer::new(),
    }
}

/// Load a cue from a file, detecting the script format.
///
/// Files with an `.ass`/`.ssa` extension or a `[Script Info]` section are
/// treated as ASS markup; everything else is rendered as plain text.
fn load_cue(path: &Path) -> Result<SubtitleCue, SubRenderError> {
    let content = fs::read_to_string(path).map_err(|error| SubRenderError::ScriptRead {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let looks_like_ass = matches!(extension.as_deref(), Some("ass" | "ssa"))
        || content.lines().any(|line| {
            line.trim()
                .trim_start_matches('\u{feff}')
                .eq_ignore_ascii_case("[Script Info]")
        });

    if looks_like_ass {
        Ok(SubtitleCue::ass(content))
    } else {
        Ok(SubtitleCue::plain_text(content))
    }
}

fn parse_size(value: &str) -> Result<(u32, u32), SubRenderError> {
    let invalid =
        || SubRenderError::InvalidGeometry(format!("expected WIDTHxHEIGHT, got {value:?}"));
    let (width, height) = value.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = width.trim().parse().map_err(|_| invalid())?;
    let height: u32 = height.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(SubRenderError::InvalidGeometry(
            "overlay dimensions must be non-zero".to_string(),
        ));
    }
    Ok((width, height))
}

/// Parse a timestamp as plain seconds or `H:MM:SS.cc`.
fn parse_timecode(value: &str) -> Result<Duration, SubRenderError> {
    if let Ok(seconds) = value.trim().parse::<f64>() {
        if seconds >= 0.0 && seconds.is_finite() {
            return Ok(Duration::from_secs_f64(seconds));
        }
        return Err(SubRenderError::InvalidTimestamp(value.to_string()));
    }
    subrender::script::parse_timestamp(value).ok_or_else(|| {
        SubRenderError::InvalidTimestamp(format!("{value} (expected seconds or H:MM:SS.cc)"))
    })
}

fn parse_color(value: &str) -> Result<[u8; 3], SubRenderError> {
    let hex = value.trim().trim_start_matches('#');
    let invalid =
        || SubRenderError::InvalidParameter(format!("expected --color RRGGBB, got {value:?}"));
    if hex.len() != 6 {
        return Err(invalid());
    }
    let raw = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
    Ok([(raw >> 16) as u8, (raw >> 8) as u8, raw as u8])
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !overwrite {
        return Err(format!(
            "output file already exists: {} (use --overwrite)",
            path.display()
        )
        .into());
    }
    Ok(())
}

/// Paste a rendered overlay region into a full-size transparent frame.
fn paste_into_frame(overlay: &Overlay, width: u32, height: u32) -> RgbaImage {
    let mut frame = RgbaImage::new(width, height);
    let bbox = overlay.bounding_box();
    let region = overlay.to_rgba_image();
    for (x, y, pixel) in region.enumerate_pixels() {
        let frame_x = bbox.x + x as i32;
        let frame_y = bbox.y + y as i32;
        if frame_x >= 0 && frame_y >= 0 && (frame_x as u32) < width && (frame_y as u32) < height {
            frame.put_pixel(frame_x as u32, frame_y as u32, *pixel);
        }
    }
    frame
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
