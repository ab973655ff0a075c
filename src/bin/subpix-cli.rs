use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use subpix::{
    DecodeOutcome, DisplayArea, FfmpegLogLevel, IndexPlane, Margins, OverlayHandle, OverlayUpdate,
    PalettedOverlay, StreamDescriptor, StreamType, SubtitlePacket, SubtitleTrack, TrackOptions,
    bitmap::expand_palette,
};

const CLI_AFTER_HELP: &str = "Examples:\n  subpix streams movie.mkv --json\n  subpix render movie.mkv --out subs --size 1920x1080 --progress\n  subpix render disc.mkv --out subs --legacy\n  subpix completions zsh > _subpix";

#[derive(Debug, Parser)]
#[command(
    name = "subpix",
    version,
    about = "Decode bitmap subtitle streams into positioned RGBA images",
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

    /// Show a progress spinner while reading packets.
    #[arg(long)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List bitmap subtitle streams.
    #[command(
        about = "List bitmap subtitle streams",
        visible_alias = "probe",
        after_help = "Examples:\n  subpix streams movie.mkv\n  subpix streams movie.mkv --json"
    )]
    Streams {
        /// Input media path.
        input: PathBuf,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Decode a subtitle stream and write each displayed part as PNG.
    #[command(
        about = "Render subtitle parts to PNG",
        after_help = "Examples:\n  subpix render movie.mkv --out subs\n  subpix render movie.mkv --out subs --stream 3 --size 1280x720 --margins 0,0,40,40"
    )]
    Render {
        /// Input media path.
        input: PathBuf,
        /// Output directory.
        #[arg(long)]
        out: PathBuf,
        /// Stream index. Defaults to the first bitmap subtitle stream.
        #[arg(long)]
        stream: Option<usize>,
        /// Display size as WIDTHxHEIGHT.
        #[arg(long, default_value = "1920x1080")]
        size: String,
        /// Margins as LEFT,RIGHT,TOP,BOTTOM.
        #[arg(long, default_value = "0,0,0,0")]
        margins: String,
        /// Push subtitles to the paletted overlay instead of RGBA.
        #[arg(long)]
        legacy: bool,
        /// Seconds before a subtitle's end at which it counts as stale.
        #[arg(long, default_value_t = 300.0)]
        stale_after: f64,
        /// Print one JSON object per event instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_size(value: &str) -> Option<(i32, i32)> {
    let (width, height) = value.trim().split_once(['x', 'X'])?;
    let width = width.trim().parse::<i32>().ok()?;
    let height = height.trim().parse::<i32>().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}

fn parse_margins(value: &str) -> Option<Margins> {
    let parts: Vec<i32> = value
        .split(',')
        .map(|part| part.trim().parse::<i32>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [left, right, top, bottom] => Some(Margins {
            left: *left,
            right: *right,
            top: *top,
            bottom: *bottom,
        }),
        _ => None,
    }
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed = FfmpegLogLevel::parse(level)
            .ok_or(format!("unsupported --log-level: {level}"))?;
        subpix::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

/// Codec private data of a demuxed stream.
fn stream_extradata(parameters: &ffmpeg_next::codec::Parameters) -> Vec<u8> {
    // Safety: libavformat keeps `extradata_size` bytes at `extradata`.
    unsafe {
        let raw = parameters.as_ptr();
        let data = (*raw).extradata;
        let size = (*raw).extradata_size;
        if data.is_null() || size <= 0 {
            Vec::new()
        } else {
            std::slice::from_raw_parts(data, size as usize).to_vec()
        }
    }
}

/// Writes each paletted image the legacy path pushes as a PNG.
struct PngOverlay {
    out: PathBuf,
    written: Rc<RefCell<Vec<PathBuf>>>,
}

impl PalettedOverlay for PngOverlay {
    fn update(&mut self, update: OverlayUpdate<'_>) {
        let OverlayUpdate::Show { image, window } = update else {
            return;
        };
        let Ok(plane) = IndexPlane::new(
            image.indices,
            image.width as usize,
            image.height as usize,
            image.stride,
        ) else {
            return;
        };
        let pixels = expand_palette(&plane, image.palette);
        let Some(buffer) = image::RgbaImage::from_raw(image.width, image.height, pixels) else {
            return;
        };

        let index = self.written.borrow().len();
        let start_ms = window.start.map_or(0, |start| (start * 1000.0) as i64);
        let path = self.out.join(format!("legacy_{index:05}_{start_ms}ms.png"));
        match buffer.save(&path) {
            Ok(()) => self.written.borrow_mut().push(path),
            Err(error) => eprintln!("{} {}", "error:".red().bold(), error),
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;
    ffmpeg_next::init()?;

    match cli.command {
        Commands::Streams { input, json } => {
            let context = ffmpeg_next::format::input(&input)?;
            let streams: Vec<_> = context
                .streams()
                .filter_map(|stream| {
                    let parameters = stream.parameters();
                    StreamType::from_codec_id(parameters.id()).map(|stream_type| {
                        (stream.index(), stream_type, stream_extradata(&parameters).len())
                    })
                })
                .collect();

            if json {
                let payload: Vec<_> = streams
                    .iter()
                    .map(|(index, stream_type, extradata)| {
                        json!({
                            "index": index,
                            "type": stream_type.to_string(),
                            "tag": stream_type.tag().to_string(),
                            "extradata_bytes": extradata,
                            "rgba": stream_type.has_reliable_geometry(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else if streams.is_empty() {
                println!("No bitmap subtitle streams");
            } else {
                for (index, stream_type, extradata) in &streams {
                    println!(
                        "#{index}: {} ({} bytes extradata{})",
                        stream_type.to_string().bold(),
                        extradata,
                        if stream_type.has_reliable_geometry() {
                            ""
                        } else {
                            ", legacy overlay"
                        }
                    );
                }
            }
        }
        Commands::Render {
            input,
            out,
            stream,
            size,
            margins,
            legacy,
            stale_after,
            json,
        } => {
            let (width, height) =
                parse_size(&size).ok_or(format!("invalid --size: {size}"))?;
            let margins = parse_margins(&margins).ok_or(format!("invalid --margins: {margins}"))?;
            let area = DisplayArea::new(width, height).with_margins(margins);
            fs::create_dir_all(&out)?;

            let mut context = ffmpeg_next::format::input(&input)?;
            let (stream_index, time_base, descriptor) = {
                let selected = match stream {
                    Some(index) => context
                        .stream(index)
                        .ok_or(format!("no stream with index {index}"))?,
                    None => context
                        .streams()
                        .find(|candidate| {
                            StreamType::from_codec_id(candidate.parameters().id()).is_some()
                        })
                        .ok_or("no bitmap subtitle stream found")?,
                };
                let parameters = selected.parameters();
                let descriptor =
                    StreamDescriptor::from_codec_id(parameters.id(), stream_extradata(&parameters))
                        .ok_or(format!(
                            "stream {} is not a bitmap subtitle stream",
                            selected.index()
                        ))?;
                (selected.index(), selected.time_base(), descriptor)
            };

            let written = Rc::new(RefCell::new(Vec::new()));
            let overlay_written = Rc::clone(&written);
            let overlay_out = out.clone();
            let overlay = OverlayHandle::new(move |_, _| {
                Box::new(PngOverlay {
                    out: overlay_out.clone(),
                    written: Rc::clone(&overlay_written),
                }) as Box<dyn PalettedOverlay>
            });

            let options = TrackOptions::new()
                .with_rgba_support(!legacy)
                .with_expiry_hysteresis(Duration::from_secs_f64(stale_after.max(0.0)));
            let mut track = SubtitleTrack::open(descriptor, options, overlay)?;

            let spinner = if cli.global.progress {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(ProgressStyle::with_template(
                    "{spinner:.green} {pos} packets {msg}",
                )?);
                Some(spinner)
            } else {
                None
            };

            let seconds_per_tick = f64::from(time_base);
            let mut events = 0_usize;
            for (packet_stream, packet) in context.packets() {
                if packet_stream.index() != stream_index {
                    continue;
                }
                if let Some(spinner) = &spinner {
                    spinner.inc(1);
                }

                let pts = packet.pts().map(|pts| pts as f64 * seconds_per_tick);
                let duration =
                    (packet.duration() > 0).then(|| packet.duration() as f64 * seconds_per_tick);
                let payload = packet.data().unwrap_or_default();
                let outcome = track.decode(&SubtitlePacket::new(payload, pts, duration));
                if cli.global.verbose {
                    eprintln!("{} pts={:?} {:?}", "packet".cyan().bold(), pts, outcome);
                }

                if !matches!(outcome, DecodeOutcome::Rgba { .. }) {
                    continue;
                }

                let window = track.window();
                let now = window.start.or(pts).unwrap_or(0.0);
                let bitmaps = track.bitmaps(&area, now);
                for (part_index, part) in bitmaps.parts.iter().enumerate() {
                    let path = out.join(format!("event_{events:05}_part_{part_index}.png"));
                    ensure_writable_path(&path, cli.global.overwrite)?;
                    let image = part
                        .to_image()
                        .ok_or("subtitle part does not match its dimensions")?;
                    image.save(&path)?;

                    if json {
                        let payload = json!({
                            "event": events,
                            "part": part_index,
                            "start_seconds": window.start,
                            "end_seconds": window.end,
                            "x": part.x,
                            "y": part.y,
                            "display_width": part.display_width,
                            "display_height": part.display_height,
                            "content_id": bitmaps.content_id,
                            "position_id": bitmaps.position_id,
                            "scaled": bitmaps.scaled,
                            "path": path.display().to_string(),
                        });
                        println!("{}", serde_json::to_string(&payload)?);
                    }
                }
                events += 1;
            }

            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }
            track.uninit();

            if !json {
                let legacy_images = written.borrow().len();
                println!(
                    "{} {} RGBA events, {} legacy images written to {}",
                    "done".green().bold(),
                    events,
                    legacy_images,
                    out.display()
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "subpix", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
