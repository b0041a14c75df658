use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use slidecast::{
    AudioTable, Codec, CommandSynthesizer, FfmpegSink, FfmpegSinkOpts, InputProps, Language,
    NarrationStore, RenderDriver, RenderProgress, RenderRequest, SegmentOwner, SlideDriver,
    ThemeRegistry, VideoConfig, VideoConfigOverrides,
};

#[derive(Parser, Debug)]
#[command(name = "slidecast", version, about = "Turn JSON slide decks into narrated videos")]
struct Cli {
    /// More log output (-v info, -vv debug). `SLIDECAST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a presentation to a video file (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Validate a presentation document.
    Validate(ValidateArgs),
    /// Export each slide as a still image.
    ExportImages(ExportArgs),
}

#[derive(Parser, Debug)]
struct DocumentArgs {
    /// Input presentation JSON.
    #[arg(long = "in", short = 'i')]
    in_path: PathBuf,

    /// Override JSON deep-merged over the input. Defaults to `override.json` beside it.
    #[arg(long = "override")]
    override_path: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    doc: DocumentArgs,

    /// Output video path.
    #[arg(long, short = 'o')]
    out: PathBuf,

    /// Narration language (en or hi).
    #[arg(long, short = 'l', default_value = "en", value_parser = parse_language)]
    language: Language,

    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    fps: Option<u32>,

    /// Video codec (h264, h265, vp8, vp9).
    #[arg(long)]
    codec: Option<Codec>,

    /// Audio bitrate, e.g. 192k.
    #[arg(long)]
    audio_bitrate: Option<String>,

    /// Video bitrate, e.g. 5M.
    #[arg(long)]
    video_bitrate: Option<String>,

    /// Render a silent video with the fallback duration for every slide.
    #[arg(long, default_value_t = false)]
    no_audio: bool,

    /// Narration directory. Defaults to `audio/` beside the input.
    #[arg(long)]
    audio_dir: Option<PathBuf>,

    /// Speech synthesizer run for missing or stale narration.
    #[arg(long)]
    tts_command: Option<String>,

    /// Argument for `--tts-command`; `{language}` and `{output}` are expanded. Repeatable.
    #[arg(long = "tts-arg", allow_hyphen_values = true)]
    tts_args: Vec<String>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    #[command(flatten)]
    doc: DocumentArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    doc: DocumentArgs,

    /// Output directory for the images.
    #[arg(long = "out-dir", short = 'o')]
    out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = ImageFormat::Png)]
    format: ImageFormat,

    /// JPEG quality.
    #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Language used to size the timeline.
    #[arg(long, short = 'l', default_value = "en", value_parser = parse_language)]
    language: Language,

    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    fps: Option<u32>,
}

fn parse_language(s: &str) -> Result<Language, String> {
    match s.to_ascii_lowercase().as_str() {
        "en" => Ok(Language::En),
        "hi" => Ok(Language::Hi),
        other => Err(format!("unknown language '{other}', expected en or hi")),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Validate(args) => cmd_validate(args),
        Command::ExportImages(args) => cmd_export_images(args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_env("SLIDECAST_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn input_dir(in_path: &Path) -> PathBuf {
    in_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}

fn load(doc: &DocumentArgs) -> anyhow::Result<slidecast::ValidatedPresentation> {
    slidecast::load_presentation(&doc.in_path, doc.override_path.as_deref())
        .with_context(|| format!("load presentation '{}'", doc.in_path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = VideoConfig::merged(VideoConfigOverrides {
        width: args.width,
        height: args.height,
        fps: args.fps,
        codec: args.codec,
        audio_bitrate: args.audio_bitrate.clone(),
        video_bitrate: args.video_bitrate.clone(),
    });
    config.validate()?;
    let fps = config.frame_rate()?;
    let canvas = config.canvas()?;

    let presentation = load(&args.doc)?.presentation;
    let root = input_dir(&args.doc.in_path);
    tracing::info!(
        slides = presentation.slides.len(),
        language = %args.language,
        codec = %config.codec,
        "rendering {}x{} at {fps} fps",
        config.width,
        config.height
    );

    let audio = if args.no_audio {
        AudioTable::silent(presentation.slides.len())
    } else {
        let dir = args.audio_dir.clone().unwrap_or_else(|| root.join("audio"));
        let mut store = NarrationStore::new(dir);
        if let Some(program) = &args.tts_command {
            store = store.with_synthesizer(CommandSynthesizer::new(
                program.clone(),
                args.tts_args.iter().cloned(),
            ));
        }
        slidecast::resolve_narration(&presentation, args.language, fps, &store)?
    };

    let driver =
        SlideDriver::new(ThemeRegistry::builtin(), Some(root)).with_audio(!args.no_audio);
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::from_config(args.out.clone(), &config));
    let props = InputProps {
        presentation: &presentation,
        language: args.language,
        audio: &audio,
    };

    let mut last_permille = None;
    let mut report = |p: RenderProgress| {
        let permille = (p.fraction * 1000.0).floor() as u64;
        if last_permille == Some(permille) {
            return;
        }
        last_permille = Some(permille);
        let mut err = std::io::stderr().lock();
        let _ = write!(
            err,
            "\rprogress: {:.1}% ({} frames rendered, {} encoded)",
            p.fraction * 100.0,
            p.frames_rendered,
            p.frames_encoded
        );
        let _ = err.flush();
    };
    let req = RenderRequest::new(fps, canvas);
    let result = driver.render_media(&req, &props, &mut sink, &mut report);
    eprintln!();
    let stats = result.with_context(|| format!("render '{}'", args.out.display()))?;

    tracing::info!(
        frames = stats.frames_total,
        rasterized = stats.frames_rasterized,
        audio_clips = stats.audio_clips,
        "render complete"
    );
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let validated = load(&args.doc)?;
    let p = &validated.presentation;
    println!("presentation is valid");
    println!("  title:  {}", p.title.as_deref().unwrap_or("(untitled)"));
    println!("  slides: {}", p.slides.len());
    println!("  theme:  {}", p.theme.as_deref().unwrap_or("default"));
    for warning in &validated.warnings {
        println!("  warning: {warning}");
    }
    Ok(())
}

fn cmd_export_images(args: ExportArgs) -> anyhow::Result<()> {
    let config = VideoConfig::merged(VideoConfigOverrides {
        width: args.width,
        height: args.height,
        fps: args.fps,
        ..VideoConfigOverrides::default()
    });
    config.validate()?;
    let fps = config.frame_rate()?;
    let canvas = config.canvas()?;

    let presentation = load(&args.doc)?.presentation;
    let root = input_dir(&args.doc.in_path);
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let audio = AudioTable::silent(presentation.slides.len());
    let props = InputProps {
        presentation: &presentation,
        language: args.language,
        audio: &audio,
    };
    let req = RenderRequest::new(fps, canvas);
    let driver = SlideDriver::new(ThemeRegistry::builtin(), Some(root)).with_audio(false);
    let timeline = driver.timeline(&req, &props)?;

    let mut targets = Vec::with_capacity(presentation.slides.len() + 1);
    if presentation.front_page.is_some() {
        targets.push((SegmentOwner::FrontPage, "00-front-page".to_owned()));
    }
    for (i, slide) in presentation.slides.iter().enumerate() {
        targets.push((SegmentOwner::Slide(i), format!("{:02}-{}", i + 1, slide.id)));
    }

    let ext = args.format.extension();
    for (owner, stem) in targets {
        let frame_idx = timeline
            .first_frame(owner)
            .with_context(|| format!("no timeline segment for {stem}"))?;
        let frame = driver.render_still(&req, &props, frame_idx)?;
        let out = args.out_dir.join(format!("{stem}.{ext}"));
        save_image(&frame, &out, args.format, args.quality)
            .with_context(|| format!("write image '{}'", out.display()))?;
        eprintln!("wrote {}", out.display());
    }
    Ok(())
}

fn save_image(
    frame: &slidecast::FrameRGBA,
    out: &Path,
    format: ImageFormat,
    quality: u8,
) -> anyhow::Result<()> {
    let img = frame.to_rgba_image()?;
    match format {
        ImageFormat::Png => img.save_with_format(out, image::ImageFormat::Png)?,
        ImageFormat::Jpeg => {
            let rgb = image::DynamicImage::ImageRgba8(img).into_rgb8();
            let file = std::fs::File::create(out)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                std::io::BufWriter::new(file),
                quality,
            );
            encoder.encode_image(&rgb)?;
        }
    }
    Ok(())
}
