use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use slidereel::{
    Background, CancelHandle, Collaborators, CommandSynthesizer, FfmpegConcatBackend,
    FfmpegSegmentRenderer, FontDescriptor, FontFitEngine, ImageSlideSource, LanguageSelection,
    MarkdownScriptSource, MarkdownSlideSource, NarrationSource, ParleyMeasurer, Resolution,
    Rgba8, RunConfig, SlideContent, SlideContentSource, SpeechEngine, TextAlign, TextMeasurer,
    VerticalAlign,
};
use slidereel::render::raster::{SlideRasterizer, SlideStyle};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "slidereel",
    version,
    about = "Turn text slides and a narration script into one narrated MP4"
)]
struct Cli {
    /// Log per-slide detail.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the narrated MP4 (requires `ffmpeg` and `ffprobe` on PATH).
    Render(RenderArgs),
    /// Render one slide as a PNG, with the font size the video would use.
    Frame(FrameArgs),
    /// List the voices the speech engine offers.
    Voices(VoicesArgs),
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct DeckArgs {
    /// Markdown presentation: slides separated by `---` lines.
    #[arg(long)]
    presentation: Option<PathBuf>,

    /// Directory of pre-rendered page images, one slide per image.
    #[arg(long)]
    pages: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct StyleArgs {
    /// JSON run configuration; flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output frame size, `WxH`.
    #[arg(long)]
    resolution: Option<Resolution>,

    /// Background color: a name, `#RRGGBB` or `#RRGGBBAA`.
    #[arg(long, conflicts_with = "bg_image")]
    bg_color: Option<Rgba8>,

    /// Background image scaled to cover the frame.
    #[arg(long)]
    bg_image: Option<PathBuf>,

    #[arg(long)]
    text_color: Option<Rgba8>,

    /// `.ttf`/`.otf`/`.ttc` used for measuring and drawing.
    #[arg(long)]
    font_file: Option<PathBuf>,

    /// Largest font size in pixels.
    #[arg(long)]
    font_size: Option<u32>,

    /// Margin in pixels on every side.
    #[arg(long)]
    margin: Option<u32>,

    #[arg(long, value_enum)]
    align: Option<AlignChoice>,

    /// Center the text block vertically.
    #[arg(long)]
    center_vertically: bool,

    /// Render the `## ` heading of each slide.
    #[arg(long)]
    show_titles: bool,

    /// Fail when a line does not fit the canvas width even at size 1.
    #[arg(long)]
    strict_width: bool,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    deck: DeckArgs,

    /// Narration script: `### Slide title` blocks separated by `---` lines.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Output MP4 path.
    #[arg(long, short)]
    output: PathBuf,

    #[command(flatten)]
    style: StyleArgs,

    #[arg(long, value_enum)]
    engine: Option<EngineChoice>,

    #[arg(long)]
    voice: Option<String>,

    /// Preferred narration languages, in order (`--language zh --language en`).
    #[arg(long = "language")]
    languages: Vec<String>,

    /// Seconds shown for slides without narration.
    #[arg(long)]
    silent_duration: Option<f64>,

    /// Seconds of silence before narration starts.
    #[arg(long)]
    narration_delay: Option<f64>,

    /// Frame rate, `30` or `30000/1001`.
    #[arg(long)]
    fps: Option<String>,

    /// Slides processed at the same time.
    #[arg(long, short)]
    jobs: Option<usize>,

    /// Keep intermediate files and print where they are.
    #[arg(long)]
    keep_work_dir: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    deck: DeckArgs,

    /// 1-based slide number.
    #[arg(long)]
    slide: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    style: StyleArgs,
}

#[derive(Parser, Debug)]
struct VoicesArgs {
    #[arg(long, value_enum, default_value_t = EngineChoice::Say)]
    engine: EngineChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EngineChoice {
    Say,
    EspeakNg,
}

impl From<EngineChoice> for SpeechEngine {
    fn from(value: EngineChoice) -> Self {
        match value {
            EngineChoice::Say => Self::Say,
            EngineChoice::EspeakNg => Self::EspeakNg,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlignChoice {
    Left,
    Center,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Voices(args) => cmd_voices(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "slidereel=debug" } else { "slidereel=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn base_config(style: &StyleArgs) -> anyhow::Result<RunConfig> {
    let mut cfg = match &style.config {
        Some(path) => RunConfig::from_json_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(r) = style.resolution {
        cfg.resolution = r;
    }
    if let Some(c) = style.bg_color {
        cfg.background = Background::Color(c);
    }
    if let Some(p) = &style.bg_image {
        cfg.background = Background::Image(p.clone());
    }
    if let Some(c) = style.text_color {
        cfg.text_color = c;
    }
    if let Some(p) = &style.font_file {
        cfg.font_file = p.clone();
    }
    if let Some(s) = style.font_size {
        cfg.max_font_size = s;
    }
    if let Some(m) = style.margin {
        cfg.margin = m;
    }
    if let Some(a) = style.align {
        cfg.text_align = match a {
            AlignChoice::Left => TextAlign::Left,
            AlignChoice::Center => TextAlign::Center,
        };
    }
    if style.center_vertically {
        cfg.vertical_align = VerticalAlign::Center;
    }
    cfg.show_titles |= style.show_titles;
    cfg.strict_width |= style.strict_width;
    Ok(cfg)
}

fn parse_fps(s: &str) -> anyhow::Result<slidereel::Fps> {
    let (num, den) = s.split_once('/').unwrap_or((s, "1"));
    let num = num.trim().parse().with_context(|| format!("invalid fps '{s}'"))?;
    let den = den.trim().parse().with_context(|| format!("invalid fps '{s}'"))?;
    Ok(slidereel::Fps::new(num, den)?)
}

fn slide_source(
    deck: &DeckArgs,
    show_titles: bool,
) -> anyhow::Result<Box<dyn SlideContentSource>> {
    match (&deck.presentation, &deck.pages) {
        (Some(path), _) => Ok(Box::new(MarkdownSlideSource::from_path(path, show_titles)?)),
        (None, Some(dir)) => Ok(Box::new(ImageSlideSource::from_dir(dir)?)),
        (None, None) => anyhow::bail!("one of --presentation or --pages is required"),
    }
}

fn parley_measurer() -> Box<dyn TextMeasurer> {
    Box::new(ParleyMeasurer::new())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = base_config(&args.style)?;
    cfg.output = args.output.clone();
    if let Some(e) = args.engine {
        cfg.speech_engine = e.into();
    }
    if let Some(v) = &args.voice {
        cfg.voice = v.clone();
    }
    if !args.languages.is_empty() {
        cfg.languages = LanguageSelection {
            preferred: args.languages.clone(),
            ..cfg.languages
        };
    }
    if let Some(d) = args.silent_duration {
        cfg.silent_duration = d;
    }
    if let Some(d) = args.narration_delay {
        cfg.narration_delay = d;
    }
    if let Some(f) = &args.fps {
        cfg.fps = parse_fps(f)?;
    }
    if let Some(j) = args.jobs {
        cfg.concurrency = j;
    }
    cfg.keep_work_dir |= args.keep_work_dir;
    cfg.validate()?;

    let font = load_font(&cfg.font_file)?;
    let slides = slide_source(&args.deck, cfg.show_titles)?;
    let script = args
        .script
        .as_deref()
        .map(|p| MarkdownScriptSource::from_path(p, cfg.languages.clone()))
        .transpose()?;
    let synthesizer = CommandSynthesizer::new(cfg.speech_engine);
    let renderer = FfmpegSegmentRenderer::new(&cfg, font.clone())?;

    let report = slidereel::run(
        &cfg,
        &font,
        Collaborators {
            slides: slides.as_ref(),
            narration: script.as_ref().map(|s| s as &dyn NarrationSource),
            measurers: &parley_measurer,
            synthesizer: &synthesizer,
            renderer: &renderer,
            concat: &FfmpegConcatBackend,
        },
    )?;

    eprintln!(
        "wrote {} ({} slides, {} narrated, {:.2}s)",
        report.output.display(),
        report.slide_count,
        report.narrated_count,
        report.encoded_seconds
    );
    if let Some(dir) = &report.work_dir {
        eprintln!("intermediates kept in {}", dir.display());
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = base_config(&args.style)?;
    cfg.validate()?;
    let font = load_font(&cfg.font_file)?;
    let slides = slide_source(&args.deck, cfg.show_titles)?.slides()?;
    let slide = slides
        .iter()
        .find(|s| s.index == args.slide)
        .with_context(|| format!("slide {} not found (deck has {})", args.slide, slides.len()))?;

    let style = SlideStyle::from_config(&cfg)?;
    let mut rasterizer = SlideRasterizer::new();
    let frame = match &slide.content {
        SlideContent::Lines(lines) => {
            let engine = FontFitEngine::new(
                font.clone(),
                cfg.max_font_size,
                style.canvas(),
                cfg.strict_width,
            );
            let layout = engine.fit(slide.index, lines, &mut ParleyMeasurer::new())?;
            eprintln!(
                "slide {}: font size {}px, {} lines",
                slide.index, layout.font_size, layout.line_count
            );
            rasterizer.rasterize_text(&style, &font, lines, &layout)?
        }
        SlideContent::Image(bytes) => rasterizer.rasterize_image(&style, bytes)?,
    };

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame.write_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_voices(args: VoicesArgs) -> anyhow::Result<()> {
    let synthesizer = CommandSynthesizer::new(args.engine.into());
    for voice in synthesizer.voices(&CancelHandle::new())? {
        println!("{voice}");
    }
    Ok(())
}

fn load_font(path: &Path) -> anyhow::Result<FontDescriptor> {
    FontDescriptor::load(path)
        .with_context(|| format!("load font '{}' (set --font-file)", path.display()))
}
