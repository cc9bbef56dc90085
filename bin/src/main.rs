mod config;
mod stats;

use std::fs;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use boardshapes::serialize::{
    binary_serialize, deserialize, json_serialize, DeserializationOptions, SerializationOptions,
};
use boardshapes::{create_shapes, simplify_image, Epsilon, ShapeOptions};
use clap::Parser;
use image::RgbaImage;

use crate::config::{Config, Mode};
use crate::stats::Benchmark;

#[derive(Parser)]
#[command(name = "boardshapes")]
#[command(about = "Convert whiteboard-style drawings into colored vector shapes")]
#[command(version)]
struct Args {
    /// Input image or shape-data file; "-" reads from stdin
    input: Option<String>,

    /// Operation to perform
    #[arg(short, long, value_enum, default_value = "generate")]
    mode: Mode,

    /// Resize the input to fit [width]x[height] while keeping aspect
    /// ratio. Both dimensions are optional (e.g. 800x600, 800x, x600);
    /// leaving both empty selects the default 1920x1080.
    #[arg(short, long)]
    resize: Option<String>,

    /// Serialize shape data to the binary format instead of JSON
    #[arg(short, long)]
    binary: bool,

    /// Path to the output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the output to stdout instead of a file
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Epsilon for Ramer-Douglas-Peucker simplification. Smaller values
    /// keep more detail. 0 selects the default; a negative value skips
    /// RDP entirely (straight-line optimization always runs).
    #[arg(short, long)]
    epsilon: Option<f64>,

    /// Configuration file path (.json or .toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Generate the default configuration file and exit
    #[arg(long)]
    generate_config: bool,

    /// Verbose output
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.generate_config {
        let path = args
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from("boardshapes.json"));
        save_default_config(&path)?;
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &args);

    let input = args
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("no input file specified"))?;
    let input_bytes = read_input(input)?;

    let mut benchmark = Benchmark::now();
    benchmark.step("read input");

    let output = match args.mode {
        Mode::Generate => {
            let img = decode_image(&input_bytes, &config, &mut benchmark)?;
            let options = shape_options(&config);
            let data = create_shapes(&img, &options)?;
            benchmark.step("create shapes");
            if config.processing.verbose {
                eprintln!("generated {} shapes", data.shapes.len());
            }
            let bytes = serialize_data(&data, &config)?;
            benchmark.step("serialize");
            bytes
        }
        Mode::Simplify => {
            let img = decode_image(&input_bytes, &config, &mut benchmark)?;
            let simplified = simplify_image(&img, config.processing.allow_white);
            benchmark.step("simplify palette");
            let bytes = encode_preview(&simplified.to_rgba(), output_path(&config, args.mode))?;
            benchmark.step("encode image");
            bytes
        }
        Mode::Reserialize => {
            let data = deserialize(&input_bytes, &DeserializationOptions::default())?;
            benchmark.step("deserialize");
            if config.processing.verbose {
                eprintln!(
                    "read {} shapes of data version {}",
                    data.shapes.len(),
                    data.version
                );
            }
            let bytes = serialize_data(&data, &config)?;
            benchmark.step("serialize");
            bytes
        }
    };

    write_output(&output, &config, args.mode)?;
    benchmark.step("write output");

    if config.processing.verbose {
        benchmark.print_summary();
    }
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if args.resize.is_some() {
        config.processing.resize = args.resize.clone();
    }
    if let Some(epsilon) = args.epsilon {
        config.processing.epsilon = epsilon;
    }
    if args.verbose {
        config.processing.verbose = true;
    }
    if args.binary {
        config.output.binary = true;
    }
    if args.stdout {
        config.output.stdout = true;
    }
    if let Some(output) = &args.output {
        config.output.path = Some(output.clone());
    }
}

fn shape_options(config: &Config) -> ShapeOptions {
    ShapeOptions {
        no_color_separation: config.processing.no_color_separation,
        allow_white: config.processing.allow_white,
        preserve_color: config.processing.preserve_color,
        keep_small_regions: config.processing.keep_small_regions,
        epsilon: Epsilon::from_sentinel(config.processing.epsilon),
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&text)?,
        Some("toml") => toml::from_str(&text)?,
        _ => bail!("unsupported config file format, use .json or .toml"),
    };
    Ok(config)
}

fn save_default_config(path: &Path) -> anyhow::Result<()> {
    let config = Config::default();
    let text = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::to_string_pretty(&config)?,
        _ => serde_json::to_string_pretty(&config)?,
    };
    fs::write(path, text)?;
    println!("generated default configuration file: {}", path.display());
    Ok(())
}

fn read_input(input: &str) -> anyhow::Result<Vec<u8>> {
    if input == "-" {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("failed to read stdin")?;
        Ok(bytes)
    } else {
        fs::read(input).with_context(|| format!("failed to read input file {input}"))
    }
}

fn decode_image(bytes: &[u8], config: &Config, benchmark: &mut Benchmark) -> anyhow::Result<RgbaImage> {
    let img = image::load_from_memory(bytes)
        .context("unsupported input format")?
        .to_rgba8();
    benchmark.step("decode image");

    let img = match config.processing.resize.as_deref() {
        Some(spec) => {
            let (width, height) = parse_resize(spec)?;
            let resized = if width == 0 && height == 0 {
                boardshapes::resize(&img)?
            } else {
                boardshapes::resize_to(&img, width, height)?
            };
            benchmark.step("resize");
            resized
        }
        None => img,
    };
    Ok(img)
}

/// Parse a `[width]x[height]` resize spec; empty dimensions mean
/// "unconstrained".
fn parse_resize(spec: &str) -> anyhow::Result<(i64, i64)> {
    if spec.is_empty() {
        return Ok((0, 0));
    }
    let Some((width, height)) = spec.split_once('x') else {
        bail!("invalid resize format: use [width]x[height], e.g. 800x600, 800x, x600");
    };
    let width: i64 = if width.is_empty() {
        0
    } else {
        width.parse().context("invalid width value")?
    };
    let height: i64 = if height.is_empty() {
        0
    } else {
        height.parse().context("invalid height value")?
    };
    if width < 0 || height < 0 {
        bail!("resize dimensions cannot be negative");
    }
    Ok((width, height))
}

fn serialize_data(
    data: &boardshapes::BoardshapesData,
    config: &Config,
) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    if config.output.binary {
        binary_serialize(
            &mut bytes,
            data,
            SerializationOptions {
                use_masks: config.processing.use_masks,
            },
        )?;
    } else {
        json_serialize(&mut bytes, data)?;
    }
    Ok(bytes)
}

/// Encode the simplified-image preview as PNG or JPEG, chosen by the
/// output path's extension.
fn encode_preview(img: &RgbaImage, path: PathBuf) -> anyhow::Result<Vec<u8>> {
    let format = match path.extension().and_then(|ext| ext.to_str()) {
        Some("jpeg") | Some("jpg") => image::ImageFormat::Jpeg,
        Some("png") | None => image::ImageFormat::Png,
        Some(ext) => bail!("unsupported output image format: .{ext}"),
    };
    let mut bytes = Vec::new();
    let img = match format {
        // JPEG has no alpha channel
        image::ImageFormat::Jpeg => image::DynamicImage::ImageRgb8(
            image::DynamicImage::ImageRgba8(img.clone()).to_rgb8(),
        ),
        _ => image::DynamicImage::ImageRgba8(img.clone()),
    };
    img.write_to(&mut std::io::Cursor::new(&mut bytes), format)?;
    Ok(bytes)
}

fn output_path(config: &Config, mode: Mode) -> PathBuf {
    match &config.output.path {
        Some(path) => path.clone(),
        None => PathBuf::from(match mode {
            Mode::Generate | Mode::Reserialize => {
                if config.output.binary {
                    "output.bshapes"
                } else {
                    "output.jshapes"
                }
            }
            Mode::Simplify => "output.png",
        }),
    }
}

fn write_output(bytes: &[u8], config: &Config, mode: Mode) -> anyhow::Result<()> {
    if config.output.stdout {
        std::io::stdout()
            .write_all(bytes)
            .context("failed to write to stdout")?;
        return Ok(());
    }

    let path = output_path(config, mode);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory {}", parent.display()))?;
        }
    }
    let mut file = File::create(&path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    file.write_all(bytes)?;
    if config.processing.verbose {
        eprintln!("wrote {} bytes to {}", bytes.len(), path.display());
    }
    Ok(())
}
