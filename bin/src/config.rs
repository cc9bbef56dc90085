use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub(crate) enum Mode {
    /// Generate shapes from an image and output serialized shape data
    #[value(alias = "g")]
    Generate,
    /// Simplify an image's palette, previewing pixel classification
    #[value(alias = "s")]
    Simplify,
    /// Deserialize shape data and serialize it again, converting between
    /// formats or upgrading old data
    #[value(alias = "r")]
    Reserialize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Config {
    /// Processing parameters
    pub processing: ProcessingConfig,
    /// Output settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ProcessingConfig {
    /// Resize spec in [width]x[height] form; empty dimensions are
    /// unconstrained
    #[serde(default)]
    pub resize: Option<String>,
    /// RDP epsilon: 0 uses the default, negative disables RDP
    #[serde(default)]
    pub epsilon: f64,
    /// Merge touching regions regardless of color
    #[serde(default)]
    pub no_color_separation: bool,
    /// Treat white as a shape color and keep input transparency
    #[serde(default)]
    pub allow_white: bool,
    /// Paint shape images from the source pixels
    #[serde(default)]
    pub preserve_color: bool,
    /// Skip the small-region filter
    #[serde(default)]
    pub keep_small_regions: bool,
    /// Serialize shape footprints as RLE masks instead of PNGs
    #[serde(default = "default_use_masks")]
    pub use_masks: bool,
    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct OutputConfig {
    /// Output file path; a default is derived from the mode when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Serialize to the binary format instead of JSON
    #[serde(default)]
    pub binary: bool,
    /// Write to stdout instead of a file
    #[serde(default)]
    pub stdout: bool,
}

fn default_use_masks() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Config {
            processing: ProcessingConfig {
                resize: None,
                epsilon: 0.0,
                no_color_separation: false,
                allow_white: false,
                preserve_color: false,
                keep_small_regions: false,
                use_masks: true,
                verbose: false,
            },
            output: OutputConfig {
                path: None,
                binary: false,
                stdout: false,
            },
        }
    }
}
