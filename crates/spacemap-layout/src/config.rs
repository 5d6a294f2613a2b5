//! Layout tunables.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Presentation tunables for the treemap.
///
/// Lengths are in logical pixels and are multiplied by `scale` before use;
/// `min_area` is multiplied by `scale²`.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct LayoutConfig {
    /// Inner padding on every side of a folder.
    #[builder(default = "5.0")]
    #[serde(default = "default_padding")]
    pub padding: f64,

    /// Height of the title strip reserved at the top of a folder.
    #[builder(default = "10.0")]
    #[serde(default = "default_label_height")]
    pub label_height: f64,

    /// Boxes whose rounded width or height falls below this are not emitted.
    #[builder(default = "4.0")]
    #[serde(default = "default_min_side")]
    pub min_side: f64,

    /// Device pixel ratio.
    #[builder(default = "1.0")]
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Children kept per folder before the rest is folded into "[Other]"
    /// (0 = unlimited).
    #[builder(default = "0")]
    #[serde(default)]
    pub max_children: usize,

    /// Children whose projected area is below this many square pixels are
    /// folded into "[Other]".
    #[builder(default = "16.0")]
    #[serde(default = "default_min_area")]
    pub min_area: f64,
}

fn default_padding() -> f64 {
    5.0
}

fn default_label_height() -> f64 {
    10.0
}

fn default_min_side() -> f64 {
    4.0
}

fn default_scale() -> f64 {
    1.0
}

fn default_min_area() -> f64 {
    16.0
}

impl LayoutConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        check(
            [
                ("padding", self.padding),
                ("label_height", self.label_height),
                ("min_side", self.min_side),
                ("min_area", self.min_area),
            ],
            self.scale,
        )
    }
}

/// Lengths must be finite and non-negative, the scale strictly positive.
/// Unset builder fields are skipped.
fn check(lengths: [(&str, Option<f64>); 4], scale: Option<f64>) -> Result<(), String> {
    for (name, value) in lengths {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a non-negative number"));
            }
        }
    }
    if let Some(scale) = scale {
        if !scale.is_finite() || scale <= 0.0 {
            return Err("scale must be positive".to_string());
        }
    }
    Ok(())
}

impl LayoutConfig {
    /// Create a new layout config builder.
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::default()
    }

    /// Apply the builder's checks to a config that did not come from the
    /// builder, such as one read from a settings file.
    pub fn validate(&self) -> Result<(), String> {
        check(
            [
                ("padding", Some(self.padding)),
                ("label_height", Some(self.label_height)),
                ("min_side", Some(self.min_side)),
                ("min_area", Some(self.min_area)),
            ],
            Some(self.scale),
        )
    }

    /// Padding in device pixels.
    pub fn scaled_padding(&self) -> f64 {
        self.padding * self.scale
    }

    /// Label strip height in device pixels.
    pub fn scaled_label_height(&self) -> f64 {
        self.label_height * self.scale
    }

    /// Minimum visible side in device pixels.
    pub fn scaled_min_side(&self) -> f64 {
        self.min_side * self.scale
    }

    /// Folding threshold in square device pixels.
    pub fn scaled_min_area(&self) -> f64 {
        self.min_area * self.scale * self.scale
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            padding: default_padding(),
            label_height: default_label_height(),
            min_side: default_min_side(),
            scale: default_scale(),
            max_children: 0,
            min_area: default_min_area(),
        }
    }
}
