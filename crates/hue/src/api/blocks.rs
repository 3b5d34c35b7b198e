use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct On {
    pub on: bool,
}

impl On {
    #[must_use]
    pub const fn new(on: bool) -> Self {
        Self { on }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Dimming {
    pub brightness: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct XY {
    pub x: f64,
    pub y: f64,
}

impl XY {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The `color` block. Only the xy coordinate is used; gamut data is ignored.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ColorXy {
    pub xy: XY,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct MirekSchema {
    pub mirek_minimum: f64,
    pub mirek_maximum: f64,
}

/// The `color_temperature` block.
///
/// Lights in xy mode report `"mirek": null`, and event updates carry no
/// schema, so both parts are optional.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ColorTemperature {
    #[serde(default)]
    pub mirek: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirek_schema: Option<MirekSchema>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GradientPoint {
    pub color: ColorXy,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Gradient {
    #[serde(default)]
    pub points: Vec<GradientPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_capable: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub archetype: Option<String>,
}

/* Command bodies */

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct MirekUpdate {
    pub mirek: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GradientUpdate {
    pub points: Vec<GradientPoint>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct LightUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<On>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimming: Option<Dimming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorXy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temperature: Option<MirekUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient: Option<GradientUpdate>,
}

impl LightUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_on(self, on: bool) -> Self {
        Self {
            on: Some(On::new(on)),
            ..self
        }
    }

    #[must_use]
    pub fn with_brightness(self, brightness: f64) -> Self {
        Self {
            dimming: Some(Dimming { brightness }),
            ..self
        }
    }

    #[must_use]
    pub fn with_color_xy(self, xy: XY) -> Self {
        Self {
            color: Some(ColorXy { xy }),
            ..self
        }
    }

    #[must_use]
    pub fn with_mirek(self, mirek: u16) -> Self {
        Self {
            color_temperature: Some(MirekUpdate { mirek }),
            ..self
        }
    }

    #[must_use]
    pub fn with_gradient(self, points: impl IntoIterator<Item = XY>) -> Self {
        let points = points
            .into_iter()
            .map(|xy| GradientPoint {
                color: ColorXy { xy },
            })
            .collect();

        Self {
            gradient: Some(GradientUpdate { points }),
            ..self
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SceneRecall {
    pub action: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SceneUpdate {
    pub recall: SceneRecall,
}

impl SceneUpdate {
    #[must_use]
    pub fn activate() -> Self {
        Self {
            recall: SceneRecall {
                action: String::from("active"),
            },
        }
    }
}
