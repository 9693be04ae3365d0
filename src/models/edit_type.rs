use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kinds of edit the service knows how to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditType {
    Enhance,
    Restore,
    Retouch,
    Style,
    Background,
    Colorize,
}

impl EditType {
    pub const ALL: [EditType; 6] = [
        EditType::Enhance,
        EditType::Restore,
        EditType::Retouch,
        EditType::Style,
        EditType::Background,
        EditType::Colorize,
    ];

    /// Lowercase name used on the wire and in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            EditType::Enhance => "enhance",
            EditType::Restore => "restore",
            EditType::Retouch => "retouch",
            EditType::Style => "style",
            EditType::Background => "background",
            EditType::Colorize => "colorize",
        }
    }

    /// What the edit aims for, as listed per type at `/docs`
    pub fn prompt(&self) -> &'static str {
        match self {
            EditType::Enhance => {
                "Apply professional-grade image enhancement with advanced sharpening, noise reduction \
                 and detail amplification. Optimize contrast, brightness and color saturation while \
                 preserving natural skin tones and avoiding over-processing artifacts."
            }
            EditType::Restore => {
                "Restore the photo: remove noise, blur and compression artifacts, reconstruct missing \
                 detail and bring back the original image quality with photorealistic precision."
            }
            EditType::Retouch => {
                "Retouch the portrait: remove blemishes, smooth skin, brighten eyes and even out \
                 complexion while keeping a natural appearance."
            }
            EditType::Style => {
                "Transform the image into an oil painting with rich textures, visible brush strokes, \
                 canvas texture and a classical palette while keeping the subject recognizable."
            }
            EditType::Background => {
                "Separate the subject from the background with clean, anti-aliased edges, preserving \
                 fine detail such as hair, suitable for professional compositing."
            }
            EditType::Colorize => {
                "Enrich the colors of the image with vibrant, natural tones and slightly increased \
                 contrast."
            }
        }
    }
}

impl fmt::Display for EditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        EditType::ALL
            .into_iter()
            .find(|edit_type| edit_type.as_str() == normalized)
            .ok_or_else(|| s.to_string())
    }
}
