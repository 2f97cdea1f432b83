//! Value types shared by the command line and the GUI.

use std::{fmt, path::Path};

/// Byte order of written TIFF files.
#[derive(Debug, clap::ValueEnum, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgEndianess {
    Big,
    #[default]
    Native,
}

#[derive(Debug, clap::ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Npy,
    Npz,
    #[value(alias = "tif")]
    Tiff,
}

impl SaveFormat {
    pub const ALL: [SaveFormat; 3] = [SaveFormat::Npy, SaveFormat::Npz, SaveFormat::Tiff];

    /// Parse a format tag, case-insensitively. `tif` is accepted for TIFF.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "npy" => Some(SaveFormat::Npy),
            "npz" => Some(SaveFormat::Npz),
            "tiff" | "tif" => Some(SaveFormat::Tiff),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_tag)
    }

    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Npy => "npy",
            SaveFormat::Npz => "npz",
            SaveFormat::Tiff => "tif",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            SaveFormat::Npy => &["npy"],
            SaveFormat::Npz => &["npz"],
            SaveFormat::Tiff => &["tif", "tiff"],
        }
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
