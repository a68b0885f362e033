// OPTIONS - Driver Settings
//
// Loaded once when the driver starts. A JSON file named by VAVDP_CONFIG is
// read first, then individual environment overrides are applied on top.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_OUTPUT_SURFACES: usize = 3;
pub const MAX_OUTPUT_SURFACES: usize = 16;
pub const DEFAULT_VDPAU_LIBRARY: &str = "libvdpau.so.1";

pub const ENV_CONFIG: &str = "VAVDP_CONFIG";
pub const ENV_OUTPUT_SURFACES: &str = "VAVDP_OUTPUT_SURFACES";
pub const ENV_LIBVDPAU: &str = "VAVDP_LIBVDPAU";

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("Failed to read settings: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverOptions {
    /// Length of the per-context output surface ring used by PutSurface
    pub output_surfaces: usize,
    /// Library opened by the VDPAU backend
    pub vdpau_library: String,
    /// Slot limit of each object heap
    pub max_objects_per_heap: usize,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            output_surfaces: DEFAULT_OUTPUT_SURFACES,
            vdpau_library: DEFAULT_VDPAU_LIBRARY.to_string(),
            max_objects_per_heap: crate::heap::MAX_SLOTS,
        }
    }
}

impl DriverOptions {
    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        let options: Self = serde_json::from_str(json)?;
        Ok(options.normalized())
    }

    /// Settings file (if any) plus environment overrides. Never fails; bad
    /// input is logged and the defaults are kept.
    pub fn from_env() -> Self {
        let mut options = match std::env::var_os(ENV_CONFIG) {
            Some(path) => Self::load(Path::new(&path)).unwrap_or_else(|e| {
                tracing::warn!("Ignoring {}: {}", Path::new(&path).display(), e);
                Self::default()
            }),
            None => Self::default(),
        };

        if let Ok(value) = std::env::var(ENV_OUTPUT_SURFACES) {
            match value.trim().parse::<usize>() {
                Ok(n) => options.output_surfaces = n,
                Err(_) => tracing::warn!("Ignoring {}={:?}: not a number", ENV_OUTPUT_SURFACES, value),
            }
        }

        if let Ok(path) = std::env::var(ENV_LIBVDPAU) {
            if !path.is_empty() {
                options.vdpau_library = path;
            }
        }

        options.normalized()
    }

    /// Clamp every field into its supported range.
    pub fn normalized(mut self) -> Self {
        self.output_surfaces = self.output_surfaces.clamp(1, MAX_OUTPUT_SURFACES);
        self.max_objects_per_heap = self.max_objects_per_heap.clamp(1, crate::heap::MAX_SLOTS);
        self
    }
}
