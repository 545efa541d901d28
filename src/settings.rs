use std::path::PathBuf;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::intensity_filter::IntensityConfig;

lazy_static! {
    static ref SETTINGS_PATH: PathBuf = {
        std::env::current_exe().unwrap().parent().unwrap().join("settings.json")
    };
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Settings {
    /// Port the raw position updates arrive on.
    pub osc_in_port: u16,
    /// Wildcard pattern selecting the tracked OSC address.
    pub osc_path: String,
    /// Raw input range, normalized to [0,1] before ingest.
    pub osc_range_start: f32,
    pub osc_range_end: f32,
    /// Where the combined intensity goes.
    pub out_host: String,
    pub out_port: u16,
    pub out_address: String,
    /// Output ticks per second.
    pub output_rate: f64,
    pub smoothing_time: f64,
    pub nominal_update_rate: f64,
    pub position_weight: f32,
    pub velocity_multiplier: f32,
    pub contact_scale: f32,
    /// Milliseconds before a hanging nonzero input is forced off.
    pub stale_cutoff_ms: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            osc_in_port: 9001,
            osc_path: "/avatar/parameters/haptic/*".into(),
            osc_range_start: 0.0,
            osc_range_end: 1.0,
            out_host: "127.0.0.1".into(),
            out_port: 9101,
            out_address: "/haptic/intensity".into(),
            output_rate: 100.0,
            smoothing_time: 0.2,
            nominal_update_rate: 10.0,
            position_weight: 0.3,
            velocity_multiplier: 1.0,
            contact_scale: 1.0,
            stale_cutoff_ms: Some(200),
        }
    }
}

impl Settings {
    pub fn save(&self) -> anyhow::Result<()> {
        let settings = serde_json::to_string_pretty(&self)?;
        std::fs::write((*SETTINGS_PATH).clone(), settings)?;
        Ok(())
    }

    pub fn load_or_default() -> anyhow::Result<Self> {
        if !(*SETTINGS_PATH).exists() {
            return Ok(Self::default());
        }

        let settings = std::fs::read_to_string((*SETTINGS_PATH).clone())?;
        let settings: Settings = serde_json::from_str(&settings)?;
        Ok(settings)
    }

    /// The core tuning subset.
    pub fn intensity_config(&self) -> IntensityConfig {
        IntensityConfig {
            smoothing_time: self.smoothing_time,
            nominal_update_rate: self.nominal_update_rate,
            position_weight: self.position_weight,
            velocity_multiplier: self.velocity_multiplier,
            contact_scale: self.contact_scale,
            stale_cutoff: self.stale_cutoff_ms.map(|ms| ms as f64 / 1000.0),
        }
    }
}
