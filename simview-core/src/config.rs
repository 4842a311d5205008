//! Window configuration value object consumed at view construction.

use serde::{Deserialize, Serialize};

/// Configuration for the OS window owned by the view.
///
/// `width`/`height` are stored as floats because hosts commonly derive
/// them from scaled SVG dimensions; the view rounds up to whole pixels
/// when the actual window is created or resized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub width: f64,
    pub height: f64,
    pub title: String,
    pub resizable: bool,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
            title: "simview".to_string(),
            resizable: true,
            fullscreen: false,
        }
    }
}

impl WindowConfig {
    /// Window size rounded up to whole pixels.
    pub fn size_px(&self) -> (u32, u32) {
        (self.width.ceil() as u32, self.height.ceil() as u32)
    }

    /// Width-to-height ratio of the configured window.
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WindowConfig::default();
        assert_eq!(config.size_px(), (640, 480));
        assert!(config.resizable);
        assert!(!config.fullscreen);
    }

    #[test]
    fn test_size_px_rounds_up() {
        let config = WindowConfig {
            width: 640.2,
            height: 479.5,
            ..WindowConfig::default()
        };
        assert_eq!(config.size_px(), (641, 480));
    }

    #[test]
    fn test_serde_round_trip() {
        let config = WindowConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: WindowConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
