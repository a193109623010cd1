use trichrome_engine::color::{ClearColor, Rgb};
use trichrome_engine::triangle::{DEFAULT_CLEAR, DEFAULT_FILL};
use trichrome_engine::window::RuntimeConfig;
use winit::dpi::LogicalSize;

/// Demo settings: window and the colors the two actions cycle through.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub title: String,
    pub width: f64,
    pub height: f64,
    /// Background colors, starting with the one shown at startup.
    pub backgrounds: Vec<ClearColor>,
    /// Triangle colors, starting with the one shown at startup.
    pub fills: Vec<Rgb>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "Trichrome".to_string(),
            width: 800.0,
            height: 600.0,
            backgrounds: vec![
                DEFAULT_CLEAR,
                ClearColor::from_u8(24, 26, 32, 255),
                ClearColor::from_u8(236, 236, 228, 255),
                ClearColor::from_u8(44, 62, 120, 255),
                ClearColor::from_u8(120, 40, 52, 255),
            ],
            fills: vec![
                DEFAULT_FILL,
                Rgb::from_u8(230, 57, 70),
                Rgb::from_u8(69, 123, 157),
                Rgb::from_u8(255, 255, 255),
                Rgb::from_u8(29, 53, 87),
            ],
        }
    }
}

impl DemoConfig {
    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.title.clone(),
            initial_size: LogicalSize::new(self.width, self.height),
        }
    }
}
