use crate::style::Theme;

/// How a location marker looks. Renderers map this onto their own element
/// model (a DOM node in the web host).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerVisual {
    pub fill: &'static str,
    pub border: &'static str,
    pub shadow: &'static str,
    /// Size of the clickable element.
    pub hit_size_px: u32,
    /// Size of the visible dot inside it.
    pub dot_size_px: u32,
    pub hover_scale: f32,
}

impl MarkerVisual {
    pub fn for_theme(theme: Theme) -> Self {
        let (fill, border, shadow) = match theme {
            Theme::Light => ("#ef4444", "#ffffff", "0 2px 4px rgba(0,0,0,0.3)"),
            Theme::Dark => ("#fbbf24", "#1f2937", "0 2px 8px rgba(0,0,0,0.6)"),
        };
        Self {
            fill,
            border,
            shadow,
            hit_size_px: 32,
            dot_size_px: 14,
            hover_scale: 1.5,
        }
    }
}
