//! ACI color-index mapping.
//!
//! The source CAD format stores layer/entity color as a legacy integer
//! index. Only the classic indices in actual use by the backend's
//! generated documents are mapped; anything else falls back to a
//! neutral gray.

/// Display color, sRGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// CSS-style hex string ("#ff0000").
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Fallback for indices outside the classic table.
pub const ACI_FALLBACK: Rgb = Rgb(128, 128, 128);

/// Map an ACI index to a display color.
///
/// Index 7 is the foreground color (white on the dark canvas used for
/// previews); 0 (ByBlock) and 256 (ByLayer) have no color of their own
/// and map to the fallback.
pub fn aci_to_rgb(index: i64) -> Rgb {
    match index {
        1 => Rgb(255, 0, 0),
        2 => Rgb(255, 255, 0),
        3 => Rgb(0, 255, 0),
        4 => Rgb(0, 255, 255),
        5 => Rgb(0, 0, 255),
        6 => Rgb(255, 0, 255),
        7 => Rgb(255, 255, 255),
        8 => Rgb(128, 128, 128),
        9 => Rgb(192, 192, 192),
        _ => ACI_FALLBACK,
    }
}
