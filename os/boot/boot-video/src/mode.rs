//! # Video Modes and Mode Information

use core::fmt;

/// Opaque handle of one display configuration offered by the adapter.
///
/// For GOP this is the mode number passed to `QueryMode`/`SetMode`; other
/// backends are free to use their own numbering.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct VideoMode(u32);

impl VideoMode {
    /// Sentinel for "no mode".
    pub const INVALID: Self = Self(u32::MAX);

    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl fmt::Display for VideoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{:#x}", self.0)
        } else {
            f.write_str("<invalid>")
        }
    }
}

/// Geometry of a mode as reported by a [`ModeInfoProvider`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModeInfo {
    /// Horizontal resolution in pixels.
    pub width: u32,
    /// Vertical resolution in pixels.
    pub height: u32,
    /// Color depth in bits per pixel.
    pub bpp: u32,
    /// Whether the adapter can drive this mode in a way the boot stage supports,
    /// e.g. with a linear framebuffer of a known pixel layout.
    pub supported: bool,
}

impl ModeInfo {
    #[must_use]
    pub const fn new(width: u32, height: u32, bpp: u32) -> Self {
        Self {
            width,
            height,
            bpp,
            supported: true,
        }
    }

    #[must_use]
    pub const fn unsupported(self) -> Self {
        Self {
            supported: false,
            ..self
        }
    }

    /// Total number of pixels on screen.
    #[must_use]
    pub const fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// A mode is usable if both dimensions meet the configured minimum.
    #[must_use]
    pub const fn is_usable(&self, config: &SelectorConfig) -> bool {
        self.width >= config.min_width && self.height >= config.min_height
    }

    /// A mode is optimal if it is usable and its width is a multiple of 8.
    ///
    /// The kernel's framebuffer console copies whole scanlines with a
    /// fixed-width (256-bit) routine and falls back to a slow path otherwise.
    #[must_use]
    pub const fn is_optimal(&self, config: &SelectorConfig) -> bool {
        self.is_usable(config) && self.width.is_multiple_of(8)
    }

    #[must_use]
    pub const fn has_resolution(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}

/// Fixed policy used to rank modes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Candidates with a different color depth are skipped.
    pub bpp: u32,
    pub min_width: u32,
    pub min_height: u32,
    /// An optimal mode of exactly this resolution becomes the default.
    pub preferred_width: u32,
    pub preferred_height: u32,
}

impl SelectorConfig {
    pub const DEFAULT: Self = Self {
        bpp: 32,
        min_width: 800,
        min_height: 600,
        preferred_width: 1920,
        preferred_height: 1080,
    };
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Reports the geometry of a display mode.
///
/// Implemented once per display backend (GOP, legacy VBE, ...). The selector
/// never caches the result; every call must describe the mode afresh.
pub trait ModeInfoProvider {
    type Error: fmt::Debug;

    /// Query the geometry of `mode`.
    ///
    /// # Errors
    /// Backend specific; the selector skips candidates whose query fails.
    fn mode_info(&mut self, mode: VideoMode) -> Result<ModeInfo, Self::Error>;
}

impl<P> ModeInfoProvider for &mut P
where
    P: ModeInfoProvider + ?Sized,
{
    type Error = P::Error;

    fn mode_info(&mut self, mode: VideoMode) -> Result<ModeInfo, Self::Error> {
        (**self).mode_info(mode)
    }
}
