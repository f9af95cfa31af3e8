//! # Framebuffer Description

use crate::record::RgbFieldLayout;

/// Pixel encoding of the active graphics mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    /// Byte 0 red, byte 1 green, byte 2 blue.
    Rgb,
    /// Byte 0 blue, byte 1 green, byte 2 red.
    Bgr,
    /// Channel positions given by bit masks.
    Bitmask {
        red: u32,
        green: u32,
        blue: u32,
        reserved: u32,
    },
    /// No linear framebuffer; drawing only through block transfers.
    BltOnly,
}

impl PixelLayout {
    /// Channel positions and sizes, or `None` if the layout has no linear framebuffer
    /// or a color mask is empty.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn rgb_fields(self) -> Option<RgbFieldLayout> {
        match self {
            Self::Rgb => Some(RgbFieldLayout {
                red_field_position: 0,
                red_mask_size: 8,
                green_field_position: 8,
                green_mask_size: 8,
                blue_field_position: 16,
                blue_mask_size: 8,
            }),
            Self::Bgr => Some(RgbFieldLayout {
                red_field_position: 16,
                red_mask_size: 8,
                green_field_position: 8,
                green_mask_size: 8,
                blue_field_position: 0,
                blue_mask_size: 8,
            }),
            Self::Bitmask {
                red, green, blue, ..
            } => {
                if red == 0 || green == 0 || blue == 0 {
                    return None;
                }
                Some(RgbFieldLayout {
                    red_field_position: red.trailing_zeros() as u8,
                    red_mask_size: red.count_ones() as u8,
                    green_field_position: green.trailing_zeros() as u8,
                    green_mask_size: green.count_ones() as u8,
                    blue_field_position: blue.trailing_zeros() as u8,
                    blue_mask_size: blue.count_ones() as u8,
                })
            }
            Self::BltOnly => None,
        }
    }

    /// Bits per pixel in the linear framebuffer.
    ///
    /// A bitmask pixel is as wide as its highest set mask bit. `None` wherever
    /// [`PixelLayout::rgb_fields`] is `None`.
    #[must_use]
    pub const fn bits_per_pixel(self) -> Option<u32> {
        if self.rgb_fields().is_none() {
            return None;
        }
        match self {
            Self::Bitmask {
                red,
                green,
                blue,
                reserved,
            } => Some(u32::BITS - (red | green | blue | reserved).leading_zeros()),
            Self::Rgb | Self::Bgr | Self::BltOnly => Some(FramebufferMode::BPP as u32),
        }
    }
}

/// The graphics mode as it will be handed to the kernel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FramebufferMode {
    /// Physical base address of the linear framebuffer.
    pub address: u64,
    /// Pixels per scanline; may exceed `width`.
    pub stride: u32,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
}

impl FramebufferMode {
    /// Bits per pixel of every mode this loader publishes.
    pub const BPP: u8 = 32;

    /// Bytes per scanline.
    #[must_use]
    pub const fn pitch(&self) -> Option<u32> {
        self.stride.checked_mul(Self::BPP as u32 / 8)
    }
}
