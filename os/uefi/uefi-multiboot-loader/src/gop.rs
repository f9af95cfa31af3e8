//! # GOP Video Modes

use crate::config::{INTERACTIVE_MODE_SELECTION, MAX_LISTED_MODES, SHOW_MODES, VIDEO};
use crate::console::UefiConsole;
use boot_info::{FramebufferMode, PixelLayout};
use boot_video::{
    Candidates, ModeInfo, ModeInfoProvider, RankedModes, SelectError, VideoMode,
    prompt_video_mode, select_video_mode,
};
use core::fmt::Write;
use log::{info, warn};
use uefi::Status;
use uefi::boot::{self, ScopedProtocol};
use uefi::proto::console::gop::{self, GraphicsOutput, PixelFormat};

#[derive(Debug, thiserror::Error)]
pub enum GopError {
    #[error("failed to open the Graphics Output Protocol")]
    Protocol(#[source] uefi::Error),
    #[error(transparent)]
    Selection(#[from] SelectError<Status>),
    #[error("video mode {0} disappeared after selection")]
    ModeVanished(VideoMode),
    #[error("failed to set video mode {mode}")]
    SetMode {
        mode: VideoMode,
        #[source]
        source: uefi::Error,
    },
    #[error("the current video mode does not fit 32-bit geometry")]
    Geometry,
}

impl From<GopError> for Status {
    fn from(value: GopError) -> Self {
        match value {
            GopError::Protocol(e) | GopError::SetMode { source: e, .. } => e.status(),
            GopError::Selection(_) | GopError::ModeVanished(_) => Self::DEVICE_ERROR,
            GopError::Geometry => Self::UNSUPPORTED,
        }
    }
}

/// Open the Graphics Output Protocol exclusively.
pub fn open() -> Result<ScopedProtocol<GraphicsOutput>, GopError> {
    let handle = boot::get_handle_for_protocol::<GraphicsOutput>().map_err(GopError::Protocol)?;
    boot::open_protocol_exclusive::<GraphicsOutput>(handle).map_err(GopError::Protocol)
}

/// GOP mode numbers as seen by the selector.
///
/// Mode `n` is the `n`-th mode the firmware answers for; the same numbering is
/// used when the mode is set.
struct GopModes<'a> {
    gop: &'a GraphicsOutput,
}

impl GopModes<'_> {
    fn count(&self) -> u32 {
        u32::try_from(self.gop.modes().count()).unwrap_or(u32::MAX)
    }

    fn find(&self, mode: VideoMode) -> Option<gop::Mode> {
        self.gop.modes().nth(usize::try_from(mode.id()).ok()?)
    }
}

impl ModeInfoProvider for GopModes<'_> {
    type Error = Status;

    fn mode_info(&mut self, mode: VideoMode) -> Result<ModeInfo, Self::Error> {
        let found = self.find(mode).ok_or(Status::NOT_FOUND)?;
        describe(found.info()).ok_or(Status::UNSUPPORTED)
    }
}

fn describe(info: &gop::ModeInfo) -> Option<ModeInfo> {
    let (width, height) = info.resolution();
    let width = u32::try_from(width).ok()?;
    let height = u32::try_from(height).ok()?;

    // Modes without a linear framebuffer stay visible but are never selected.
    let mode = pixel_layout(info).bits_per_pixel().map_or_else(
        || ModeInfo::new(width, height, u32::from(FramebufferMode::BPP)).unsupported(),
        |bpp| ModeInfo::new(width, height, bpp),
    );
    Some(mode)
}

pub fn pixel_layout(info: &gop::ModeInfo) -> PixelLayout {
    match info.pixel_format() {
        PixelFormat::Rgb => PixelLayout::Rgb,
        PixelFormat::Bgr => PixelLayout::Bgr,
        PixelFormat::Bitmask => info
            .pixel_bitmask()
            .map_or(PixelLayout::BltOnly, |mask| PixelLayout::Bitmask {
                red: mask.red,
                green: mask.green,
                blue: mask.blue,
                reserved: mask.reserved,
            }),
        PixelFormat::BltOnly => PixelLayout::BltOnly,
    }
}

/// Rank the GOP modes and pick one, asking the operator if configured to.
///
/// Returns [`VideoMode::INVALID`] if no mode is usable.
pub fn choose_mode(gop: &GraphicsOutput, console: &mut UefiConsole) -> Result<VideoMode, GopError> {
    let mut modes = GopModes { gop };
    let count = modes.count();
    let mut table = RankedModes::<MAX_LISTED_MODES>::new();

    let listing = SHOW_MODES.then_some(&mut *console as &mut dyn Write);
    select_video_mode(
        &mut modes,
        Candidates::Range(count),
        &VIDEO,
        None,
        &mut table,
        listing,
    )?;
    info!(
        "{} of {count} GOP modes usable, default {}",
        table.len(),
        table.default_mode()
    );

    if INTERACTIVE_MODE_SELECTION {
        Ok(prompt_video_mode(console, &table))
    } else {
        Ok(table.default_mode())
    }
}

/// Switch to `mode` and describe the resulting framebuffer.
///
/// An invalid mode keeps the current one.
pub fn apply_mode(gop: &mut GraphicsOutput, mode: VideoMode) -> Result<FramebufferMode, GopError> {
    if mode.is_valid() {
        let found = GopModes { gop: &*gop }
            .find(mode)
            .ok_or(GopError::ModeVanished(mode))?;
        gop.set_mode(&found)
            .map_err(|source| GopError::SetMode { mode, source })?;
    } else {
        warn!("No usable video mode; keeping the current one");
    }

    let info = gop.current_mode_info();
    let (width, height) = info.resolution();
    let address = gop.frame_buffer().as_mut_ptr() as u64;

    Ok(FramebufferMode {
        address,
        stride: u32::try_from(info.stride()).map_err(|_| GopError::Geometry)?,
        width: u32::try_from(width).map_err(|_| GopError::Geometry)?,
        height: u32::try_from(height).map_err(|_| GopError::Geometry)?,
        layout: pixel_layout(&info),
    })
}
