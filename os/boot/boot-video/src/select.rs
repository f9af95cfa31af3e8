//! # Mode Selection Policy

use crate::mode::{ModeInfo, ModeInfoProvider, SelectorConfig, VideoMode};
use crate::table::RankedModes;
use core::fmt::{self, Write};
use log::{debug, trace};

/// The candidate identifiers to consider.
#[derive(Copy, Clone, Debug)]
pub enum Candidates<'a> {
    /// Identifiers `0..count`, e.g. GOP mode numbers.
    Range(u32),
    /// An explicit list, e.g. a VBE mode list.
    List(&'a [VideoMode]),
}

impl Candidates<'_> {
    fn iter(self) -> impl Iterator<Item = VideoMode> {
        let (range, list) = match self {
            Self::Range(count) => (Some((0..count).map(VideoMode::new)), None),
            Self::List(list) => (None, Some(list.iter().copied())),
        };
        range
            .into_iter()
            .flatten()
            .chain(list.into_iter().flatten())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SelectError<E: fmt::Debug> {
    /// The maximum-resolution mode answered during enumeration but not on the re-query.
    #[error("querying the maximum resolution mode {mode} failed: {cause:?}")]
    MaxModeQuery { mode: VideoMode, cause: E },
}

/// Running extremum over usable modes.
#[derive(Copy, Clone)]
struct Extremum {
    mode: VideoMode,
    pixels: u64,
}

impl Extremum {
    const NONE: Self = Self {
        mode: VideoMode::INVALID,
        pixels: 0,
    };
}

/// Rank the candidate modes into `table` and pick its default.
///
/// When `listing` is given, one line per accepted mode is written to it as the
/// mode is accepted.
///
/// # Errors
/// Returns [`SelectError::MaxModeQuery`] if the maximum-resolution mode fails
/// its second query. Per-candidate query failures only skip that candidate.
pub fn select_video_mode<P, const N: usize>(
    provider: &mut P,
    candidates: Candidates<'_>,
    config: &SelectorConfig,
    text_mode: Option<VideoMode>,
    table: &mut RankedModes<N>,
    mut listing: Option<&mut dyn Write>,
) -> Result<(), SelectError<P::Error>>
where
    P: ModeInfoProvider + ?Sized,
{
    let mut min = Extremum::NONE;
    let mut max = Extremum::NONE;
    let mut default = VideoMode::INVALID;

    table.clear();

    if let Some(text_mode) = text_mode.filter(|m| m.is_valid()) {
        if let Some(out) = listing.as_deref_mut() {
            let _ = writeln!(out, "Mode [0]: text mode 80 x 25");
        }
        table.push_ranked(text_mode);
    }

    for mode in candidates.iter() {
        let info = match provider.mode_info(mode) {
            Ok(info) => info,
            Err(e) => {
                trace!("Skipping mode {mode}: query failed: {e:?}");
                continue;
            }
        };

        if !info.supported || info.bpp != config.bpp || !info.is_usable(config) {
            continue;
        }

        let pixels = info.pixels();
        if pixels > max.pixels {
            max = Extremum { mode, pixels };
        }

        if !info.is_optimal(config) {
            continue;
        }

        let index = table.len();
        if !table.push_ranked(mode) {
            trace!("Mode {mode} not listed, table is full");
            continue;
        }

        if !min.mode.is_valid() || pixels < min.pixels {
            min = Extremum { mode, pixels };
        }
        if info.has_resolution(config.preferred_width, config.preferred_height) {
            default = mode;
        }

        if let Some(out) = listing.as_deref_mut() {
            show_mode(out, index, &info, default == mode);
        }
    }

    if !default.is_valid() {
        default = min.mode;
    }

    if max.mode.is_valid() && !table.contains(max.mode) {
        let info = provider
            .mode_info(max.mode)
            .map_err(|cause| SelectError::MaxModeQuery {
                mode: max.mode,
                cause,
            })?;

        if let Some(out) = listing.as_deref_mut() {
            show_mode(out, table.len(), &info, false);
        }

        table.push_fallback(max.mode);

        if !default.is_valid() {
            default = max.mode;
        }
    }

    if !default.is_valid() {
        default = first_non_text_entry(table, text_mode);
    }

    table.set_default(default);
    debug!(
        "Ranked {} video modes, default {}",
        table.len(),
        table.default_mode()
    );
    Ok(())
}

fn first_non_text_entry<const N: usize>(
    table: &RankedModes<N>,
    text_mode: Option<VideoMode>,
) -> VideoMode {
    match table.as_slice() {
        [first, second, ..] if Some(*first) == text_mode => *second,
        [first, ..] => *first,
        [] => VideoMode::INVALID,
    }
}

fn show_mode(out: &mut dyn Write, index: usize, info: &ModeInfo, is_default: bool) {
    let _ = writeln!(
        out,
        "Mode [{index}]: {} x {} x {}{}",
        info.width,
        info.height,
        info.bpp,
        if is_default { " [DEFAULT]" } else { "" }
    );
}
