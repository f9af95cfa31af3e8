//! # Ranked Mode Table

use crate::mode::VideoMode;

/// Fixed-capacity, discovery-ordered list of selectable modes plus the default.
///
/// Entries are inserted under a two-tier rule:
/// * regular entries fill at most `N - 1` slots ([`RankedModes::push_ranked`]);
/// * the last slot is reserved for the maximum-resolution fallback
///   ([`RankedModes::push_fallback`]), which therefore always fits.
#[derive(Clone, Debug)]
pub struct RankedModes<const N: usize> {
    modes: [VideoMode; N],
    len: usize,
    default: VideoMode,
}

impl<const N: usize> RankedModes<N> {
    #[must_use]
    pub const fn new() -> Self {
        const { assert!(N >= 2, "a ranked mode table needs at least two slots") };
        Self {
            modes: [VideoMode::INVALID; N],
            len: 0,
            default: VideoMode::INVALID,
        }
    }

    /// Number of slots available to regular entries.
    pub const SOFT_CAPACITY: usize = N - 1;

    pub(crate) const fn clear(&mut self) {
        self.len = 0;
        self.default = VideoMode::INVALID;
    }

    /// Append a regular entry. Returns `false` once the soft capacity is reached.
    pub(crate) const fn push_ranked(&mut self, mode: VideoMode) -> bool {
        if self.len >= Self::SOFT_CAPACITY {
            return false;
        }
        self.modes[self.len] = mode;
        self.len += 1;
        true
    }

    /// Append the guaranteed fallback entry into the reserved slot.
    ///
    /// Only one fallback is ever pushed per selection and regular entries never
    /// exceed `N - 1`, so there is always room.
    pub(crate) const fn push_fallback(&mut self, mode: VideoMode) {
        debug_assert!(self.len < N);
        self.modes[self.len] = mode;
        self.len += 1;
    }

    pub(crate) const fn set_default(&mut self, mode: VideoMode) {
        self.default = mode;
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn as_slice(&self) -> &[VideoMode] {
        &self.modes[..self.len]
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<VideoMode> {
        self.as_slice().get(index).copied()
    }

    #[must_use]
    pub fn contains(&self, mode: VideoMode) -> bool {
        self.as_slice().contains(&mode)
    }

    /// The mode picked when the operator does not choose one; may be [`VideoMode::INVALID`].
    #[must_use]
    pub const fn default_mode(&self) -> VideoMode {
        self.default
    }
}

impl<const N: usize> Default for RankedModes<N> {
    fn default() -> Self {
        Self::new()
    }
}
