//! # Boot-Time Video Mode Selection
//!
//! Ranks the display modes offered by the adapter and picks the one the boot
//! stage switches to before handing the framebuffer to the kernel.
//!
//! ## Policy
//!
//! * A mode is **usable** if both dimensions meet [`SelectorConfig`]'s minimum.
//! * A mode is **optimal** if it is usable and its width is divisible by 8,
//!   which the kernel's framebuffer console needs for its fast scanline copy.
//! * Only optimal modes (plus an optional legacy text mode, always entry 0)
//!   are listed, up to the table's soft capacity.
//! * The largest usable mode is always offered, even if it is not optimal; it
//!   occupies a slot reserved for it.
//!
//! The default is chosen in this order:
//!
//! ```text
//! preferred resolution (optimal)
//!     ↓ none
//! fewest pixels (listed)
//!     ↓ none
//! most pixels (usable, appended as fallback)
//!     ↓ none
//! first table entry that is not the text mode
//! ```
//!
//! ## Backends
//!
//! The selector only sees [`ModeInfoProvider`] and [`Console`]; the UEFI loader
//! implements them on top of GOP and the firmware text console.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

mod mode;
mod prompt;
mod select;
mod table;

pub use mode::{ModeInfo, ModeInfoProvider, SelectorConfig, VideoMode};
pub use prompt::{Console, PROMPT_LINE_CAPACITY, prompt_video_mode};
pub use select::{Candidates, SelectError, select_video_mode};
pub use table::RankedModes;
