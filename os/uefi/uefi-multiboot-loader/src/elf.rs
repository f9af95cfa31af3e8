//! # ELF32 Kernel Loading
//!
//! Multiboot kernels are 32-bit x86 ELF executables. Every `PT_LOAD` segment is
//! placed at its physical address (`p_paddr`) and its BSS tail zeroed.

pub mod loader;
pub mod parser;
