//! # ELF Header Parsing

use bitfield_struct::bitfield;

const EI_MAGIC_BYTES: [u8; 4] = [0x7F, b'E', b'L', b'F'];
const ELFCLASS32: u8 = 1;
const ELFDATA2LSB: u8 = 1;
const EV_CURRENT: u8 = 1;
const ET_EXEC: u16 = 2;
const EM_386: u16 = 3;
const PT_LOAD: u32 = 1;

const EHDR_SIZE: usize = 52;
const PHDR_SIZE: usize = 32;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElfParseError {
    #[error("the image is smaller than an ELF header")]
    Truncated,
    #[error("missing ELF magic")]
    NotElf,
    #[error("not a little-endian ELF32 executable")]
    UnsupportedFormat,
    #[error("machine type {0} is not i386")]
    UnsupportedMachine(u16),
    #[error("program header table lies outside of the image")]
    ProgramHeaders,
}

/// `Elf32_Phdr.p_flags`.
#[bitfield(u32)]
pub struct PFlags {
    pub execute: bool,
    pub write: bool,
    pub read: bool,
    #[bits(29)]
    __: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct LoadSegment {
    pub paddr: u32,
    pub offset: u32,
    pub filesz: u32,
    pub memsz: u32,
    pub flags: PFlags,
}

/// A validated ELF32 image.
#[derive(Debug, Clone, Copy)]
pub struct ElfImage<'a> {
    bytes: &'a [u8],
    pub entry: u32,
    phoff: usize,
    phnum: usize,
}

impl<'a> ElfImage<'a> {
    /// Validate the file and program headers of `bytes`.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ElfParseError> {
        if bytes.len() < EHDR_SIZE {
            return Err(ElfParseError::Truncated);
        }
        if bytes[0..4] != EI_MAGIC_BYTES {
            return Err(ElfParseError::NotElf);
        }
        if bytes[4] != ELFCLASS32 || bytes[5] != ELFDATA2LSB || bytes[6] != EV_CURRENT {
            return Err(ElfParseError::UnsupportedFormat);
        }
        if u16_at(bytes, 16) != ET_EXEC {
            return Err(ElfParseError::UnsupportedFormat);
        }
        let machine = u16_at(bytes, 18);
        if machine != EM_386 {
            return Err(ElfParseError::UnsupportedMachine(machine));
        }
        if usize::from(u16_at(bytes, 42)) != PHDR_SIZE {
            return Err(ElfParseError::ProgramHeaders);
        }

        let phoff = usize::try_from(u32_at(bytes, 28)).map_err(|_| ElfParseError::ProgramHeaders)?;
        let phnum = usize::from(u16_at(bytes, 44));
        let end = phnum
            .checked_mul(PHDR_SIZE)
            .and_then(|size| size.checked_add(phoff))
            .ok_or(ElfParseError::ProgramHeaders)?;
        if end > bytes.len() {
            return Err(ElfParseError::ProgramHeaders);
        }

        Ok(Self {
            bytes,
            entry: u32_at(bytes, 24),
            phoff,
            phnum,
        })
    }

    pub const fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// The `PT_LOAD` segments, in file order.
    pub fn segments(&self) -> impl Iterator<Item = LoadSegment> + use<'a> {
        let table = &self.bytes[self.phoff..self.phoff + self.phnum * PHDR_SIZE];
        table
            .chunks_exact(PHDR_SIZE)
            .filter(|ph| u32_at(ph, 0) == PT_LOAD)
            .map(|ph| LoadSegment {
                offset: u32_at(ph, 4),
                paddr: u32_at(ph, 12),
                filesz: u32_at(ph, 16),
                memsz: u32_at(ph, 20),
                flags: PFlags::from_bits(u32_at(ph, 24)),
            })
    }
}

fn u16_at(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
