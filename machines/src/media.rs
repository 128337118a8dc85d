//! Media loading and validation for the emulated machines.
//!
//! Cartridge images and the boot ROM arrive as byte blobs, either from
//! disk or programmatically (for testing). Sizing rules are enforced here
//! so the machines can assume well-formed images.

use std::collections::HashMap;
use std::path::Path;

pub const BIOS_SIZE: usize = 0x2000;
pub const BANK_SIZE: usize = 0x4000;

/// Size of the 512-byte header some ROM dumpers prepend to images.
const COPIER_HEADER_SIZE: usize = 512;

// ---------------------------------------------------------------------------
// CRC-32 (private)
// ---------------------------------------------------------------------------

/// CRC-32 lookup table (reflected polynomial 0xEDB88320). Used only to
/// identify cartridge images in the log.
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    crc ^ 0xFFFF_FFFF
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading media.
#[derive(Debug)]
pub enum MediaError {
    /// Underlying I/O error (file not found, permission denied, etc.)
    Io(std::io::Error),

    /// A required media item was not provided.
    MissingMedia(&'static str),

    /// Cartridge image is empty or not a whole number of 16 KiB banks.
    BadCartridgeSize(usize),

    /// Boot ROM is not exactly 8 KiB.
    BadBiosSize(usize),

    /// A CP/M program image does not fit below the stub region at the top
    /// of memory.
    ProgramTooLarge(usize),
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::MissingMedia(name) => write!(f, "missing media item: {name}"),
            Self::BadCartridgeSize(size) => write!(
                f,
                "cartridge image is {size} bytes; expected a non-zero multiple of 16 KiB"
            ),
            Self::BadBiosSize(size) => {
                write!(f, "boot ROM is {size} bytes; expected exactly 8 KiB")
            }
            Self::ProgramTooLarge(size) => {
                write!(f, "CP/M program is {size} bytes and overruns memory")
            }
        }
    }
}

impl std::error::Error for MediaError {}

impl From<std::io::Error> for MediaError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Cartridge / Bios
// ---------------------------------------------------------------------------

/// A validated cartridge ROM image: a whole number of 16 KiB banks, with
/// any 512-byte copier header already stripped.
pub struct Cartridge {
    pub rom: Box<[u8]>,
}

impl Cartridge {
    pub fn from_bytes(mut data: Vec<u8>) -> Result<Self, MediaError> {
        if data.len() % BANK_SIZE == COPIER_HEADER_SIZE {
            log::debug!("stripping {COPIER_HEADER_SIZE}-byte copier header");
            data.drain(..COPIER_HEADER_SIZE);
        }
        if data.is_empty() || data.len() % BANK_SIZE != 0 {
            return Err(MediaError::BadCartridgeSize(data.len()));
        }
        log::info!(
            "cartridge: {} KiB ({} banks), CRC32 {:08X}",
            data.len() / 1024,
            data.len() / BANK_SIZE,
            crc32(&data)
        );
        Ok(Self {
            rom: data.into_boxed_slice(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, MediaError> {
        Self::from_bytes(std::fs::read(path)?)
    }
}

/// The 8 KiB boot ROM. Optional: a machine without one simply boots with
/// the BIOS dropped from the memory-enable overlay.
pub struct Bios {
    pub rom: Box<[u8]>,
}

impl Bios {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, MediaError> {
        if data.len() != BIOS_SIZE {
            return Err(MediaError::BadBiosSize(data.len()));
        }
        Ok(Self {
            rom: data.into_boxed_slice(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, MediaError> {
        Self::from_bytes(std::fs::read(path)?)
    }
}

// ---------------------------------------------------------------------------
// MediaSet
// ---------------------------------------------------------------------------

/// A collection of named media blobs handed to a machine factory
/// ("cartridge", "bios", "program").
pub struct MediaSet {
    items: HashMap<String, Vec<u8>>,
}

impl Default for MediaSet {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaSet {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, data: Vec<u8>) {
        self.items.insert(name.to_string(), data);
    }

    pub fn insert_file(&mut self, name: &str, path: &Path) -> Result<(), MediaError> {
        self.items.insert(name.to_string(), std::fs::read(path)?);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.items.get(name).map(|v| v.as_slice())
    }

    pub fn require(&self, name: &'static str) -> Result<&[u8], MediaError> {
        self.get(name).ok_or(MediaError::MissingMedia(name))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
