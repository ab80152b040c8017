//! Loaded PE module image
//!
//! A read-only, bounds-checked view over a module mapped into the process.
//! Only the pieces needed for signature scanning are parsed: the DOS/NT
//! headers, `SizeOfImage`, and the section table to find `.text`.

use std::ops::Range;

use super::LocateError;

const DOS_MAGIC: &[u8; 2] = b"MZ";
const NT_SIGNATURE: &[u8; 4] = b"PE\0\0";
const E_LFANEW_OFFSET: usize = 0x3C;
const FILE_HEADER_SIZE: usize = 20;
const SECTION_HEADER_SIZE: usize = 40;
const SIZE_OF_IMAGE_OFFSET: usize = 56;
const TEXT_SECTION: &[u8; 8] = b".text\0\0\0";

/// A mapped module: its load address and every byte up to `SizeOfImage`.
#[derive(Debug, Clone)]
pub struct ModuleImage<'a> {
    base: usize,
    bytes: &'a [u8],
    /// `.text` as offsets into `bytes`
    text: Range<usize>,
}

impl<'a> ModuleImage<'a> {
    /// Parse the headers of an image mapped at `base`.
    pub fn parse(base: usize, bytes: &'a [u8]) -> Result<Self, LocateError> {
        let text = find_text_section(bytes)?;
        Ok(Self { base, bytes, text })
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Bytes of the `.text` section.
    pub fn text(&self) -> &'a [u8] {
        &self.bytes[self.text.clone()]
    }

    /// Absolute address of the first byte of `.text`.
    pub fn text_base(&self) -> usize {
        self.base + self.text.start
    }

    pub fn read_bytes(&self, address: usize, len: usize) -> Result<&'a [u8], LocateError> {
        address
            .checked_sub(self.base)
            .and_then(|offset| self.bytes.get(offset..offset.checked_add(len)?))
            .ok_or(LocateError::OutOfBounds { address, len })
    }

    pub fn read_i32(&self, address: usize) -> Result<i32, LocateError> {
        let raw = self.read_bytes(address, 4)?;
        Ok(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    pub fn read_ptr(&self, address: usize) -> Result<usize, LocateError> {
        const WIDTH: usize = size_of::<usize>();
        let raw = self.read_bytes(address, WIDTH)?;
        let mut buf = [0u8; WIDTH];
        buf.copy_from_slice(raw);
        Ok(usize::from_le_bytes(buf))
    }
}

#[cfg(target_os = "windows")]
impl ModuleImage<'static> {
    /// The host executable this plugin has been loaded into.
    pub fn current_process() -> Result<Self, LocateError> {
        use windows::Win32::System::LibraryLoader::GetModuleHandleW;
        use windows::core::PCWSTR;

        let module =
            unsafe { GetModuleHandleW(PCWSTR::null()) }.map_err(LocateError::ModuleHandle)?;
        let base = module.0 as usize;
        if base == 0 {
            return Err(LocateError::InvalidImage {
                reason: "null module handle",
            });
        }

        // SAFETY: the main module's headers occupy at least its first page,
        // which stays mapped for the lifetime of the process.
        let headers = unsafe { std::slice::from_raw_parts(base as *const u8, 0x1000) };
        let size = size_of_image(headers)?;

        // SAFETY: the loader maps the whole image, `SizeOfImage` bytes from
        // `base`, until the process exits.
        let bytes = unsafe { std::slice::from_raw_parts(base as *const u8, size) };
        Self::parse(base, bytes)
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    let raw = bytes.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([raw[0], raw[1]]))
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Offset of the NT headers (`PE\0\0`).
fn nt_headers(bytes: &[u8]) -> Result<usize, LocateError> {
    if bytes.get(..2) != Some(DOS_MAGIC.as_slice()) {
        return Err(LocateError::InvalidImage {
            reason: "missing MZ header",
        });
    }
    let nt = read_u32(bytes, E_LFANEW_OFFSET).ok_or(LocateError::InvalidImage {
        reason: "truncated DOS header",
    })? as usize;
    if bytes.get(nt..nt + 4) != Some(NT_SIGNATURE.as_slice()) {
        return Err(LocateError::InvalidImage {
            reason: "missing PE signature",
        });
    }
    Ok(nt)
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn size_of_image(bytes: &[u8]) -> Result<usize, LocateError> {
    let optional = nt_headers(bytes)? + 4 + FILE_HEADER_SIZE;
    read_u32(bytes, optional + SIZE_OF_IMAGE_OFFSET)
        .map(|size| size as usize)
        .ok_or(LocateError::InvalidImage {
            reason: "truncated optional header",
        })
}

fn find_text_section(bytes: &[u8]) -> Result<Range<usize>, LocateError> {
    let file_header = nt_headers(bytes)? + 4;
    let truncated = LocateError::InvalidImage {
        reason: "truncated file header",
    };
    let sections = read_u16(bytes, file_header + 2).ok_or(truncated)? as usize;
    let optional_size = read_u16(bytes, file_header + 16).ok_or(LocateError::InvalidImage {
        reason: "truncated file header",
    })? as usize;
    let table = file_header + FILE_HEADER_SIZE + optional_size;

    for index in 0..sections {
        let header = table + index * SECTION_HEADER_SIZE;
        let Some(name) = bytes.get(header..header + 8) else {
            break;
        };
        if name != TEXT_SECTION.as_slice() {
            continue;
        }

        let (Some(virtual_size), Some(virtual_address)) =
            (read_u32(bytes, header + 8), read_u32(bytes, header + 12))
        else {
            break;
        };
        let start = virtual_address as usize;
        let end = start + virtual_size as usize;
        if end > bytes.len() || start >= end {
            return Err(LocateError::InvalidImage {
                reason: ".text lies outside the image",
            });
        }
        return Ok(start..end);
    }

    Err(LocateError::InvalidImage {
        reason: "no .text section",
    })
}
