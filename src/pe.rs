//! Import directory decoding, walking the raw section bytes handed out by the container parser

use crate::common::LookupError;
use crate::image::{self, Section};
use dataview::{DataView, Pod};
use fs_err as fs;
use goblin::pe::optional_header::{MAGIC_32, MAGIC_64};
use std::path::Path;

/// One entry of the import directory table, as laid out in the file (little-endian, unaligned)
#[derive(Pod, Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(C)]
struct ImportDirectoryEntry {
    import_lookup_table_rva: u32,
    time_date_stamp: u32,
    forwarder_chain: u32,
    name_rva: u32,
    import_address_table_rva: u32,
}

const SIZEOF_IMPORT_DIRECTORY_ENTRY: usize = std::mem::size_of::<ImportDirectoryEntry>();

impl ImportDirectoryEntry {
    fn read(data: &[u8], offset: usize) -> Result<Self, LookupError> {
        let raw = DataView::from(data)
            .try_read::<ImportDirectoryEntry>(offset)
            .ok_or(LookupError::TruncatedImportTable {
                offset,
                len: data.len(),
            })?;
        Ok(Self {
            import_lookup_table_rva: u32::from_le(raw.import_lookup_table_rva),
            time_date_stamp: u32::from_le(raw.time_date_stamp),
            forwarder_chain: u32::from_le(raw.forwarder_chain),
            name_rva: u32::from_le(raw.name_rva),
            import_address_table_rva: u32::from_le(raw.import_address_table_rva),
        })
    }

    // timestamp and forwarder chain are ignored, as the loader does
    fn is_terminator(&self) -> bool {
        self.import_lookup_table_rva == 0 && self.name_rva == 0 && self.import_address_table_rva == 0
    }
}

/// Names of the DLLs an image imports, in import table order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedModules {
    pub names: Vec<String>,
    pub is_64: bool,
}

/// Read the names of the DLLs this executable depends on
pub fn read_dependencies(bytes: &[u8]) -> Result<ImportedModules, LookupError> {
    let header = image::parse_header(bytes)?;

    let optional_header = header
        .optional_header
        .as_ref()
        .ok_or(LookupError::UnrecognizedImage(0))?;
    let is_64 = match optional_header.standard_fields.magic {
        MAGIC_32 => false,
        MAGIC_64 => true,
        magic => return Err(LookupError::UnrecognizedImage(magic)),
    };
    let image_base = optional_header.windows_fields.image_base;

    let (import_rva, import_size) = optional_header
        .data_directories
        .get_import_table()
        .as_ref()
        .map(|dir| (dir.virtual_address, dir.size))
        .unwrap_or((0, 0));
    let sections = image::parse_sections(bytes, &header, image_base)?;
    if import_size == 0 {
        return Ok(ImportedModules {
            names: Vec::new(),
            is_64,
        });
    }

    let (table_section, mut offset) = locate(&sections, image_base, import_rva)?;
    let mut names = Vec::new();
    loop {
        let entry = ImportDirectoryEntry::read(&table_section.data, offset)?;
        if entry.is_terminator() {
            break;
        }

        let (name_section, name_offset) = locate(&sections, image_base, entry.name_rva)?;
        if let Some(name) = read_name(&name_section.data, name_offset) {
            names.push(name);
        }

        offset += SIZEOF_IMPORT_DIRECTORY_ENTRY;
    }

    Ok(ImportedModules { names, is_64 })
}

pub fn read_dependencies_from_file<P: AsRef<Path>>(path: P) -> Result<ImportedModules, LookupError> {
    let content = fs::read(path.as_ref()).map_err(|source| LookupError::CouldNotOpenFile {
        path: path.as_ref().to_owned(),
        source,
    })?;
    read_dependencies(&content)
}

/// Section covering the given RVA, and the offset of the address within it
fn locate(sections: &[Section], image_base: u64, rva: u32) -> Result<(&Section, usize), LookupError> {
    let va = image_base
        .checked_add(rva as u64)
        .ok_or(LookupError::AddressResolution(rva as u64))?;
    let section =
        image::find_section_for_address(sections, va).ok_or(LookupError::AddressResolution(va))?;
    Ok((section, (va - section.base) as usize))
}

/// NUL-terminated string at `offset`, cut at the end of the section if unterminated
///
/// Offsets past the section's raw data (but inside its virtual size) yield nothing.
fn read_name(data: &[u8], offset: usize) -> Option<String> {
    if offset >= data.len() {
        return None;
    }
    let tail = &data[offset..];
    let len = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Some(String::from_utf8_lossy(&tail[..len]).into_owned())
}
