//! Container-level access to PE files through the goblin library
//!
//! goblin decodes the headers and the section table; this module only materializes each section's
//! raw bytes and answers which section covers a given virtual address.

use crate::common::LookupError;
use goblin::pe::header::{CoffHeader, Header};
use goblin::pe::optional_header::OptionalHeader;

// "PE\0\0"
const SIZEOF_PE_SIGNATURE: usize = 4;
const SIZEOF_COFF_HEADER: usize = 20;

/// The decoded file header, and where the section table starts
#[derive(Debug, Clone)]
pub struct ImageHeader {
    pub coff_header: CoffHeader,
    pub optional_header: Option<OptionalHeader>,
    section_table_offset: usize,
}

/// A section of the image, with its raw contents copied out of the file
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    /// Absolute virtual address (image base included)
    pub base: u64,
    pub virtual_size: u64,
    pub data: Vec<u8>,
}

impl Section {
    fn span(&self) -> u64 {
        if self.virtual_size != 0 {
            self.virtual_size
        } else {
            self.data.len() as u64
        }
    }

    pub fn covers(&self, va: u64) -> bool {
        va >= self.base && va - self.base < self.span()
    }
}

/// Decode the DOS, COFF and optional headers
pub fn parse_header(bytes: &[u8]) -> Result<ImageHeader, LookupError> {
    let header = Header::parse(bytes).map_err(|e| match e {
        // only the optional header is checked against a magic number here
        goblin::error::Error::BadMagic(magic) => LookupError::UnrecognizedImage(magic as u16),
        e => LookupError::from(e),
    })?;
    let section_table_offset = header.dos_header.pe_pointer as usize
        + SIZEOF_PE_SIGNATURE
        + SIZEOF_COFF_HEADER
        + header.coff_header.size_of_optional_header as usize;
    Ok(ImageHeader {
        coff_header: header.coff_header,
        optional_header: header.optional_header,
        section_table_offset,
    })
}

/// Decode the section table and copy out the raw data of every section
///
/// `image_base` is added to each section's RVA, so that lookups work on absolute addresses.
pub fn parse_sections(
    bytes: &[u8],
    header: &ImageHeader,
    image_base: u64,
) -> Result<Vec<Section>, LookupError> {
    let mut offset = header.section_table_offset;
    let tables = header.coff_header.sections(bytes, &mut offset)?;

    tables
        .iter()
        .map(|table| {
            let name = String::from_utf8_lossy(&table.name)
                .trim_end_matches('\0')
                .to_owned();
            let start = table.pointer_to_raw_data as usize;
            let end = start
                .checked_add(table.size_of_raw_data as usize)
                .ok_or_else(|| LookupError::TruncatedSection { name: name.clone() })?;
            let data = if table.size_of_raw_data == 0 {
                Vec::new()
            } else {
                bytes
                    .get(start..end)
                    .ok_or_else(|| LookupError::TruncatedSection { name: name.clone() })?
                    .to_vec()
            };
            Ok(Section {
                name,
                base: image_base.saturating_add(table.virtual_address as u64),
                virtual_size: table.virtual_size as u64,
                data,
            })
        })
        .collect()
}

pub fn find_section_for_address(sections: &[Section], va: u64) -> Option<&Section> {
    sections.iter().find(|s| s.covers(va))
}
