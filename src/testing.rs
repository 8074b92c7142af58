//! Synthetic PE images for the tests
//!
//! The images carry a single `.idata` section at RVA 0x1000 holding the DLL names followed by the
//! import directory table; nothing else (no code, no lookup tables) is emitted.

use std::path::{Path, PathBuf};

pub(crate) const IMAGE_BASE_32: u64 = 0x40_0000;
pub(crate) const IMAGE_BASE_64: u64 = 0x1_4000_0000;
pub(crate) const SECTION_RVA: u32 = 0x1000;

const PE_OFFSET: usize = 0x80;
const OPTIONAL_HEADER_OFFSET: usize = PE_OFFSET + 4 + 20;
const SECTION_FILE_OFFSET: usize = 0x400;
const SIZEOF_IMPORT_DIRECTORY_ENTRY: usize = 20;
// names landing here fall between the end of the raw data and the end of the virtual size
const VIRTUAL_PADDING: u32 = 0x100;

enum ImportEntry {
    Named(String),
    NamePastRawData,
}

pub(crate) struct ImageBuilder {
    is_64: bool,
    entries: Vec<ImportEntry>,
    terminated: bool,
    import_directory: Option<(u32, u32)>,
    magic: Option<u16>,
    raw_data_pointer: Option<u32>,
}

impl ImageBuilder {
    pub(crate) fn new64() -> Self {
        Self {
            is_64: true,
            entries: Vec::new(),
            terminated: true,
            import_directory: None,
            magic: None,
            raw_data_pointer: None,
        }
    }

    pub(crate) fn new32() -> Self {
        Self {
            is_64: false,
            ..Self::new64()
        }
    }

    pub(crate) fn import(mut self, name: &str) -> Self {
        self.entries.push(ImportEntry::Named(name.to_owned()));
        self
    }

    pub(crate) fn with_name_past_raw_data(mut self) -> Self {
        self.entries.push(ImportEntry::NamePastRawData);
        self
    }

    pub(crate) fn without_terminator(mut self) -> Self {
        self.terminated = false;
        self
    }

    /// Override the import data directory (RVA, size)
    pub(crate) fn import_directory(mut self, rva: u32, size: u32) -> Self {
        self.import_directory = Some((rva, size));
        self
    }

    /// Override the optional header magic
    pub(crate) fn magic(mut self, magic: u16) -> Self {
        self.magic = Some(magic);
        self
    }

    /// Override the section's PointerToRawData
    pub(crate) fn raw_data_at(mut self, offset: u32) -> Self {
        self.raw_data_pointer = Some(offset);
        self
    }

    pub(crate) fn write_to<P: AsRef<Path>>(&self, path: P) -> std::io::Result<PathBuf> {
        fs_err::write(path.as_ref(), self.build())?;
        Ok(path.as_ref().to_owned())
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let mut name_rvas = Vec::new();
        for e in &self.entries {
            if let ImportEntry::Named(name) = e {
                name_rvas.push(SECTION_RVA + section.len() as u32);
                section.extend_from_slice(name.as_bytes());
                section.push(0);
            }
        }
        while section.len() % 4 != 0 {
            section.push(0);
        }

        let table_offset = section.len();
        let table_entries = self.entries.len() + usize::from(self.terminated);
        let raw_len = table_offset + table_entries * SIZEOF_IMPORT_DIRECTORY_ENTRY;
        let has_dangling = self
            .entries
            .iter()
            .any(|e| matches!(e, ImportEntry::NamePastRawData));
        let virtual_size = raw_len as u32 + if has_dangling { VIRTUAL_PADDING } else { 0 };

        let mut name_rvas = name_rvas.into_iter();
        for e in &self.entries {
            let name_rva = match e {
                ImportEntry::Named(_) => name_rvas.next().unwrap_or_default(),
                ImportEntry::NamePastRawData => SECTION_RVA + raw_len as u32 + VIRTUAL_PADDING / 2,
            };
            for v in [SECTION_RVA, 0, 0, name_rva, SECTION_RVA] {
                section.extend_from_slice(&v.to_le_bytes());
            }
        }
        if self.terminated {
            section.extend_from_slice(&[0u8; SIZEOF_IMPORT_DIRECTORY_ENTRY]);
        }
        assert_eq!(section.len(), raw_len);

        let (import_rva, import_size) = self.import_directory.unwrap_or((
            SECTION_RVA + table_offset as u32,
            (table_entries * SIZEOF_IMPORT_DIRECTORY_ENTRY) as u32,
        ));

        let mut bytes = vec![0u8; SECTION_FILE_OFFSET];
        bytes[0..2].copy_from_slice(b"MZ");
        put_u32(&mut bytes, 0x3c, PE_OFFSET as u32);
        bytes[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");

        let size_of_optional_header: u16 = if self.is_64 { 240 } else { 224 };
        let coff = PE_OFFSET + 4;
        put_u16(&mut bytes, coff, if self.is_64 { 0x8664 } else { 0x14c });
        put_u16(&mut bytes, coff + 2, 1);
        put_u16(&mut bytes, coff + 16, size_of_optional_header);
        put_u16(&mut bytes, coff + 18, if self.is_64 { 0x2022 } else { 0x2102 });

        let opt = OPTIONAL_HEADER_OFFSET;
        let data_directories = if self.is_64 {
            put_u16(&mut bytes, opt, 0x20b);
            put_u64(&mut bytes, opt + 24, IMAGE_BASE_64);
            put_u32(&mut bytes, opt + 108, 16);
            opt + 112
        } else {
            put_u16(&mut bytes, opt, 0x10b);
            put_u32(&mut bytes, opt + 28, IMAGE_BASE_32 as u32);
            put_u32(&mut bytes, opt + 92, 16);
            opt + 96
        };
        put_u32(&mut bytes, opt + 32, 0x1000);
        put_u32(&mut bytes, opt + 36, 0x200);
        put_u16(&mut bytes, opt + 40, 6);
        put_u16(&mut bytes, opt + 48, 6);
        put_u32(&mut bytes, opt + 56, SECTION_RVA + 0x1000 + virtual_size);
        put_u32(&mut bytes, opt + 60, SECTION_FILE_OFFSET as u32);
        put_u16(&mut bytes, opt + 68, 3);
        if let Some(magic) = self.magic {
            put_u16(&mut bytes, opt, magic);
        }
        put_u32(&mut bytes, data_directories + 8, import_rva);
        put_u32(&mut bytes, data_directories + 12, import_size);

        let table = opt + size_of_optional_header as usize;
        bytes[table..table + 6].copy_from_slice(b".idata");
        put_u32(&mut bytes, table + 8, virtual_size);
        put_u32(&mut bytes, table + 12, SECTION_RVA);
        put_u32(&mut bytes, table + 16, raw_len as u32);
        put_u32(
            &mut bytes,
            table + 20,
            self.raw_data_pointer.unwrap_or(SECTION_FILE_OFFSET as u32),
        );
        put_u32(&mut bytes, table + 36, 0xc000_0040);

        bytes.extend_from_slice(&section);
        bytes
    }
}

fn put_u16(bytes: &mut [u8], offset: usize, v: u16) {
    bytes[offset..offset + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(bytes: &mut [u8], offset: usize, v: u32) {
    bytes[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
}

fn put_u64(bytes: &mut [u8], offset: usize, v: u64) {
    bytes[offset..offset + 8].copy_from_slice(&v.to_le_bytes());
}
