//! PE container access.
//!
//! A [`File`] owns the module bytes through a [`Backend`] (a memory-mapped file or an owned
//! buffer). The PE headers are parsed once with `goblin` at load time; only the CLR runtime
//! header directory and the section table are kept, which is all that is needed to find the
//! metadata.

use std::{fs, path::Path};

use goblin::pe::PE;
use memmap2::Mmap;

use crate::{
    Error::{Empty, OutOfBounds},
    Result,
};

/// Source of the raw module bytes.
pub trait Backend: Send + Sync {
    /// The whole module.
    fn data(&self) -> &[u8];

    /// Bounds-checked sub-slice `[offset, offset + len)`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the data.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let data = self.data();
        let Some(end) = offset.checked_add(len) else {
            return Err(OutOfBounds);
        };

        data.get(offset..end).ok_or(OutOfBounds)
    }

    /// Size in bytes.
    fn len(&self) -> usize {
        self.data().len()
    }
}

/// A module mapped from disk.
#[derive(Debug)]
pub struct Physical {
    data: Mmap,
}

impl Physical {
    /// Maps the file at `path` read-only.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path)?;
        // SAFETY: the mapping is read-only; modules are not expected to change while dumped
        let data = unsafe { Mmap::map(&file)? };

        Ok(Physical { data })
    }
}

impl Backend for Physical {
    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }
}

/// A module held in memory.
#[derive(Debug)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Wraps `data`.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Memory {
        Memory { data }
    }
}

impl Backend for Memory {
    fn data(&self) -> &[u8] {
        self.data.as_slice()
    }
}

/// Mapping of one PE section between virtual and file addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    /// RVA of the section start
    pub virtual_address: u32,
    /// Size of the section in memory
    pub virtual_size: u32,
    /// File offset of the section data
    pub pointer_to_raw_data: u32,
    /// Size of the section data on disk
    pub size_of_raw_data: u32,
}

/// A loaded PE image carrying CLR metadata.
pub struct File {
    data: Box<dyn Backend>,
    clr: (u32, u32),
    sections: Vec<Section>,
}

impl File {
    /// Loads and maps the module at `path`.
    ///
    /// # Errors
    /// Fails if the file cannot be read, is not a PE image, or has no CLR runtime header.
    pub fn from_file(path: &Path) -> Result<File> {
        Self::load(Physical::new(path)?)
    }

    /// Loads a module from an in-memory buffer.
    ///
    /// # Errors
    /// Fails if the data is not a PE image or has no CLR runtime header.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        Self::load(Memory::new(data))
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let (clr, sections) = {
            let pe = PE::parse(data.data())?;
            let Some(optional_header) = pe.header.optional_header else {
                return Err(malformed_error!("File does not have an OptionalHeader"));
            };
            let Some(clr_dir) = optional_header.data_directories.get_clr_runtime_header() else {
                return Err(malformed_error!(
                    "File does not have a CLR runtime header directory"
                ));
            };

            let sections = pe
                .sections
                .iter()
                .map(|section| Section {
                    virtual_address: section.virtual_address,
                    virtual_size: section.virtual_size,
                    pointer_to_raw_data: section.pointer_to_raw_data,
                    size_of_raw_data: section.size_of_raw_data,
                })
                .collect::<Vec<_>>();

            ((clr_dir.virtual_address, clr_dir.size), sections)
        };

        Ok(File {
            data: Box::new(data),
            clr,
            sections,
        })
    }

    /// RVA and size of the CLR runtime header.
    #[must_use]
    pub fn clr(&self) -> (usize, usize) {
        (self.clr.0 as usize, self.clr.1 as usize)
    }

    /// The whole image.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Bounds-checked sub-slice of the image.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the image.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }

    /// Converts an RVA into a file offset through the section table.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if no section contains `rva`.
    pub fn rva_to_offset(&self, rva: usize) -> Result<usize> {
        rva_to_offset(&self.sections, rva)
    }
}

pub(crate) fn rva_to_offset(sections: &[Section], rva: usize) -> Result<usize> {
    let rva_u32 =
        u32::try_from(rva).map_err(|_| malformed_error!("RVA too large to fit in u32: {}", rva))?;

    for section in sections {
        let size = section.virtual_size.max(section.size_of_raw_data);
        let Some(section_max) = section.virtual_address.checked_add(size) else {
            return Err(malformed_error!(
                "Section malformed, causing integer overflow - {} + {}",
                section.virtual_address,
                size
            ));
        };

        if section.virtual_address <= rva_u32 && rva_u32 < section_max {
            return Ok((rva - section.virtual_address as usize)
                + section.pointer_to_raw_data as usize);
        }
    }

    Err(malformed_error!(
        "RVA could not be converted to offset - {}",
        rva
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn sections() -> Vec<Section> {
        vec![
            Section {
                virtual_address: 0x2000,
                virtual_size: 0x1800,
                pointer_to_raw_data: 0x200,
                size_of_raw_data: 0x1800,
            },
            Section {
                virtual_address: 0x4000,
                virtual_size: 0x100,
                pointer_to_raw_data: 0x1A00,
                size_of_raw_data: 0x200,
            },
        ]
    }

    #[test]
    fn rva_mapping() {
        let sections = sections();
        // The first byte of a section maps too
        assert_eq!(rva_to_offset(&sections, 0x2000).unwrap(), 0x200);
        assert_eq!(rva_to_offset(&sections, 0x2008).unwrap(), 0x208);
        assert_eq!(rva_to_offset(&sections, 0x37FF).unwrap(), 0x19FF);
        assert_eq!(rva_to_offset(&sections, 0x41FF).unwrap(), 0x1BFF);

        assert!(rva_to_offset(&sections, 0x3800).is_err());
        assert!(rva_to_offset(&sections, 0x1000).is_err());
    }

    #[test]
    fn rejects_non_pe() {
        assert!(matches!(File::from_mem(Vec::new()), Err(Error::Empty)));
        assert!(File::from_mem(b"definitely not a portable executable".to_vec()).is_err());
    }

    #[test]
    fn memory_slices() {
        let memory = Memory::new(vec![0xAA, 0xBB, 0xCC]);
        assert_eq!(memory.data_slice(1, 2).unwrap(), &[0xBB, 0xCC]);
        assert!(memory.data_slice(2, 2).is_err());
        assert!(memory.data_slice(usize::MAX, 2).is_err());
        assert_eq!(memory.len(), 3);
    }

    #[test]
    fn physical_maps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        fs::write(&path, [1_u8, 2, 3, 4]).unwrap();

        let physical = Physical::new(&path).unwrap();
        assert_eq!(physical.data(), &[1, 2, 3, 4]);
        assert!(matches!(
            Physical::new(dir.path().join("missing.bin")),
            Err(Error::FileError(_))
        ));
    }
}
