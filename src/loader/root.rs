//! The metadata root and its stream headers (ECMA-335 II.24.2.1, II.24.2.2).

use crate::{
    loader::io::{read_le, read_le_at},
    Error::OutOfBounds,
    Result,
};

/// `BSJB`, the metadata root signature.
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// Location and name of one metadata stream, relative to the metadata root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Offset from the start of the metadata root
    pub offset: u32,
    /// Size in bytes
    pub size: u32,
    /// Stream name, e.g. `#~` or `#Strings`
    pub name: String,
}

impl StreamHeader {
    /// Reads a stream header; returns it together with its padded on-disk length.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the name is not terminated within 32 bytes of data.
    pub fn read(data: &[u8]) -> Result<(StreamHeader, usize)> {
        if data.len() < 9 {
            return Err(OutOfBounds);
        }

        let name_area = &data[8..data.len().min(8 + 32)];
        let Some(name_len) = name_area.iter().position(|b| *b == 0) else {
            return Err(OutOfBounds);
        };
        let name = String::from_utf8_lossy(&name_area[..name_len]).into_owned();

        let header = StreamHeader {
            offset: read_le::<u32>(data)?,
            size: read_le::<u32>(&data[4..])?,
            name,
        };

        // Name plus terminator, padded to four bytes
        let name_aligned = (name_len + 1 + 3) & !3;
        Ok((header, 8 + name_aligned))
    }
}

/// The metadata root.
#[derive(Debug, Clone)]
pub struct Root {
    /// Major version, 1
    pub major_version: u16,
    /// Minor version, 1
    pub minor_version: u16,
    /// Runtime version string, e.g. `v4.0.30319`
    pub version: String,
    /// Stream headers in declaration order
    pub stream_headers: Vec<StreamHeader>,
}

impl Root {
    /// Parses the root at the start of `data`, the metadata blob.
    ///
    /// Every stream must lie within `data`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for a bad signature or stream table and
    /// [`crate::Error::OutOfBounds`] for out-of-range offsets.
    pub fn read(data: &[u8]) -> Result<Root> {
        if data.len() < 20 {
            return Err(OutOfBounds);
        }

        let signature = read_le::<u32>(data)?;
        if signature != CIL_HEADER_MAGIC {
            return Err(malformed_error!(
                "CIL_HEADER_MAGIC does not match - 0x{:08X}",
                signature
            ));
        }

        let version_length = read_le_at::<u32>(data, &mut 12)? as usize;
        let Some(version_end) = version_length.checked_add(16) else {
            return Err(malformed_error!(
                "Version string length causing integer overflow - {}",
                version_length
            ));
        };
        if version_end + 4 > data.len() {
            return Err(OutOfBounds);
        }

        let version_bytes = &data[16..version_end];
        let version_len = version_bytes
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(version_bytes.len());
        let version = String::from_utf8_lossy(&version_bytes[..version_len]).into_owned();

        // flags (u16) precede the stream count
        let stream_count = read_le_at::<u16>(data, &mut (version_end + 2))?;
        if stream_count == 0 {
            return Err(malformed_error!("Invalid stream count"));
        }

        let mut stream_headers = Vec::with_capacity(usize::from(stream_count));
        let mut stream_offset = version_end + 4;
        for _ in 0..stream_count {
            if stream_offset >= data.len() {
                return Err(OutOfBounds);
            }

            let (header, length) = StreamHeader::read(&data[stream_offset..])?;
            match header.offset.checked_add(header.size) {
                Some(end) if end as usize <= data.len() => {}
                Some(_) => return Err(OutOfBounds),
                None => {
                    return Err(malformed_error!(
                        "Stream offset and size cause integer overflow - {} + {}",
                        header.offset,
                        header.size
                    ))
                }
            }

            stream_offset += length;
            stream_headers.push(header);
        }

        Ok(Root {
            major_version: read_le::<u16>(&data[4..])?,
            minor_version: read_le::<u16>(&data[6..])?,
            version,
            stream_headers,
        })
    }

    /// The stream named `name`, if present. The first one wins for duplicated names.
    #[must_use]
    pub fn stream(&self, name: &str) -> Option<&StreamHeader> {
        self.stream_headers.iter().find(|s| s.name == name)
    }
}
