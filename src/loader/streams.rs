//! The `#Strings` and `#Blob` heaps (ECMA-335 II.24.2.3, II.24.2.4).

use std::{ffi::CStr, str};

use crate::{loader::parser::Parser, Error::OutOfBounds, Result};

/// Identifier strings, NUL-terminated UTF-8.
#[derive(Debug, Clone, Copy)]
pub struct Strings<'a> {
    data: &'a [u8],
}

impl<'a> Strings<'a> {
    /// Wraps the heap bytes. The first byte of a well-formed heap is always `0`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the heap is empty or does not start with `0`.
    pub fn from(data: &'a [u8]) -> Result<Strings<'a>> {
        if data.first() != Some(&0) {
            return Err(malformed_error!("Provided #Strings heap is empty"));
        }

        Ok(Strings { data })
    }

    /// The string starting at `index`. Index `0` is the empty string.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `index` lies past the heap and
    /// [`crate::Error::Malformed`] if the string is unterminated or not UTF-8.
    pub fn get(&self, index: usize) -> Result<&'a str> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        CStr::from_bytes_until_nul(&self.data[index..])
            .ok()
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| malformed_error!("Invalid string at index - {}", index))
    }
}

/// Length-prefixed binary values: signatures, public keys, constant values.
#[derive(Debug, Clone, Copy)]
pub struct Blob<'a> {
    data: &'a [u8],
}

impl<'a> Blob<'a> {
    /// Wraps the heap bytes. The first byte of a well-formed heap is always `0`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the heap is empty or does not start with `0`.
    pub fn from(data: &'a [u8]) -> Result<Blob<'a>> {
        if data.first() != Some(&0) {
            return Err(malformed_error!("Provided #Blob heap is empty"));
        }

        Ok(Blob { data })
    }

    /// The blob starting at `index`, without its length prefix.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the index or the encoded length lies past the heap.
    pub fn get(&self, index: usize) -> Result<&'a [u8]> {
        if index >= self.data.len() {
            return Err(OutOfBounds);
        }

        let mut parser = Parser::new(&self.data[index..]);
        let len = parser.read_compressed_uint()? as usize;
        let start = index + parser.pos();

        let Some(end) = start.checked_add(len) else {
            return Err(OutOfBounds);
        };

        self.data.get(start..end).ok_or(OutOfBounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings() {
        let mut data = vec![0_u8];
        data.extend_from_slice(b"<Module>\0");
        data.extend_from_slice(b"Assembly-CSharp\0");
        data.extend_from_slice(b"PlayerController\0");

        let heap = Strings::from(&data).unwrap();
        assert_eq!(heap.get(0).unwrap(), "");
        assert_eq!(heap.get(1).unwrap(), "<Module>");
        assert_eq!(heap.get(10).unwrap(), "Assembly-CSharp");
        assert_eq!(heap.get(26).unwrap(), "PlayerController");
        // Suffix of an existing string
        assert_eq!(heap.get(32).unwrap(), "Controller");
        assert!(heap.get(data.len()).is_err());
    }

    #[test]
    fn strings_invalid() {
        assert!(Strings::from(&[]).is_err());
        assert!(Strings::from(b"abc\0").is_err());

        let heap = Strings::from(&[0x00, b'a', b'b']).unwrap();
        assert!(heap.get(1).is_err());

        let heap = Strings::from(&[0x00, 0xFF, 0xFE, 0x00]).unwrap();
        assert!(heap.get(1).is_err());
    }

    #[test]
    fn blob() {
        #[rustfmt::skip]
        let data = [
            0x00,
            0x03, 0x20, 0x00, 0x01,
            0x02, 0x06, 0x08,
            0x00,
        ];

        let heap = Blob::from(&data).unwrap();
        assert_eq!(heap.get(0).unwrap(), &[] as &[u8]);
        assert_eq!(heap.get(1).unwrap(), &[0x20, 0x00, 0x01]);
        assert_eq!(heap.get(5).unwrap(), &[0x06, 0x08]);
        assert_eq!(heap.get(8).unwrap(), &[] as &[u8]);
        assert!(heap.get(9).is_err());
    }

    #[test]
    fn blob_truncated() {
        let heap = Blob::from(&[0x00, 0x05, 0x01]).unwrap();
        assert!(heap.get(1).is_err());
        assert!(Blob::from(&[0x01]).is_err());
    }
}
