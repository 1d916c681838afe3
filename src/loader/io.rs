//! Bounds-checked little-endian reads.
//!
//! Every metadata structure is little-endian. All functions return [`Error::OutOfBounds`]
//! instead of panicking when the buffer is too short.

use crate::{Error::OutOfBounds, Result};

/// Integer types that can be decoded from their little-endian byte representation.
pub trait CilIO: Sized {
    /// Fixed-size byte array matching the type's width
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Decodes from little-endian bytes.
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_cil_io {
    ($($ty:ty),*) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_cil_io!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Reads a `T` from the start of `data`.
///
/// # Errors
/// Returns [`Error::OutOfBounds`] if `data` is shorter than `T`.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Reads a `T` at `offset` and advances `offset` past it.
///
/// # Errors
/// Returns [`Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;
    Ok(T::from_le_bytes(read))
}

/// Reads a 4-byte value if `is_large`, otherwise a 2-byte one, widened to `u32`.
///
/// Heap and table indices are stored in either width depending on the module's size.
///
/// # Errors
/// Returns [`Error::OutOfBounds`] if the buffer is too short.
pub fn read_le_at_dyn(data: &[u8], offset: &mut usize, is_large: bool) -> Result<u32> {
    if is_large {
        read_le_at::<u32>(data, offset)
    } else {
        Ok(u32::from(read_le_at::<u16>(data, offset)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_widths() {
        assert_eq!(read_le::<u8>(&BUFFER).unwrap(), 0x01);
        assert_eq!(read_le::<u16>(&BUFFER).unwrap(), 0x0201);
        assert_eq!(read_le::<u32>(&BUFFER).unwrap(), 0x0403_0201);
        assert_eq!(read_le::<u64>(&BUFFER).unwrap(), 0x0807_0605_0403_0201);
        assert_eq!(read_le::<i8>(&[0xFF]).unwrap(), -1);
    }

    #[test]
    fn read_advances() {
        let mut offset = 2;
        assert_eq!(read_le_at::<u16>(&BUFFER, &mut offset).unwrap(), 0x0403);
        assert_eq!(offset, 4);

        assert_eq!(read_le_at_dyn(&BUFFER, &mut offset, false).unwrap(), 0x0605);
        assert_eq!(offset, 6);

        let mut offset = 0;
        assert_eq!(
            read_le_at_dyn(&BUFFER, &mut offset, true).unwrap(),
            0x0403_0201
        );
        assert_eq!(offset, 4);
    }

    #[test]
    fn out_of_bounds() {
        let mut offset = 6;
        assert!(matches!(
            read_le_at::<u32>(&BUFFER, &mut offset),
            Err(Error::OutOfBounds)
        ));
        // A failed read leaves the offset untouched
        assert_eq!(offset, 6);

        let mut offset = usize::MAX;
        assert!(matches!(
            read_le_at::<u8>(&BUFFER, &mut offset),
            Err(Error::OutOfBounds)
        ));
    }
}
