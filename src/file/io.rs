//! Little-endian primitive reading and writing for the pin database container.
//!
//! The container stores every integer little-endian. [`crate::file::io::PinIO`] abstracts over the
//! primitive types the format uses so that [`crate::file::parser::Parser`] and the container writer
//! can share one bounds-checked implementation.
//!
//! # Error Handling
//!
//! Reads return [`crate::Error::OutOfBounds`] if there are insufficient bytes in the buffer.

use crate::Result;

/// Trait for primitive types that can be converted from and to little-endian byte arrays.
pub trait PinIO: Sized {
    /// Fixed-size byte array of the type's size.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read `Self` from a little-endian byte array.
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Convert `Self` into a little-endian byte array.
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_pin_io {
    ($($ty:ty),*) => {
        $(
            impl PinIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_pin_io!(u8, u16, u32, u64, i32);

/// Reads a value of type `T` in little-endian order at `offset`, advancing `offset` on success.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: PinIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_bounds_error!());
    };
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

/// Appends `value` to `buffer` in little-endian order.
pub fn write_le<T: PinIO>(buffer: &mut Vec<u8>, value: T) {
    buffer.extend_from_slice(value.to_le_bytes().as_ref());
}
