use anyhow::anyhow;

macro_rules! checked_get_impl {
    ($checked_getter: ident, $ty:ty, $getter: ident) => {
        fn $checked_getter(&mut self) -> anyhow::Result<$ty> {
            if self.remaining() < size_of::<$ty>() {
                return Err(anyhow!("buffer underflow: {} bytes required, {} remaining", size_of::<$ty>(), self.remaining()));
            }
            Ok(self.$getter())
        }
    }
}

/// Bounds-checked reads: all getters return an error instead of panicking if the buffer does not
///  contain enough data.
pub trait BufExt: bytes::Buf {
    checked_get_impl!(checked_get_u8, u8, get_u8);
    checked_get_impl!(checked_get_u16, u16, get_u16);
}

impl <T: bytes::Buf> BufExt for T {
}

/// Splits off the first `len` bytes of a byte slice without copying, advancing the slice.
pub fn checked_split<'a>(buf: &mut &'a [u8], len: usize) -> anyhow::Result<&'a [u8]> {
    if buf.len() < len {
        return Err(anyhow!("buffer underflow: {} bytes required, {} remaining", len, buf.len()));
    }
    let (head, tail) = buf.split_at(len);
    *buf = tail;
    Ok(head)
}
