//! Short-read aware primitives shared by the header and record readers.

use std::io::{self, ErrorKind, Read};

/// Fill `buf` as far as the stream allows.
///
/// Returns the number of bytes read; anything less than `buf.len()` means the
/// stream ended. `Interrupted` is retried, every other error is returned.
pub(crate) fn read_up_to<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Append up to `len` bytes to `buf`, growing it only as data arrives.
///
/// A corrupt header announcing a huge program therefore costs at most the
/// bytes actually present in the stream.
pub(crate) fn read_exact_growing<R: Read + ?Sized>(
    r: &mut R,
    len: usize,
    buf: &mut Vec<u8>,
) -> io::Result<usize> {
    let start = buf.len();
    let limit = u64::try_from(len).unwrap_or(u64::MAX);
    Read::take(&mut *r, limit).read_to_end(buf)?;
    Ok(buf.len() - start)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader that yields one byte per call and interrupts every other call.
    struct Dribble<'a> {
        data: &'a [u8],
        flip: bool,
    }

    impl Read for Dribble<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.flip = !self.flip;
            if self.flip {
                return Err(io::Error::new(ErrorKind::Interrupted, "again"));
            }
            if self.data.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[0];
            self.data = &self.data[1..];
            Ok(1)
        }
    }

    #[test]
    fn read_up_to_survives_dribbles() {
        let mut r = Dribble {
            data: &[1, 2, 3, 4, 5],
            flip: false,
        };
        let mut buf = [0u8; 8];
        assert_eq!(read_up_to(&mut r, &mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn growing_read_stops_at_eof() {
        let mut src: &[u8] = &[9, 9, 9];
        let mut buf = Vec::new();
        assert_eq!(read_exact_growing(&mut src, usize::MAX, &mut buf).unwrap(), 3);
        assert_eq!(buf, vec![9, 9, 9]);
    }
}
