//! Fixed-width binary codec for scanner samples.
//!
//! # Record Format
//!
//! ```text
//! foreach point
//!     REAL32   – x
//!     REAL32   – y
//!     REAL32   – z
//!     REAL32   – r, normalized to [0, 1]
//!     REAL32   – g, normalized to [0, 1]
//!     REAL32   – b, normalized to [0, 1]
//! end
//! ```
//!
//! All values are little-endian. There is no header and no count; the number
//! of points is the buffer length divided by [`RECORD_SIZE`].

use scan_types::{Point, ScanColor};

use crate::error::{IoError, IoResult};

/// Size of one point record in bytes (six `f32` fields).
pub const RECORD_SIZE: usize = 24;

/// Decode a buffer of point records.
///
/// Colors are converted to display range with [`ScanColor::from_unit`].
///
/// # Errors
///
/// Returns [`IoError::MalformedBuffer`] if the buffer length is not a
/// multiple of [`RECORD_SIZE`]. Nothing is decoded in that case.
///
/// # Example
///
/// ```
/// use scan_io::{pack, unpack};
/// use scan_types::{Point, ScanColor};
///
/// let bytes = pack(&[Point::new(1.0, 2.0, 3.0, ScanColor::RED)]);
/// let points = unpack(&bytes).unwrap();
///
/// assert_eq!(points.len(), 1);
/// assert_eq!(points[0].color, ScanColor::RED);
/// ```
pub fn unpack(buffer: &[u8]) -> IoResult<Vec<Point>> {
    if buffer.len() % RECORD_SIZE != 0 {
        return Err(IoError::MalformedBuffer { len: buffer.len() });
    }

    Ok(buffer.chunks_exact(RECORD_SIZE).map(read_point).collect())
}

/// Encode points as consecutive records.
///
/// This is the inverse of [`unpack`]: each color channel is divided by 255
/// before encoding.
#[must_use]
pub fn pack(points: &[Point]) -> Vec<u8> {
    pack_iter(points.iter().copied())
}

/// Encode a sequence of points as consecutive records.
///
/// Useful for sources that only offer indexed access.
#[must_use]
pub fn pack_iter<I>(points: I) -> Vec<u8>
where
    I: IntoIterator<Item = Point>,
{
    let points = points.into_iter();
    let mut buffer = Vec::with_capacity(points.size_hint().0 * RECORD_SIZE);
    for point in points {
        pack_into(&mut buffer, &point);
    }
    buffer
}

/// Append one record to `buffer`.
pub fn pack_into(buffer: &mut Vec<u8>, point: &Point) {
    let (r, g, b) = point.color.to_unit();
    for value in [point.x(), point.y(), point.z(), r, g, b] {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
}

/// Read a point from one 24-byte record.
fn read_point(record: &[u8]) -> Point {
    let field = |i: usize| {
        let o = i * 4;
        f32::from_le_bytes([record[o], record[o + 1], record[o + 2], record[o + 3]])
    };
    Point::new(
        field(0),
        field(1),
        field(2),
        ScanColor::from_unit(field(3), field(4), field(5)),
    )
}
