//! Cloud dumps and mesh file export.

use std::path::Path;

use scan_io::{pack_into, save_stl, StlFormat, RECORD_SIZE};
use scan_types::{Mesh, PointSource};

use crate::error::{PipelineError, PipelineResult};
use crate::store::CloudEntry;

/// Point counts and packed records of a dumped cloud.
///
/// Paired clouds report `(left, right)` counts; dense clouds report
/// `(count, 0)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dump {
    /// Points from the left side, or all points of a dense cloud.
    pub left_count: usize,
    /// Points from the right side, zero for dense clouds.
    pub right_count: usize,
    /// Concatenated point records.
    pub bytes: Vec<u8>,
}

impl Dump {
    /// Splits the dump into `(left_count, right_count, bytes)`.
    #[must_use]
    pub fn into_parts(self) -> (usize, usize, Vec<u8>) {
        (self.left_count, self.right_count, self.bytes)
    }
}

/// Packs an entry into records: left then right for paired clouds, index
/// order for dense clouds.
///
/// # Errors
///
/// Returns [`PipelineError::DumpSizeMismatch`] if the byte count does not
/// match the point counts.
pub fn dump(entry: &CloudEntry) -> PipelineResult<Dump> {
    let (left_count, right_count, bytes) = match entry {
        CloudEntry::Paired(cloud) => {
            let mut bytes = Vec::with_capacity(cloud.len() * RECORD_SIZE);
            for point in cloud.iter() {
                pack_into(&mut bytes, point);
            }
            (cloud.left.len(), cloud.right.len(), bytes)
        }
        CloudEntry::Dense(cloud) => {
            let mut bytes = Vec::with_capacity(cloud.len() * RECORD_SIZE);
            for point in cloud.iter() {
                pack_into(&mut bytes, &point);
            }
            (cloud.len(), 0, bytes)
        }
    };

    let expected = (left_count + right_count) * RECORD_SIZE;
    if bytes.len() != expected {
        return Err(PipelineError::DumpSizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }

    Ok(Dump {
        left_count,
        right_count,
        bytes,
    })
}

/// Writes a mesh file, resolving faces against `source`.
///
/// # Errors
///
/// Returns [`PipelineError::MeshIndexOutOfRange`] if the mesh no longer
/// fits its cloud, or an I/O error if the file cannot be written.
pub fn export_mesh<S, P>(mesh: &Mesh, source: &S, path: P, format: StlFormat) -> PipelineResult<()>
where
    S: PointSource + ?Sized,
    P: AsRef<Path>,
{
    save_stl(mesh, source, path, format)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use scan_engine::EngineCloud;
    use scan_io::unpack;
    use scan_types::{PairedCloud, Point, ScanColor};

    use crate::store::DenseCloud;

    fn points(n: u8, color: ScanColor) -> Vec<Point> {
        (0..n)
            .map(|i| Point::new(f32::from(i), -f32::from(i), 0.5, color))
            .collect()
    }

    #[test]
    fn paired_dump_counts_and_size() {
        let entry = CloudEntry::Paired(PairedCloud::from_sides(
            points(10, ScanColor::RED),
            points(15, ScanColor::WHITE),
        ));
        let (left, right, bytes) = dump(&entry).unwrap().into_parts();

        assert_eq!((left, right), (10, 15));
        assert_eq!(bytes.len(), 600);
    }

    #[test]
    fn paired_dump_is_left_then_right() {
        let entry = CloudEntry::Paired(PairedCloud::from_sides(
            points(2, ScanColor::RED),
            points(3, ScanColor::WHITE),
        ));
        let decoded = unpack(&dump(&entry).unwrap().bytes).unwrap();

        let colors: Vec<ScanColor> = decoded.iter().map(|p| p.color).collect();
        assert_eq!(colors[..2], [ScanColor::RED; 2]);
        assert_eq!(colors[2..], [ScanColor::WHITE; 3]);
    }

    #[test]
    fn dense_dump_reports_zero_right() {
        let engine: EngineCloud = points(4, ScanColor::WHITE).iter().collect();
        let entry = CloudEntry::Dense(DenseCloud::Engine(engine));
        let dumped = dump(&entry).unwrap();

        assert_eq!((dumped.left_count, dumped.right_count), (4, 0));
        assert_eq!(unpack(&dumped.bytes).unwrap(), points(4, ScanColor::WHITE));
    }

    #[test]
    fn empty_dump() {
        let dumped = dump(&CloudEntry::Paired(PairedCloud::new())).unwrap();
        assert_eq!(dumped.into_parts(), (0, 0, Vec::new()));
    }

    #[test]
    fn export_stale_mesh() {
        let dir = tempfile::tempdir().unwrap();
        let source = points(3, ScanColor::WHITE);
        let mesh = Mesh::new("scan", vec![[0, 1, 3]]);

        let err = export_mesh(&mesh, &source, dir.path().join("m.stl"), StlFormat::Ascii)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MeshIndexOutOfRange { index: 3, len: 3 }
        ));
    }
}
