//! Face lists over named clouds.

use nalgebra::Vector3;

use crate::cloud::PointSource;
use crate::error::{MeshError, MeshResult};
use crate::point::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A triangle face as three point indices into the referenced cloud.
pub type Face = [u32; 3];

/// A face list over a named cloud.
///
/// The mesh does not own its points. It names the cloud they live in and
/// resolves faces through a [`PointSource`] at export time. If that cloud is
/// later overwritten with fewer points, resolution fails with
/// [`MeshError::IndexOutOfRange`]; keeping the two in step is up to the caller.
///
/// # Example
///
/// ```
/// use scan_types::{Mesh, Point};
///
/// let points = vec![
///     Point::from_coords(0.0, 0.0, 0.0),
///     Point::from_coords(1.0, 0.0, 0.0),
///     Point::from_coords(0.0, 1.0, 0.0),
/// ];
/// let mesh = Mesh::new("scan", vec![[0, 1, 2]]);
///
/// let triangles: Vec<_> = mesh.triangles(&points).collect::<Result<_, _>>().unwrap();
/// assert_eq!(triangles.len(), 1);
/// assert_eq!(mesh.cloud_name(), "scan");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mesh {
    cloud_name: String,
    faces: Vec<Face>,
}

impl Mesh {
    /// Create a mesh over the cloud named `cloud_name`.
    #[must_use]
    pub fn new(cloud_name: impl Into<String>, faces: Vec<Face>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            faces,
        }
    }

    /// Name of the cloud this mesh indexes into.
    #[must_use]
    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    /// The faces, in the order the reconstruction produced them.
    #[must_use]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns true if the mesh has no faces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Iterate over all faces resolved against `source`.
    ///
    /// Each item is an error if any index of that face is not present in
    /// `source`.
    pub fn triangles<'a, S>(
        &'a self,
        source: &'a S,
    ) -> impl Iterator<Item = MeshResult<Triangle>> + 'a
    where
        S: PointSource + ?Sized,
    {
        self.faces
            .iter()
            .enumerate()
            .map(move |(i, face)| resolve_face(i, face, source))
    }
}

fn resolve_face<S>(face_index: usize, face: &Face, source: &S) -> MeshResult<Triangle>
where
    S: PointSource + ?Sized,
{
    let lookup = |index: u32| {
        source
            .point(index as usize)
            .ok_or_else(|| MeshError::IndexOutOfRange {
                face: face_index,
                index,
                len: source.point_count(),
            })
    };
    Ok(Triangle {
        vertices: [lookup(face[0])?, lookup(face[1])?, lookup(face[2])?],
    })
}

/// A face with its three points resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// The three corners, in face winding order.
    pub vertices: [Point; 3],
}

impl Triangle {
    /// Compute the unit face normal by the right-hand rule.
    ///
    /// Returns `None` for degenerate triangles (zero area).
    ///
    /// # Example
    ///
    /// ```
    /// use scan_types::{Point, Triangle};
    ///
    /// let tri = Triangle {
    ///     vertices: [
    ///         Point::from_coords(0.0, 0.0, 0.0),
    ///         Point::from_coords(1.0, 0.0, 0.0),
    ///         Point::from_coords(0.0, 1.0, 0.0),
    ///     ],
    /// };
    /// let normal = tri.normal().unwrap();
    /// assert!((normal.z - 1.0).abs() < 1e-6);
    /// ```
    #[must_use]
    pub fn normal(&self) -> Option<Vector3<f32>> {
        let [a, b, c] = self.vertices;
        let n = (b.position - a.position).cross(&(c.position - a.position));
        let len = n.norm();
        if len > f32::EPSILON {
            Some(n / len)
        } else {
            None
        }
    }
}
