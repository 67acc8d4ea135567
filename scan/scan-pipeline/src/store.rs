//! Named cloud and mesh registry.

use std::collections::BTreeMap;

use scan_engine::EngineCloud;
use scan_types::{Mesh, PairedCloud, Point, PointSource};

use crate::error::{PipelineError, PipelineResult};

/// A single merged point sequence with no side distinction.
///
/// Either held natively or as an engine handle; both expose count and
/// random access.
#[derive(Debug, Clone, PartialEq)]
pub enum DenseCloud {
    /// Points held in memory.
    Points(Vec<Point>),
    /// Points held by the geometry engine.
    Engine(EngineCloud),
}

impl DenseCloud {
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Points(points) => points.len(),
            Self::Engine(cloud) => cloud.len(),
        }
    }

    /// Returns true if the cloud has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets a point by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Point> {
        match self {
            Self::Points(points) => points.get(index).copied(),
            Self::Engine(cloud) => cloud.get(index),
        }
    }

    /// Iterates over all points in index order.
    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    /// Returns the cloud as an engine handle, copying native points in.
    #[must_use]
    pub fn to_engine_cloud(&self) -> EngineCloud {
        match self {
            Self::Points(points) => points.iter().collect(),
            Self::Engine(cloud) => cloud.clone(),
        }
    }
}

impl PointSource for DenseCloud {
    fn point_count(&self) -> usize {
        self.len()
    }

    fn point(&self, index: usize) -> Option<Point> {
        self.get(index)
    }
}

impl From<EngineCloud> for DenseCloud {
    fn from(cloud: EngineCloud) -> Self {
        Self::Engine(cloud)
    }
}

impl From<Vec<Point>> for DenseCloud {
    fn from(points: Vec<Point>) -> Self {
        Self::Points(points)
    }
}

/// A stored cloud in either shape.
#[derive(Debug, Clone, PartialEq)]
pub enum CloudEntry {
    /// Left and right sides, as uploaded.
    Paired(PairedCloud),
    /// A merged cloud.
    Dense(DenseCloud),
}

impl CloudEntry {
    /// Total number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Paired(cloud) => cloud.len(),
            Self::Dense(cloud) => cloud.len(),
        }
    }

    /// Returns true if the entry has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The paired cloud, if this entry is paired.
    #[must_use]
    pub const fn as_paired(&self) -> Option<&PairedCloud> {
        match self {
            Self::Paired(cloud) => Some(cloud),
            Self::Dense(_) => None,
        }
    }

    /// The dense cloud, if this entry is dense.
    #[must_use]
    pub const fn as_dense(&self) -> Option<&DenseCloud> {
        match self {
            Self::Dense(cloud) => Some(cloud),
            Self::Paired(_) => None,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Paired(_) => "paired",
            Self::Dense(_) => "dense",
        }
    }
}

impl PointSource for CloudEntry {
    fn point_count(&self) -> usize {
        self.len()
    }

    fn point(&self, index: usize) -> Option<Point> {
        match self {
            Self::Paired(cloud) => cloud.point(index),
            Self::Dense(cloud) => cloud.get(index),
        }
    }
}

impl From<PairedCloud> for CloudEntry {
    fn from(cloud: PairedCloud) -> Self {
        Self::Paired(cloud)
    }
}

impl From<DenseCloud> for CloudEntry {
    fn from(cloud: DenseCloud) -> Self {
        Self::Dense(cloud)
    }
}

/// Registry of clouds and meshes by name.
///
/// Inserting under an existing name discards the previous entry. Meshes are
/// keyed by the name of the cloud they were built from and only hold that
/// name; keeping the cloud compatible is up to the caller.
///
/// # Example
///
/// ```
/// use scan_pipeline::{CloudEntry, CloudStore};
/// use scan_types::{PairedCloud, Point};
///
/// let mut store = CloudStore::new();
/// store.insert("scan", PairedCloud::from_sides(vec![Point::from_coords(0.0, 0.0, 0.0)], vec![]));
/// store.insert("scan", PairedCloud::new());
///
/// assert_eq!(store.len(), 1);
/// assert!(store.get("scan").is_some_and(CloudEntry::is_empty));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CloudStore {
    clouds: BTreeMap<String, CloudEntry>,
    meshes: BTreeMap<String, Mesh>,
}

impl CloudStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            clouds: BTreeMap::new(),
            meshes: BTreeMap::new(),
        }
    }

    /// Stores a cloud, returning the entry it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        entry: impl Into<CloudEntry>,
    ) -> Option<CloudEntry> {
        self.clouds.insert(name.into(), entry.into())
    }

    /// Looks up a cloud.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CloudEntry> {
        self.clouds.get(name)
    }

    /// Looks up a cloud that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownCloudName`] if nothing is stored
    /// under `name`.
    pub fn require(&self, name: &str) -> PipelineResult<&CloudEntry> {
        self.clouds
            .get(name)
            .ok_or_else(|| PipelineError::UnknownCloudName {
                name: name.to_string(),
            })
    }

    /// Looks up a paired cloud.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unknown or the entry is dense.
    pub fn require_paired(&self, name: &str) -> PipelineResult<&PairedCloud> {
        self.require(name)?
            .as_paired()
            .ok_or_else(|| PipelineError::NotPaired {
                name: name.to_string(),
            })
    }

    /// Looks up a dense cloud.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unknown or the entry is paired.
    pub fn require_dense(&self, name: &str) -> PipelineResult<&DenseCloud> {
        self.require(name)?
            .as_dense()
            .ok_or_else(|| PipelineError::NotDense {
                name: name.to_string(),
            })
    }

    /// Removes a cloud. Meshes built from it are left in place.
    pub fn remove(&mut self, name: &str) -> Option<CloudEntry> {
        self.clouds.remove(name)
    }

    /// Returns true if a cloud is stored under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.clouds.contains_key(name)
    }

    /// Stored cloud names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clouds.keys().map(String::as_str)
    }

    /// Number of stored clouds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clouds.len()
    }

    /// Returns true if no clouds are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clouds.is_empty()
    }

    /// Stores a mesh under the name of the cloud it references.
    pub fn insert_mesh(&mut self, mesh: Mesh) -> Option<Mesh> {
        self.meshes.insert(mesh.cloud_name().to_string(), mesh)
    }

    /// Looks up the mesh built from `name`.
    #[must_use]
    pub fn mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.get(name)
    }

    /// Removes the mesh built from `name`.
    pub fn remove_mesh(&mut self, name: &str) -> Option<Mesh> {
        self.meshes.remove(name)
    }

    /// One-line summary of the stored clouds for logs.
    pub(crate) fn describe(&self) -> String {
        self.clouds
            .iter()
            .map(|(name, entry)| format!("{name}({}:{})", entry.kind(), entry.len()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
