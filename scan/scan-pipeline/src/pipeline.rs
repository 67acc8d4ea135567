//! The pipeline controller.

use std::path::Path;

use scan_engine::GeometryEngine;
use scan_io::{unpack, StlFormat};
use scan_types::PairedCloud;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::denoise::{recolor_sides, remove_statistical_outliers, DenoiseStrategy};
use crate::error::{PipelineError, PipelineResult};
use crate::filter::{Axis, Cut, Direction};
use crate::mesher::build_mesh;
use crate::serializer::{dump, export_mesh, Dump};
use crate::store::{CloudEntry, CloudStore, DenseCloud};

/// Owns a cloud store and runs named-cloud operations against it.
///
/// Every operation reads its input entries and writes a single new entry at
/// the end, so a failing operation leaves the store as it was.
///
/// # Example
///
/// ```
/// use scan_engine::NullEngine;
/// use scan_io::pack;
/// use scan_pipeline::{Axis, Direction, PipelineConfig, ScanPipeline};
/// use scan_types::Point;
///
/// let mut pipeline = ScanPipeline::new(Box::new(NullEngine), PipelineConfig::default());
///
/// let left = pack(&[Point::from_coords(1.0, 0.0, 0.0), Point::from_coords(-1.0, 0.0, 0.0)]);
/// let right = pack(&[Point::from_coords(2.0, 0.0, 0.0)]);
/// pipeline.upload("scan", &left, &right).unwrap();
///
/// pipeline
///     .cut("scan", "front", Axis::X, Direction::GreaterOrEqual, 0.0)
///     .unwrap();
///
/// let dump = pipeline.dump("front").unwrap();
/// assert_eq!((dump.left_count, dump.right_count), (1, 1));
/// assert_eq!(dump.bytes.len(), 48);
/// ```
#[derive(Debug)]
pub struct ScanPipeline {
    engine: Box<dyn GeometryEngine>,
    config: PipelineConfig,
    denoise: DenoiseStrategy,
    store: CloudStore,
}

impl ScanPipeline {
    /// Creates a pipeline with an empty store.
    ///
    /// The denoise strategy is fixed here from the engine's availability and
    /// the configured missing-engine policy.
    #[must_use]
    pub fn new(engine: Box<dyn GeometryEngine>, config: PipelineConfig) -> Self {
        let denoise = DenoiseStrategy::select(engine.is_available(), config.missing_engine);
        if !engine.is_available() {
            if denoise.needs_engine() {
                warn!(
                    engine = engine.name(),
                    "geometry engine unavailable, denoising will fail"
                );
            } else {
                warn!(
                    engine = engine.name(),
                    strategy = ?denoise,
                    "geometry engine unavailable, denoising degrades to side recolor"
                );
            }
        }
        Self {
            engine,
            config,
            denoise,
            store: CloudStore::new(),
        }
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The denoise strategy in use.
    #[must_use]
    pub const fn denoise_strategy(&self) -> DenoiseStrategy {
        self.denoise
    }

    /// The geometry engine.
    #[must_use]
    pub fn engine(&self) -> &dyn GeometryEngine {
        self.engine.as_ref()
    }

    /// The cloud store.
    #[must_use]
    pub const fn store(&self) -> &CloudStore {
        &self.store
    }

    /// Mutable access to the cloud store.
    pub fn store_mut(&mut self) -> &mut CloudStore {
        &mut self.store
    }

    /// Decodes both buffers and stores them as a paired cloud.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MalformedBuffer`] if either buffer is not a
    /// whole number of records. Nothing is stored in that case.
    pub fn upload(&mut self, name: &str, left: &[u8], right: &[u8]) -> PipelineResult<()> {
        let cloud = PairedCloud::from_sides(unpack(left)?, unpack(right)?);
        let (left_count, right_count) = cloud.counts();

        self.store.insert(name, cloud);
        debug!(name, left = left_count, right = right_count, "upload");
        debug!(clouds = %self.store.describe(), "store");
        Ok(())
    }

    /// Crops `name_in` into `name_out`.
    ///
    /// Paired clouds are cropped side by side, dense clouds as one sequence.
    /// `name_in` and `name_out` may be equal.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownCloudName`] if `name_in` is missing.
    pub fn cut(
        &mut self,
        name_in: &str,
        name_out: &str,
        axis: Axis,
        direction: Direction,
        threshold: f64,
    ) -> PipelineResult<()> {
        let cut = Cut::new(axis, direction, threshold);
        debug!(name_in, name_out, %cut, "cut");

        let output = cut.apply_entry(self.store.require(name_in)?);
        self.store.insert(name_out, output);
        Ok(())
    }

    /// Crops with textual parameters: axis token `x`, `y`, `z` or `r`, and
    /// `true` for `>=`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidFilterMode`] for an unknown axis
    /// token, before anything else is looked at.
    pub fn cut_mode(
        &mut self,
        name_in: &str,
        name_out: &str,
        mode: &str,
        greater: bool,
        threshold: f64,
    ) -> PipelineResult<()> {
        let axis: Axis = mode.parse()?;
        self.cut(name_in, name_out, axis, Direction::from(greater), threshold)
    }

    /// Denoises `name_in` into `name_out` with the configured strategy.
    ///
    /// The statistical strategy stores an engine-backed dense cloud, the
    /// side-recolor stub stores a paired cloud.
    ///
    /// # Errors
    ///
    /// Returns an error if `name_in` is missing, if the stub gets a dense
    /// cloud, or if the engine fails or is unavailable.
    pub fn delete_noise(
        &mut self,
        name_in: &str,
        name_out: &str,
        std_multiplier: f64,
    ) -> PipelineResult<()> {
        debug!(name_in, name_out, std_multiplier, strategy = ?self.denoise, "delete_noise");

        let output = match self.denoise {
            DenoiseStrategy::Statistical => {
                let entry = self.store.require(name_in)?;
                let cleaned = remove_statistical_outliers(
                    self.engine.as_ref(),
                    entry,
                    self.config.sor_neighbors,
                    std_multiplier,
                )?;
                CloudEntry::Dense(DenseCloud::Engine(cleaned))
            }
            DenoiseStrategy::SideRecolor => {
                let cloud = self.store.require_paired(name_in)?;
                CloudEntry::Paired(recolor_sides(cloud))
            }
        };

        self.store.insert(name_out, output);
        Ok(())
    }

    /// Builds a mesh over the dense cloud `name`.
    ///
    /// Stores the normal-estimated copy under the configured normals name
    /// and the mesh under `name`. Returns the face count.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is missing or paired, or if the engine
    /// fails or is unavailable.
    pub fn build_mesh(&mut self, name: &str) -> PipelineResult<usize> {
        let cloud = self.store.require_dense(name)?;
        let build = build_mesh(self.engine.as_ref(), name, cloud)?;
        let faces = build.mesh.face_count();
        info!(
            name,
            vertices = build.normals.len(),
            faces,
            "mesh built"
        );

        let normals_name = self.config.normals_cloud_name.clone();
        self.store.insert(normals_name, DenseCloud::Engine(build.normals));
        self.store.insert_mesh(build.mesh);
        Ok(faces)
    }

    /// Writes the mesh built from `name` to a file.
    ///
    /// Faces are resolved against the cloud currently stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if no mesh was built for `name`, the cloud is gone,
    /// the cloud no longer fits the mesh, or the file cannot be written.
    pub fn export_mesh(
        &self,
        name: &str,
        path: impl AsRef<Path>,
        format: StlFormat,
    ) -> PipelineResult<()> {
        let mesh = self
            .store
            .mesh(name)
            .ok_or_else(|| PipelineError::UnknownMesh {
                name: name.to_string(),
            })?;
        let source = self.store.require(mesh.cloud_name())?;

        export_mesh(mesh, source, path.as_ref(), format)?;
        info!(name, path = %path.as_ref().display(), ?format, faces = mesh.face_count(), "mesh exported");
        Ok(())
    }

    /// Builds the mesh for `name` and writes it to the configured path.
    ///
    /// # Errors
    ///
    /// Returns any error of [`build_mesh`](Self::build_mesh) or
    /// [`export_mesh`](Self::export_mesh).
    pub fn to_mesh(&mut self, name: &str) -> PipelineResult<()> {
        self.build_mesh(name)?;
        let path = self.config.mesh_output_path.clone();
        self.export_mesh(name, path, self.config.stl_format)
    }

    /// Denoises and then meshes the result, writing the configured mesh file.
    ///
    /// The denoised cloud stays stored if meshing fails afterwards.
    ///
    /// # Errors
    ///
    /// Returns any error of [`delete_noise`](Self::delete_noise) or
    /// [`to_mesh`](Self::to_mesh).
    pub fn delete_noise_and_mesh(
        &mut self,
        name_in: &str,
        name_out: &str,
        std_multiplier: f64,
    ) -> PipelineResult<()> {
        self.delete_noise(name_in, name_out, std_multiplier)?;
        self.to_mesh(name_out)
    }

    /// Packs the cloud `name` into point records.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownCloudName`] if `name` is missing.
    pub fn dump(&self, name: &str) -> PipelineResult<Dump> {
        let dumped = dump(self.store.require(name)?)?;
        debug!(
            name,
            left = dumped.left_count,
            right = dumped.right_count,
            bytes = dumped.bytes.len(),
            "dump"
        );
        Ok(dumped)
    }
}
