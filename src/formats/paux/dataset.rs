//! Opening, creating, closing and deleting PCI .aux labelled datasets
//!
//! A dataset is a raw binary file plus a `.aux` text sidecar. The dataset
//! owns the sidecar's [`MetadataStore`], the raw file handle shared by all
//! bands, the band views and the georeferencing decoded at open time.
//! Metadata edits accumulate in memory and are written back on close.

use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::io::RawStorage;
use crate::projection::{CoordinateReference, CrsImporter, PciImporter};
use crate::types::{DataType, Dimensions};
use super::band::{BandView, RasterBand, RasterBandMut};
use super::georef::{
    import_coordinate_reference, keys, scan_ground_control_points, GeoTransform,
    GroundControlPoint,
};
use super::layout::{compute_layouts, BandLayout, Interleave};
use super::metadata::{MetadataStore, SIDECAR_SEPARATOR};
use super::sidecar::{self, TARGET_TAG};
use super::text::{parse_i64, tokenize};

/// Largest band count accepted from a `RawDefinition` line
pub const MAX_BAND_COUNT: usize = 65536;

const RAW_DEFINITION: &str = "RawDefinition";

fn chan_definition_key(band: usize) -> String {
    format!("ChanDefinition-{}", band)
}

/// How the raw file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Access {
    #[default]
    ReadOnly,
    Update,
}

/// Options controlling [`PauxDataset::open`]
#[derive(Clone)]
pub struct OpenOptions {
    access: Access,
    sibling_files: Option<Vec<String>>,
    importer: Arc<dyn CrsImporter>,
}

impl OpenOptions {
    /// Read-only access with the PCI importer
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Shorthand for `access(Access::Update)`
    pub fn update(self) -> Self {
        self.access(Access::Update)
    }

    /// Names of the files next to the target. When given, the `.aux` sidecar
    /// must be among them or the open is rejected without touching the disk.
    pub fn sibling_files(mut self, siblings: Vec<String>) -> Self {
        self.sibling_files = Some(siblings);
        self
    }

    /// Replaces the coordinate-system importer
    pub fn importer(mut self, importer: Arc<dyn CrsImporter>) -> Self {
        self.importer = importer;
        self
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            access: Access::ReadOnly,
            sibling_files: None,
            importer: Arc::new(PciImporter),
        }
    }
}

impl fmt::Debug for OpenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenOptions")
            .field("access", &self.access)
            .field("sibling_files", &self.sibling_files)
            .finish_non_exhaustive()
    }
}

/// Options controlling [`PauxDataset::create`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateOptions {
    pub interleave: Interleave,
}

impl CreateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interleave(mut self, interleave: Interleave) -> Self {
        self.interleave = interleave;
        self
    }

    /// Reads `NAME=VALUE` creation options. Only `INTERLEAVE` is known;
    /// other names are ignored.
    pub fn from_strings<S: AsRef<str>>(options: &[S]) -> Self {
        let mut parsed = Self::default();
        for option in options {
            let option = option.as_ref();
            match option.split_once('=') {
                Some((name, value)) if name.trim().eq_ignore_ascii_case("INTERLEAVE") => {
                    parsed.interleave = Interleave::from_option(value.trim());
                }
                _ => log::debug!("Ignoring creation option '{}'", option),
            }
        }
        parsed
    }
}

/// An open PCI .aux labelled dataset
pub struct PauxDataset {
    target_path: PathBuf,
    sidecar_path: PathBuf,
    dims: Dimensions,
    access: Access,
    file: Option<File>,
    metadata: MetadataStore,
    bands: Vec<BandView>,
    spatial_ref: CoordinateReference,
    gcps: Vec<GroundControlPoint>,
    gcp_spatial_ref: CoordinateReference,
}

impl PauxDataset {
    /// Opens a dataset from either the raw file or its `.aux` sidecar.
    ///
    /// Bands whose `ChanDefinition` is missing or malformed, or whose samples
    /// are not addressable, are skipped with a warning. The remaining bands
    /// are numbered in order from 1.
    pub fn open<P: AsRef<Path>>(path: P, options: &OpenOptions) -> Result<Self> {
        let target_path = sidecar::resolve_target(path.as_ref());
        let sidecar_path =
            sidecar::locate_sidecar(&target_path, options.sibling_files.as_deref())?;
        sidecar::sniff(&sidecar_path)?;

        let mut metadata = MetadataStore::load(&sidecar_path)?;
        let (dims, declared_bands) = parse_raw_definition(&metadata)?;

        let file = fs::OpenOptions::new()
            .read(true)
            .write(options.access == Access::Update)
            .open(&target_path)
            .map_err(|source| Error::FileOpen {
                path: target_path.clone(),
                source,
            })?;

        let mut bands = Vec::with_capacity(declared_bands);
        for declared in 1..=declared_bands {
            let key = chan_definition_key(declared);
            let Some(definition) = metadata.get(&key) else {
                log::warn!("{} missing from {}, band skipped", key, sidecar_path.display());
                continue;
            };
            let Some(layout) = BandLayout::parse(definition) else {
                log::warn!("{} has an invalid layout '{}', band skipped", key, definition);
                continue;
            };
            if let Err(e) = layout.validate_extent(dims) {
                log::warn!("{} is not addressable, band skipped: {}", key, e);
                continue;
            }
            bands.push(BandView::new(bands.len() + 1, layout, &metadata));
        }

        let spatial_ref = match metadata.get(keys::MAP_UNITS) {
            Some(map_units) => import_coordinate_reference(
                options.importer.as_ref(),
                map_units,
                metadata.get(keys::PROJ_PARAMS),
            ),
            None => CoordinateReference::empty(),
        };

        let (gcps, gcp_spatial_ref) =
            scan_ground_control_points(&metadata, options.importer.as_ref());
        metadata.clear_dirty();

        log::debug!(
            "Opened {} ({}x{}, {} of {} bands)",
            target_path.display(),
            dims.width,
            dims.height,
            bands.len(),
            declared_bands
        );

        Ok(Self {
            target_path,
            sidecar_path,
            dims,
            access: options.access,
            file: Some(file),
            metadata,
            bands,
            spatial_ref,
            gcps,
            gcp_spatial_ref,
        })
    }

    /// Creates a raw file and sidecar, then reopens them for update.
    ///
    /// The raw file only receives two placeholder bytes; it grows as lines
    /// are written. The sidecar is written next to it with an `aux`
    /// extension.
    pub fn create<P: AsRef<Path>>(
        path: P,
        width: usize,
        height: usize,
        band_count: usize,
        data_type: DataType,
        options: &CreateOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        check_dimensions(width, height, band_count)?;
        let layouts = compute_layouts(options.interleave, width, height, band_count, data_type)?;

        let mut raw = File::create(path).map_err(|source| Error::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        raw.write_all(&[0, 0])?;
        drop(raw);

        let basename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut header = MetadataStore::new();
        header.set(TARGET_TAG, basename);
        header.set(RAW_DEFINITION, format!("{} {} {}", width, height, band_count));
        for (index, layout) in layouts.iter().enumerate() {
            header.set(&chan_definition_key(index + 1), layout.to_definition());
        }

        let sidecar_path = sidecar::sidecar_path(path, "aux");
        header.save(&sidecar_path, SIDECAR_SEPARATOR)?;

        log::info!(
            "Created {} ({}x{}x{} {}, {} interleaved)",
            path.display(),
            width,
            height,
            band_count,
            data_type,
            options.interleave.name()
        );

        Self::open(path, &OpenOptions::new().update())
    }

    /// Deletes a dataset's raw file and sidecar.
    ///
    /// Refuses unless the sidecar exists and carries the target tag. Failing
    /// to remove the sidecar after the raw file is gone is only logged.
    pub fn delete<P: AsRef<Path>>(path: P) -> Result<()> {
        let target = path.as_ref();
        let sidecar_path = sidecar::locate_sidecar(target, None)?;
        sidecar::sniff(&sidecar_path)?;

        fs::remove_file(target).map_err(|source| Error::FileOpen {
            path: target.to_path_buf(),
            source,
        })?;

        if let Err(e) = fs::remove_file(&sidecar_path) {
            log::warn!("Could not remove {}: {}", sidecar_path.display(), e);
        }
        Ok(())
    }

    /// Flushes the raw file and writes the sidecar back if it changed.
    ///
    /// Every step runs even when an earlier one fails; failures are reported
    /// together.
    pub fn close(mut self) -> Result<()> {
        self.close_inner()
    }

    fn close_inner(&mut self) -> Result<()> {
        let mut failures = Vec::new();

        if let Some(file) = self.file.take() {
            if self.access == Access::Update {
                if let Err(e) = file.flush_all() {
                    log::error!("Flushing {} failed: {}", self.target_path.display(), e);
                    failures.push(format!("flush {}: {}", self.target_path.display(), e));
                }
            }
        }

        if self.metadata.is_dirty() {
            if let Err(e) = self.metadata.save(&self.sidecar_path, SIDECAR_SEPARATOR) {
                log::error!("Writing {} failed: {}", self.sidecar_path.display(), e);
                failures.push(format!("save {}: {}", self.sidecar_path.display(), e));
            }
            self.metadata.clear_dirty();
        }

        self.gcps.clear();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Close(failures.join("; ")))
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn width(&self) -> usize {
        self.dims.width
    }

    pub fn height(&self) -> usize {
        self.dims.height
    }

    pub fn access(&self) -> Access {
        self.access
    }

    /// Number of usable bands, possibly fewer than the sidecar declares
    pub fn raster_count(&self) -> usize {
        self.bands.len()
    }

    /// Band `number`, counted from 1
    pub fn band(&self, number: usize) -> Result<RasterBand<'_>> {
        let index = self.band_index(number)?;
        Ok(RasterBand::new(self, &self.bands[index]))
    }

    /// Mutable band `number`, counted from 1
    pub fn band_mut(&mut self, number: usize) -> Result<RasterBandMut<'_>> {
        let index = self.band_index(number)?;
        Ok(RasterBandMut::new(self, index))
    }

    pub fn bands(&self) -> impl Iterator<Item = RasterBand<'_>> {
        self.bands.iter().map(move |view| RasterBand::new(self, view))
    }

    fn band_index(&self, number: usize) -> Result<usize> {
        if number == 0 || number > self.bands.len() {
            return Err(Error::OutOfBounds(format!(
                "Band {} requested, dataset has {}",
                number,
                self.bands.len()
            )));
        }
        Ok(number - 1)
    }

    /// Transform from the corner keys; fails with `MissingMetadata` when any
    /// corner is absent (`unwrap_or_default` then yields the identity)
    pub fn geo_transform(&self) -> Result<GeoTransform> {
        GeoTransform::from_store(&self.metadata, self.dims)
    }

    /// Stores the transform as corner keys. Rotation terms are not stored.
    pub fn set_geo_transform(&mut self, transform: GeoTransform) {
        transform.write_to_store(&mut self.metadata, self.dims);
    }

    pub fn gcps(&self) -> &[GroundControlPoint] {
        &self.gcps
    }

    /// Dataset coordinate reference from `MapUnits`, if one was imported
    pub fn spatial_ref(&self) -> Option<&CoordinateReference> {
        Some(&self.spatial_ref).filter(|crs| !crs.is_empty())
    }

    /// Coordinate reference of the ground control points, if one was imported
    pub fn gcp_spatial_ref(&self) -> Option<&CoordinateReference> {
        Some(&self.gcp_spatial_ref).filter(|crs| !crs.is_empty())
    }

    /// The raw file followed by the sidecar
    pub fn file_list(&self) -> Vec<PathBuf> {
        vec![self.target_path.clone(), self.sidecar_path.clone()]
    }

    /// The resolved raw file path
    pub fn description(&self) -> String {
        self.target_path.display().to_string()
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn sidecar_path(&self) -> &Path {
        &self.sidecar_path
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Direct access to the sidecar entries; changes are saved on close
    pub fn metadata_mut(&mut self) -> &mut MetadataStore {
        &mut self.metadata
    }

    pub(crate) fn storage(&self) -> Result<&File> {
        self.file
            .as_ref()
            .ok_or_else(|| Error::Close(format!("{} is closed", self.target_path.display())))
    }

    pub(crate) fn band_views(&self) -> &[BandView] {
        &self.bands
    }

    pub(crate) fn band_views_mut(&mut self) -> &mut [BandView] {
        &mut self.bands
    }
}

impl Drop for PauxDataset {
    fn drop(&mut self) {
        if self.file.is_none() && !self.metadata.is_dirty() {
            return;
        }
        if let Err(e) = self.close_inner() {
            log::error!("Closing {} on drop: {}", self.target_path.display(), e);
        }
    }
}

impl fmt::Debug for PauxDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PauxDataset")
            .field("target_path", &self.target_path)
            .field("sidecar_path", &self.sidecar_path)
            .field("dims", &self.dims)
            .field("access", &self.access)
            .field("bands", &self.bands.len())
            .finish()
    }
}

/// Reads `RawDefinition: <width> <height> <bands>`
fn parse_raw_definition(store: &MetadataStore) -> Result<(Dimensions, usize)> {
    let value = store.get(RAW_DEFINITION).ok_or_else(|| {
        Error::MissingMetadata(format!("{} is not set", RAW_DEFINITION))
    })?;

    let tokens = tokenize(value);
    if tokens.len() < 3 {
        return Err(Error::MissingMetadata(format!(
            "{} needs width, height and band count, got '{}'",
            RAW_DEFINITION, value
        )));
    }

    let field = |index: usize| -> Result<usize> {
        parse_i64(&tokens[index])
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| {
                Error::Validation(format!("{} value '{}' is not a count", RAW_DEFINITION, tokens[index]))
            })
    };

    let (width, height, bands) = (field(0)?, field(1)?, field(2)?);
    check_dimensions(width, height, bands)?;
    Ok((Dimensions::new(width, height), bands))
}

fn check_dimensions(width: usize, height: usize, bands: usize) -> Result<()> {
    let limit = i32::MAX as usize;
    if width == 0 || height == 0 || width > limit || height > limit {
        return Err(Error::Validation(format!(
            "Invalid dataset dimensions: {} x {}",
            width, height
        )));
    }
    if bands == 0 || bands > MAX_BAND_COUNT {
        return Err(Error::Validation(format!("Invalid band count: {}", bands)));
    }
    Ok(())
}
