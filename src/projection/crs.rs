use proj::Proj;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::projection::pci::{pci_to_proj4, PROJ_PARAM_COUNT};

/// A coordinate reference decoded from a PCI descriptor.
///
/// The reference is empty when no descriptor was present or the import
/// failed; check [`CoordinateReference::is_empty`] before use.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CoordinateReference {
    descriptor: String,
    params: Vec<f64>,
    definition: Option<String>,
}

impl CoordinateReference {
    /// An empty reference
    pub fn empty() -> Self {
        Self::default()
    }

    /// A populated reference
    pub fn new(descriptor: &str, params: &[f64; PROJ_PARAM_COUNT], definition: String) -> Self {
        Self {
            descriptor: descriptor.to_string(),
            params: params.to_vec(),
            definition: Some(definition),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.definition.is_none()
    }

    /// PROJ definition string, if populated
    pub fn proj_definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    /// The PCI descriptor the reference was imported from
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }
}

/// Imports a PCI coordinate-system descriptor into a PROJ definition
pub trait CrsImporter: Send + Sync {
    fn import(&self, descriptor: &str, params: &[f64; PROJ_PARAM_COUNT]) -> Result<String>;
}

/// Default importer: translates the descriptor and validates it with PROJ
#[derive(Debug, Default, Clone, Copy)]
pub struct PciImporter;

impl CrsImporter for PciImporter {
    fn import(&self, descriptor: &str, params: &[f64; PROJ_PARAM_COUNT]) -> Result<String> {
        let definition = pci_to_proj4(descriptor, params)?;

        Proj::new(&definition)
            .map_err(|e| Error::Projection(format!("PROJ rejected '{}': {}", definition, e)))?;

        Ok(definition)
    }
}
