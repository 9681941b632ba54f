use thiserror::Error;

use super::model::Catalog;

/// Failure to turn raw bytes into a [`Catalog`]. Distinct from
/// [`crate::errors::ConstructionError`]: a decode failure means the bytes
/// were not even a well-formed catalog document, so no graph was attempted.
#[derive(Error, Debug)]
#[error("failed to decode catalog: {0}")]
pub struct DecodeError(String);

/// The external catalog-format boundary. A real deployment might emit
/// catalogs from an embedded DSL in some wire format; that producer and its
/// format are out of scope here. This trait is the seam a real decoder
/// would plug into.
pub trait CatalogDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Catalog, DecodeError>;
}

/// Decodes a catalog authored as YAML — the stand-in format this crate
/// ships so the binary and its tests have something to read.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlCatalogDecoder;

impl CatalogDecoder for YamlCatalogDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Catalog, DecodeError> {
        serde_yaml::from_slice(bytes).map_err(|e| DecodeError(e.to_string()))
    }
}

/// Decodes a catalog authored as JSON. Exercises the same `Deserialize`
/// impls as [`YamlCatalogDecoder`]; provided because nothing about the
/// catalog model ties it to one wire format.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCatalogDecoder;

impl CatalogDecoder for JsonCatalogDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Catalog, DecodeError> {
        serde_json::from_slice(bytes).map_err(|e| DecodeError(e.to_string()))
    }
}
