//! The typed view over a decoded catalog: resources, their tagged bodies,
//! and the YAML decoder that stands in for the production binary format.

mod decode;
mod model;

pub use decode::{CatalogDecoder, DecodeError, JsonCatalogDecoder, YamlCatalogDecoder};
pub use model::{
    ArgvCommand, Body, Catalog, Command, Condition, ExecResource, FileKind, FileResource,
    Resource,
};
