pub mod etl;
pub mod query;
pub mod transform;

pub use crate::domain::model::{ColumnDescriptor, Document, RawRow, TabularDataset, VehicleRecord};
pub use crate::domain::ports::{
    ConversionResult, ConversionSettings, DocumentStore, Pipeline, Storage,
};
pub use crate::utils::error::Result;
