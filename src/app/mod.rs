pub mod dashboard;
pub mod pipelines;
pub mod render;

pub use dashboard::Dashboard;
pub use pipelines::ConversionPipeline;
