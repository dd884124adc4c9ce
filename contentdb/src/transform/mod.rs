pub mod builtins;
pub mod content;
pub mod options;
pub mod pipeline;
pub mod registry;
pub mod transformer;

pub use content::{extname, TransformedContent};
pub use options::{StepSetting, TransformOptions};
pub use pipeline::Pipeline;
pub use registry::TransformerRegistry;
pub use transformer::{ContentTransformer, FnParser, FnTransform, Parse, StepOptions, Transform};
