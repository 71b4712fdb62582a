mod compiler;
mod database;
mod discovery;
mod types;

pub use compiler::{
    compile_config_database, ContentCompileError, ContentErrorCode, SourceLocation,
};
pub use database::{
    ConfigDatabase, ConfigDefId, ConfigurationAsset, ConfigurationAssetBuilder, ParamValue,
};
pub use types::{ContentPlanError, ContentRequest};
