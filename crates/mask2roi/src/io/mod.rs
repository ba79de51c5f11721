pub mod config_file;
pub mod geojson;

pub use config_file::ConfigFile;
