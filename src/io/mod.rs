pub mod paths;

pub use paths::InstallPaths;
