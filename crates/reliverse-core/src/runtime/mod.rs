//! External tooling: package managers and subprocess streaming

pub mod check;
pub mod tool;

pub use check::{
    check_package_manager, detect_from_lockfile, detect_package_manager, install_dependencies,
    PackageManager, RuntimeInfo,
};
pub use tool::{run_captured, run_streaming};
