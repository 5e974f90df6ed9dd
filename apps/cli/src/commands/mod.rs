//! 命令定义和实现

pub mod config;
pub mod modes;
pub mod run;

pub use config::ConfigCommand;
pub use run::RunCommand;
