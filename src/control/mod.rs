pub mod command;
pub mod surface;
pub mod shell;

pub use surface::ControlSurface;
pub use shell::{OperatorShell, ShellExit};
