pub mod compositor;
pub mod config;
pub mod errors;
pub mod host;
pub mod input;
pub mod native;
pub mod registry;
pub mod surface;
pub mod view;
pub mod window;

pub use config::{HostConfig, LogLevel};
pub use errors::HostError;
pub use host::watchers::WindowNotice;
pub use host::{init_shared, HostContext, RunState, SharedHost};
pub use view::EngineView;
pub use window::WindowManager;
