//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.
//!
//! The three desktop ports (`WindowLocator`, `ScreenSampler`, `InputController`)
//! stand in for the OS; `TemplateSource` loads reference images; the storage
//! ports persist the job hierarchy; `EventPublisher` reports run progress.

pub mod event_bus;
pub mod input;
pub mod screen;
pub mod storage;
pub mod templates;
pub mod window;

pub use event_bus::EventPublisher;
pub use input::InputController;
pub use screen::ScreenSampler;
pub use storage::{JobRepository, OperationRepository, TaskRepository};
pub use templates::TemplateSource;
pub use window::{WindowHandle, WindowLocator};
