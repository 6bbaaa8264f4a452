/// Commands and the queue they travel through.
pub mod command;
/// State-change notifications.
pub mod event;
/// Multi-source selection.
pub mod selection;
/// Output and editor settings.
pub mod settings;
/// The studio context.
pub mod state;
