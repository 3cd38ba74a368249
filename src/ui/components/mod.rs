//! UI components.

pub mod card;
pub mod transport;
pub mod visualizer;

pub use card::render_card;
pub use transport::render_transport;
pub use visualizer::{render_visualizer, Theme};
