//! egui rendering of the Journalkollen chat widget.

pub mod panels;
pub mod state;
pub mod theme;

pub use panels::chat::{chat_panel, ChatAction};
pub use state::UiState;
