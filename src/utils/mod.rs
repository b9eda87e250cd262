pub mod environment;
pub mod terminal;

pub use environment::Credentials;
pub use terminal::{sanitize_for_terminal, song_label};
