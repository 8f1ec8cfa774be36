mod cell;
mod embedding;
mod gru;
mod lstm;
mod multiplicative;
mod rnn;

pub use cell::{Cell, CellLength, CellState};
pub use embedding::Embeddings;
pub use gru::Gru;
pub use lstm::Lstm;
pub use multiplicative::Multiplicative;
pub use rnn::{effective_position, is_padding, Rnn};
