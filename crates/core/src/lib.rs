pub mod error;
pub mod flow;
pub mod intent;
pub mod models;
pub mod voice;

pub use error::CoreError;
pub use flow::{advance, prompts, spoken_reply, ticket_sentence, train_timing_sentence, Transition};
pub use intent::{classify_intent, normalize_text};
pub use models::*;
pub use voice::{GatherDirective, Terminal, VoiceDocument, VoicePrompt};
