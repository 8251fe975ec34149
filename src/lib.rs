pub mod config;
pub mod engine;
pub mod keyboard;
pub mod lexicon;
pub mod mistakes;
pub mod model;
pub mod runner;
pub mod scheduler;
pub mod sim;
pub mod timing;
pub mod trace;
pub mod word_nav;

pub use config::{ConfigUpdate, SimulationConfig};
pub use engine::TypingEngine;
pub use model::{MistakeKind, MistakeRecord, SimulationState, TypingEvent, TypingStats};
