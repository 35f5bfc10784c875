pub mod launcher;
pub mod registry;
pub mod terminal;
