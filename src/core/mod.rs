pub mod card;
pub mod query;
pub mod state;
