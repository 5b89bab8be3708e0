mod adapter;
mod discovery;
mod schema;

pub use adapter::RolloutJournalAdapter;
