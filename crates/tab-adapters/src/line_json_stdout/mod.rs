mod adapter;
mod schema;

pub use adapter::LineJsonStdoutAdapter;
