pub mod journal;

pub use journal::init_journal;
