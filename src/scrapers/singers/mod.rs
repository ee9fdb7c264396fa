pub mod crawler;
pub mod normalizer;
pub mod parser;

pub use crawler::{process, CrawlTask, TaskOutput};
pub use normalizer::{
    clean_records, derive_identity, normalize_fields, normalize_strings, project, split_date,
};
pub use parser::{discover, extract, IndexPage, PerformerLink};
