pub mod extractor;
pub mod layout;
pub mod log_parser;
pub mod reserves;

pub use extractor::{EventExtractor, EventFacts, Extraction, FactsSource, TokenSide};
pub use layout::AmmPoolLayout;
pub use log_parser::{parse_logs, LogFacts};
pub use reserves::ReserveResolver;
