pub mod archive;
pub mod errors;
pub mod model;
pub mod normalize;
pub mod tokenizer;

pub use archive::{expand_archive, expand_inputs, is_archive};
pub use errors::ParserError;
pub use model::{
    HeaderRecord, HeaderRow, NormalizedRow, RawRow, RawTable, SourceFile, NAME_COLUMN,
};
pub use normalize::{donors, ExtensionRule, RowNormalizer, DEFAULT_NOISE_MARKERS};
pub use tokenizer::{decode_utf8, read_table, tokenize_records, tokenize_rows};
