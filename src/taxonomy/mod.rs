//! Taxonomy core: header matching, record extraction, tree building and the
//! rama lookup tables.

mod extract;
mod mapping;
mod normalize;
mod rama;
mod tree;

pub use extract::{
    CellValue, Extraction, HEADER_SCAN_LIMIT, HeaderVocabulary, RawRecord, extract_records,
};
pub use mapping::{
    ARTICLE_ALIASES, ASSIGNMENT_ALIASES, AliasField, AliasTable, CATEGORY_ALIASES, MappedRecord,
    map_record,
};
pub use normalize::{collate, fold_text, normalize_header};
pub use rama::{
    BucketPolicy, GenderClassifier, PLACEHOLDER_OPTION, RamaIndex, RootSegmentClassifier,
    UNSELECTED_OPTION, root_segment,
};
pub use tree::{
    CategoryForest, CategoryNode, PATH_SEPARATOR, RutaToCodes, Severity, ValidationIssue,
    build_forest, render_rows,
};
