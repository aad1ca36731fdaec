//! Operation implementations, one module per family.

mod aggregates;
mod codelist;
mod column_order;
mod domains;
mod record_count;
mod study_day;
mod variables;

pub use aggregates::{Distinct, Maximum, Mean, Minimum};
pub use codelist::CodelistAttributes;
pub use column_order::{DatasetColumnOrder, LibraryColumnOrder, library_column_order};
pub use domains::{DomainIsCustom, StudyDomains};
pub use record_count::RecordCount;
pub use study_day::{REFERENCE_START_COLUMN, StudyDay, study_day};
pub use variables::{VariableCount, VariableExists, VariableNames, sibling_reference};

pub const RECORD_COUNT: &str = "record_count";
pub const DISTINCT: &str = "distinct";
pub const MIN: &str = "min";
pub const MAX: &str = "max";
pub const MEAN: &str = "mean";
pub const DY: &str = "dy";
pub const COLUMN_ORDER_FROM_DATASET: &str = "get_column_order_from_dataset";
pub const COLUMN_ORDER_FROM_LIBRARY: &str = "get_column_order_from_library";
pub const CODELIST_ATTRIBUTES: &str = "get_codelist_attributes";
pub const DOMAIN_IS_CUSTOM: &str = "domain_is_custom";
pub const STUDY_DOMAINS: &str = "study_domains";
pub const VARIABLE_NAMES: &str = "variable_names";
pub const VARIABLE_EXISTS: &str = "variable_exists";
pub const VARIABLE_COUNT: &str = "variable_count";
