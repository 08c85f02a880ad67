//! Domain constants: include directive prefixes and form schema vocabulary.

/// Optional flat include. Must be tested before [`FLAT_PREFIX`].
pub const FLAT_OPTIONAL_PREFIX: &str = "json-flat?://";
/// Flat include: the fragment's array items are spliced in place.
pub const FLAT_PREFIX: &str = "json-flat://";
/// Optional single-value include. Must be tested before [`PLAIN_PREFIX`].
pub const OPTIONAL_PREFIX: &str = "json?://";
/// Single-value include: the fragment's top node replaces the directive.
pub const PLAIN_PREFIX: &str = "json://";

/// All directive prefixes in longest-match order, with their `(optional, flat)` flags.
pub const DIRECTIVE_PREFIXES: [(&str, bool, bool); 4] = [
    (FLAT_OPTIONAL_PREFIX, true, true),
    (FLAT_PREFIX, false, true),
    (OPTIONAL_PREFIX, true, false),
    (PLAIN_PREFIX, false, false),
];

/// Localization key delimiter.
pub const KEY_DELIMITER: char = '.';

/// Second token of every form localization key.
pub const FORM_TOKEN: &str = "form";

// Fixed token slots of a key chain.
pub const MODULE_TOKEN_INDEX: usize = 0;
pub const TYPE_TOKEN_INDEX: usize = 1;
pub const FORM_NAME_TOKEN_INDEX: usize = 2;
pub const GROUP_TOKEN_INDEX: usize = 3;
pub const FIRST_FIELD_TOKEN_INDEX: usize = 4;

// Form schema property names.
pub const PROP_NAME: &str = "name";
pub const PROP_TYPE: &str = "type";
pub const PROP_GROUP_ROWS: &str = "groupRows";
pub const PROP_GROUPS: &str = "groups";
pub const PROP_ROWS: &str = "rows";
pub const PROP_FIELDS: &str = "fields";
pub const PROP_EXPRESSION: &str = "expression";
pub const PROP_REQUEST: &str = "request";
