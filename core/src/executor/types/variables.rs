use std::collections::BTreeMap;

/// Numeric value of a variable.
pub type Value = i64;

/// Variable name -> last committed value. Ordered so that output and logs are stable.
pub type VariableTable = BTreeMap<String, Value>;
