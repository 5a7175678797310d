//! Semantic layer tests, grouped by component.

pub mod tests_compare;
pub mod tests_context;
pub mod tests_name_lookup;
pub mod tests_static_props;
pub mod tests_templates;
pub mod tests_type_resolution;
