pub mod attr_names;
pub mod convert;
pub mod history;
pub mod human;
pub mod report;
pub mod resolver;
