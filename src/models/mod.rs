pub mod device;
pub mod metric;
pub mod smart;
