pub mod contract;
pub mod records;
