pub mod addr;
pub mod interface;
pub mod topology;
