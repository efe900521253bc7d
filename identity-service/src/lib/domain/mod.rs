pub mod category;
pub mod identity;
