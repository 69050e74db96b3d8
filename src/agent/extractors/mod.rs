pub mod financial;
pub mod leadership;
pub mod sentiment;
pub mod technology;
