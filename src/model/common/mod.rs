pub mod class_name;
pub mod election;
pub mod redemption;
