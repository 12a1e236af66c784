pub mod dto;
pub mod services;

pub use dto::{DietType, FoodGroup};
