pub mod answer;
pub mod assignment;
pub mod catalog;
