pub mod annotation;
pub mod man;
pub mod render;
pub mod result;
pub mod table;
pub mod web;
