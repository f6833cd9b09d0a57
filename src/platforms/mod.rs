pub mod generic;
pub mod youtube;
