pub mod md;
