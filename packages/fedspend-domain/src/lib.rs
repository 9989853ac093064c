pub mod cfo;
pub mod code_variants;
pub mod fiscal;
pub mod sanitize;
