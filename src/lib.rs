pub mod ast;
pub mod codegen;
pub mod parsing;

pub use codegen::{Codegen, CodegenError};
pub use parsing::{parse, tokenize, ParseError};
