pub mod dto;
pub mod http;
pub mod prompt;
pub mod token_file;
