pub mod content;
pub mod structural;
