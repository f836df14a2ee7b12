pub mod advisory;
pub mod date;
pub mod feed;
pub mod output;
