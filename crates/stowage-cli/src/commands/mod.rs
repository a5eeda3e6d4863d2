pub mod contracts;
pub mod import;
pub mod marks;
pub mod sniff;
