pub mod posting;
pub mod seen;
