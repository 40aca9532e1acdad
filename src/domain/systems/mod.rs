// Per-tick systems that operate over the whole entity set.

pub mod collision;
