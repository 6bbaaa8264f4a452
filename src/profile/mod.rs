/// Profile documents and the key-value stores that hold them.
pub mod store;
