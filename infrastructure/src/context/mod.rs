pub mod local;

pub use local::LocalFileContext;
