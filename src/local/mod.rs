//! Local filesystem collaborators

pub mod archive;
pub mod source;

pub use archive::{delete_solve_with_image, FsImageArchive, ImageArchive};
pub use source::{FsImageSource, ImageSource};
