pub mod fs_perms;
pub mod validator;

pub use fs_perms::{create_private_dir, expand_home, mode_of, write_private_file};
pub use validator::{validate_hostname, validate_user};
