pub mod case;
pub mod profile;
