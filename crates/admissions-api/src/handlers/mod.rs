pub mod applications;
pub mod local_objects;
pub mod portal;
pub mod settings;
pub mod uploads;
