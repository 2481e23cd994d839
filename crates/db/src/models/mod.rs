pub mod base_model;
pub mod job;
pub mod lora;
pub mod training_job;
