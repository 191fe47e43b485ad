pub mod command_error;
pub mod model_error;
