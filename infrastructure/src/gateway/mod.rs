pub mod command;

pub use command::CommandLlmGateway;
