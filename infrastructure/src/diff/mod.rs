pub mod gateway_applier;

pub use gateway_applier::GatewayDiffApplier;
