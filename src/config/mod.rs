mod bridge;

pub use bridge::BridgeConfig;
