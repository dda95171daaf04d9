pub mod ewm;

pub use ewm::{ewm_last, ewm_mean, Decay, EwmStats};
