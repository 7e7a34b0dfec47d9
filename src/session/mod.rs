// Session control: the asset scan loop
pub mod controller;

pub use controller::{AssetScan, SessionConfig, SessionController, SessionEnd, SessionReport};
