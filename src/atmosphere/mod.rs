//! Remote sea-level pressure: provider traits, the error taxonomy, the NWS
//! station client and the refresh store.

pub mod nws;
mod provider;
mod store;

pub use nws::{NwsClient, NwsProvider, NwsStation};
pub use provider::{
    Coordinate, FixedLocation, LocationProvider, ProviderError, SeaLevelObservation,
    SeaLevelPressureProvider, StationInfo,
};
pub use store::AtmosphereStore;
