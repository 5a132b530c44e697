//! HTTP client for the Nominatim geocoding API and the address-relaxation
//! resolver built on top of it.

mod client;
mod error;
mod resolve;
mod types;

pub use client::NominatimClient;
pub use error::GeocodeError;
pub use resolve::{resolve_address, resolve_address_with_delay, MAX_RELAXATIONS};
pub use types::{AddressQuery, Place, PlaceAddress};
