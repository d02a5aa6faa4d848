//! Real Seoul locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap.

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

pub const JAMSIL: Location = Location::new("Jamsil Station", 37.513294, 127.100183);
pub const YEOUIDO: Location = Location::new("Yeouido Park", 37.521624, 126.924218);
pub const GIMPO: Location = Location::new("Gimpo Airport", 37.577833, 126.812902);
pub const YEOUIDO_EAST: Location = Location::new("Yeouido East", 37.538431, 126.895589);

/// Arterial roads crossing the fixture routes.
pub const OLYMPIC_DAERO: &str = "Olympic-daero";
pub const GANGBYEON_BUKRO: &str = "Gangbyeon-bukro";
pub const TEHERAN_RO: &str = "Teheran-ro";
pub const GONGHANG_DAERO: &str = "Gonghang-daero";
