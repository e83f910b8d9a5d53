use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Declares a categorical field: the enum, its wire spelling, and its
/// position inside the field's one-hot block.
macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const NAMES: &'static [&'static str] = &[$($label),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Position of this value inside its one-hot block.
            pub fn index(self) -> usize {
                self as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary!(Airline {
    SpiceJet => "SpiceJet",
    AirAsia => "AirAsia",
    Vistara => "Vistara",
    GoFirst => "GO_FIRST",
    Indigo => "Indigo",
    AirIndia => "Air_India",
});

vocabulary!(City {
    Delhi => "Delhi",
    Mumbai => "Mumbai",
    Bangalore => "Bangalore",
    Kolkata => "Kolkata",
    Hyderabad => "Hyderabad",
    Chennai => "Chennai",
});

vocabulary!(
    /// Coarse part of the day a flight departs or arrives in.
    TimeSlot {
        EarlyMorning => "Early_Morning",
        Morning => "Morning",
        Afternoon => "Afternoon",
        Evening => "Evening",
        Night => "Night",
        LateNight => "Late_Night",
    }
);

vocabulary!(Stops {
    Zero => "zero",
    One => "one",
    TwoOrMore => "two_or_more",
});

vocabulary!(CabinClass {
    Economy => "Economy",
    Business => "Business",
});

/// One fare request, spelled the way the booking form submits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightQuery {
    pub airline: Airline,
    pub source_city: City,
    pub departure_time: TimeSlot,
    pub stops: Stops,
    pub arrival_time: TimeSlot,
    pub destination_city: City,
    pub class: CabinClass,
    pub departure_date: NaiveDate,
}

pub const DAYS_LEFT: &str = "days_left";

/// Length of the encoded feature vector.
pub const FEATURE_COUNT: usize = 6 + 6 + 6 + 3 + 6 + 6 + 2 + 1;

fn blocks() -> [(&'static str, &'static [&'static str]); 7] {
    [
        ("airline", Airline::NAMES),
        ("source_city", City::NAMES),
        ("departure_time", TimeSlot::NAMES),
        ("stops", Stops::NAMES),
        ("arrival_time", TimeSlot::NAMES),
        ("destination_city", City::NAMES),
        ("class", CabinClass::NAMES),
    ]
}

/// Ordered feature names, `field=value` for the one-hot columns followed by
/// `days_left`. Artifacts must carry exactly this list.
pub fn feature_names() -> Vec<String> {
    let mut names: Vec<String> = blocks()
        .iter()
        .flat_map(|(field, values)| values.iter().map(move |value| format!("{}={}", field, value)))
        .collect();
    names.push(DAYS_LEFT.to_string());
    names
}

pub fn feature_index(name: &str) -> Option<usize> {
    feature_names().iter().position(|n| n == name)
}

/// Encode a query into the model's input vector. `as_of` is the day the
/// booking is made; `days_left` counts from it.
pub fn encode(query: &FlightQuery, as_of: NaiveDate) -> Result<Vec<f64>, PredictError> {
    if query.source_city == query.destination_city {
        return Err(PredictError::SameCity(query.source_city.to_string()));
    }

    let days_left = (query.departure_date - as_of).num_days();
    if days_left < 0 {
        return Err(PredictError::DepartureInPast {
            departure: query.departure_date,
            as_of,
        });
    }

    let hot = [
        query.airline.index(),
        query.source_city.index(),
        query.departure_time.index(),
        query.stops.index(),
        query.arrival_time.index(),
        query.destination_city.index(),
        query.class.index(),
    ];

    let mut features = Vec::with_capacity(FEATURE_COUNT);
    for ((_, values), hot) in blocks().iter().zip(hot) {
        features.extend((0..values.len()).map(|i| if i == hot { 1.0 } else { 0.0 }));
    }
    features.push(days_left as f64);

    Ok(features)
}

#[cfg(test)]
pub(crate) fn sample_query(departure_date: NaiveDate) -> FlightQuery {
    FlightQuery {
        airline: Airline::Vistara,
        source_city: City::Delhi,
        departure_time: TimeSlot::Morning,
        stops: Stops::One,
        arrival_time: TimeSlot::Evening,
        destination_city: City::Mumbai,
        class: CabinClass::Economy,
        departure_date,
    }
}
