//! The dashboard's state container.
//!
//! All mutation goes through [`DashboardState::set_city`],
//! [`DashboardState::set_series`] and [`DashboardState::reset`]. Each change
//! of city code bumps a generation counter; surveillance results carry the
//! generation they were requested under and are dropped if it is stale.

use crate::analyzers::types::SurveillanceSeries;
use crate::services::CityIdentity;

/// City name shown before resolution completes.
pub const PLACEHOLDER_CITY: &str = "---";

/// Permission to deliver one surveillance result for `code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub code: String,
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    city_name: String,
    city_code: Option<String>,
    series: Option<SurveillanceSeries>,
    generation: u64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            city_name: PLACEHOLDER_CITY.to_string(),
            city_code: None,
            series: None,
            generation: 0,
        }
    }
}

impl DashboardState {
    pub fn city_name(&self) -> &str {
        &self.city_name
    }

    pub fn city_code(&self) -> Option<&str> {
        self.city_code.as_deref()
    }

    /// The last delivered series; `None` until a fetch succeeds.
    pub fn series(&self) -> Option<&SurveillanceSeries> {
        self.series.as_ref()
    }

    pub fn title(&self) -> String {
        format!(
            "Dengue nos últimos 90 dias em {}!",
            self.city_name.to_uppercase()
        )
    }

    /// Records a resolved city.
    ///
    /// Returns a ticket when the administrative code changed to a new,
    /// non-empty value; the caller is expected to fetch for it. Setting the
    /// same code again yields nothing.
    pub fn set_city(&mut self, city: CityIdentity) -> Option<FetchTicket> {
        self.city_name = city.name;

        let code = Some(city.code).filter(|c| !c.is_empty());
        if code == self.city_code {
            return None;
        }

        self.generation += 1;
        self.city_code = code;
        self.series = None;

        self.city_code.clone().map(|code| FetchTicket {
            code,
            generation: self.generation,
        })
    }

    /// Delivers a fetch result. `None` means the fetch was unsuccessful and
    /// leaves the dashboard blank.
    ///
    /// Returns `false`, without touching state, if `ticket` predates the
    /// current city.
    pub fn set_series(&mut self, ticket: &FetchTicket, series: Option<SurveillanceSeries>) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.series = series;
        true
    }

    /// Returns to the placeholder state, invalidating outstanding tickets.
    pub fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
    }
}
