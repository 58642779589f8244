use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// Meteorological season for a month, flipped for the southern hemisphere
    pub fn for_month(month: u32, northern: bool) -> Self {
        let north = match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        };

        if northern {
            north
        } else {
            match north {
                Season::Spring => Season::Fall,
                Season::Summer => Season::Winter,
                Season::Fall => Season::Spring,
                Season::Winter => Season::Summer,
            }
        }
    }

    /// Calendar months of this season, in order
    pub fn months(&self, northern: bool) -> [u32; 3] {
        match (self, northern) {
            (Season::Spring, true) | (Season::Fall, false) => [3, 4, 5],
            (Season::Summer, true) | (Season::Winter, false) => [6, 7, 8],
            (Season::Fall, true) | (Season::Spring, false) => [9, 10, 11],
            (Season::Winter, true) | (Season::Summer, false) => [12, 1, 2],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Climate requirements for a crop. Rainfall is mm per growing season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropProfile {
    pub name: &'static str,
    pub min_temp_c: f64,
    pub optimal_temp_c: f64,
    pub max_temp_c: f64,
    pub min_rainfall_mm: f64,
    pub max_rainfall_mm: f64,
    pub drought_tolerant: bool,
    pub frost_tolerant: bool,
    pub perennial: bool,
    pub seasons: &'static [Season],
}

impl CropProfile {
    pub fn in_season(&self, season: Season) -> bool {
        self.perennial || self.seasons.contains(&season)
    }

    pub fn season_label(&self) -> String {
        if self.perennial {
            return "Perennial".to_string();
        }
        self.seasons
            .iter()
            .map(Season::as_str)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Case-insensitive catalog lookup; spaces and dashes are ignored
    pub fn find(name: &str) -> Option<&'static CropProfile> {
        let wanted = normalize_name(name);
        CROP_CATALOG.iter().find(|c| normalize_name(c.name) == wanted)
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

const fn crop(
    name: &'static str,
    temps: (f64, f64, f64),
    rainfall: (f64, f64),
    drought_tolerant: bool,
    frost_tolerant: bool,
    seasons: &'static [Season],
) -> CropProfile {
    CropProfile {
        name,
        min_temp_c: temps.0,
        optimal_temp_c: temps.1,
        max_temp_c: temps.2,
        min_rainfall_mm: rainfall.0,
        max_rainfall_mm: rainfall.1,
        drought_tolerant,
        frost_tolerant,
        perennial: false,
        seasons,
    }
}

use Season::{Fall, Spring, Summer, Winter};

pub static CROP_CATALOG: [CropProfile; 15] = [
    crop("Corn", (10.0, 25.0, 35.0), (500.0, 1200.0), false, false, &[Summer]),
    crop("Wheat", (3.0, 20.0, 30.0), (350.0, 1000.0), true, true, &[Winter, Spring]),
    crop("Soybeans", (10.0, 27.0, 38.0), (450.0, 1200.0), false, false, &[Summer]),
    crop("Rice", (16.0, 30.0, 40.0), (900.0, 2500.0), false, false, &[Summer]),
    crop("Cotton", (15.0, 30.0, 40.0), (500.0, 1500.0), true, false, &[Summer]),
    crop("Potatoes", (7.0, 20.0, 30.0), (500.0, 1000.0), false, false, &[Spring, Summer]),
    crop("Tomatoes", (10.0, 25.0, 35.0), (400.0, 1000.0), false, false, &[Summer]),
    crop("Lettuce", (5.0, 18.0, 25.0), (300.0, 800.0), false, true, &[Spring, Fall]),
    crop("Carrots", (7.0, 18.0, 30.0), (300.0, 900.0), false, true, &[Spring, Fall]),
    crop("Barley", (4.0, 18.0, 30.0), (300.0, 1000.0), true, true, &[Spring, Winter]),
    crop("Oats", (4.0, 20.0, 32.0), (350.0, 1000.0), true, true, &[Spring]),
    crop("Sunflower", (8.0, 25.0, 35.0), (300.0, 1000.0), true, false, &[Summer]),
    CropProfile {
        perennial: true,
        ..crop("Alfalfa", (5.0, 25.0, 35.0), (400.0, 1200.0), true, true, &[])
    },
    crop("Sweet Corn", (10.0, 25.0, 35.0), (500.0, 1200.0), false, false, &[Summer]),
    crop("Peas", (5.0, 18.0, 24.0), (350.0, 800.0), false, true, &[Spring, Fall]),
];

/// Typical growing window by latitude band, as inclusive months.
/// Southern windows wrap past December (e.g. September to May).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GrowingSeason {
    pub start_month: u32,
    pub end_month: u32,
}

impl GrowingSeason {
    pub fn for_latitude(latitude: f64) -> Self {
        let abs_lat = latitude.abs();
        let (start_month, end_month) = if latitude > 0.0 {
            match abs_lat {
                l if l < 23.5 => (1, 12),
                l if l < 35.0 => (3, 11),
                l if l < 45.0 => (4, 10),
                l if l < 55.0 => (5, 9),
                _ => (6, 8),
            }
        } else {
            match abs_lat {
                l if l < 23.5 => (1, 12),
                l if l < 35.0 => (9, 5),
                l if l < 45.0 => (10, 4),
                l if l < 55.0 => (11, 3),
                _ => (12, 2),
            }
        };

        Self {
            start_month,
            end_month,
        }
    }

    pub fn contains(&self, month: u32) -> bool {
        if self.start_month <= self.end_month {
            (self.start_month..=self.end_month).contains(&month)
        } else {
            month >= self.start_month || month <= self.end_month
        }
    }

    pub fn is_year_round(&self) -> bool {
        self.start_month == 1 && self.end_month == 12
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seasons_flip_in_southern_hemisphere() {
        assert_eq!(Season::for_month(7, true), Season::Summer);
        assert_eq!(Season::for_month(7, false), Season::Winter);
        assert_eq!(Season::for_month(1, true), Season::Winter);
        assert_eq!(Season::for_month(1, false), Season::Summer);
        assert_eq!(Season::for_month(4, false), Season::Fall);
        assert_eq!(Season::for_month(10, true), Season::Fall);
    }

    #[test]
    fn season_months_follow_hemisphere() {
        assert_eq!(Season::Spring.months(true), [3, 4, 5]);
        assert_eq!(Season::Spring.months(false), [9, 10, 11]);
        assert_eq!(Season::Winter.months(true), [12, 1, 2]);
        for month in Season::Summer.months(false) {
            assert_eq!(Season::for_month(month, false), Season::Summer);
        }
    }

    #[test]
    fn catalog_lookup_is_forgiving() {
        assert_eq!(CropProfile::find("corn").map(|c| c.name), Some("Corn"));
        assert_eq!(
            CropProfile::find("sweet-corn").map(|c| c.name),
            Some("Sweet Corn")
        );
        assert_eq!(
            CropProfile::find("SweetCorn").map(|c| c.name),
            Some("Sweet Corn")
        );
        assert!(CropProfile::find("kale").is_none());
    }

    #[test]
    fn perennial_crops_are_always_in_season() {
        let alfalfa = CropProfile::find("Alfalfa").unwrap();
        assert!(alfalfa.perennial);
        for season in [Season::Spring, Season::Summer, Season::Fall, Season::Winter] {
            assert!(alfalfa.in_season(season));
        }
        assert_eq!(alfalfa.season_label(), "Perennial");

        let wheat = CropProfile::find("Wheat").unwrap();
        assert!(wheat.in_season(Season::Winter));
        assert!(!wheat.in_season(Season::Summer));
        assert_eq!(wheat.season_label(), "Winter/Spring");
    }

    #[test]
    fn catalog_bands_are_ordered() {
        for crop in CROP_CATALOG.iter() {
            assert!(crop.min_temp_c < crop.optimal_temp_c, "{}", crop.name);
            assert!(crop.optimal_temp_c < crop.max_temp_c, "{}", crop.name);
            assert!(crop.min_rainfall_mm < crop.max_rainfall_mm, "{}", crop.name);
            assert!(crop.perennial || !crop.seasons.is_empty(), "{}", crop.name);
        }
    }

    #[test]
    fn growing_season_by_latitude() {
        let tropical = GrowingSeason::for_latitude(10.0);
        assert!(tropical.is_year_round());

        let iowa = GrowingSeason::for_latitude(42.0);
        assert_eq!((iowa.start_month, iowa.end_month), (4, 10));
        assert!(iowa.contains(7));
        assert!(!iowa.contains(1));

        let cape_town = GrowingSeason::for_latitude(-33.9);
        assert_eq!((cape_town.start_month, cape_town.end_month), (9, 5));
        assert!(cape_town.contains(1));
        assert!(cape_town.contains(10));
        assert!(!cape_town.contains(7));
    }
}
