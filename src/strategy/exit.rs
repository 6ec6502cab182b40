use serde::{Deserialize, Serialize};
use std::fmt;

//direction a strategy currently favours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    pub fn is_up(&self) -> bool {
        *self == Trend::Up
    }
}

//what an exit rule gets to look at for an open position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitView {
    pub long: bool,
    pub entry_price: f64,
    pub close: f64,
    //none when the strategy sees no clear direction this bar
    pub trend: Option<Trend>,
}

//pluggable close condition for an open position
pub trait ExitRule: Send + fmt::Debug {
    fn name(&self) -> &str;
    fn should_exit(&self, view: &ExitView) -> bool;
}

//exit once the trend points against the position
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendReversal;

impl ExitRule for TrendReversal {
    fn name(&self) -> &str {
        "trend reversal"
    }

    fn should_exit(&self, view: &ExitView) -> bool {
        match view.trend {
            Some(trend) => trend.is_up() != view.long,
            None => false,
        }
    }
}

//exit once price has moved `distance` away from entry, in either direction
#[derive(Debug, Clone, Copy)]
pub struct PriceDistance {
    pub distance: f64,
}

impl ExitRule for PriceDistance {
    fn name(&self) -> &str {
        "price distance"
    }

    fn should_exit(&self, view: &ExitView) -> bool {
        (view.close - view.entry_price).abs() >= self.distance
    }
}

//never exit; the position runs to the end of data
#[derive(Debug, Clone, Copy, Default)]
pub struct Hold;

impl ExitRule for Hold {
    fn name(&self) -> &str {
        "hold"
    }

    fn should_exit(&self, _view: &ExitView) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ExitConfig {
    TrendReversal,
    PriceDistance { distance: f64 },
    Hold,
}

impl ExitConfig {
    pub fn build(&self) -> Box<dyn ExitRule> {
        match *self {
            ExitConfig::TrendReversal => Box::new(TrendReversal),
            ExitConfig::PriceDistance { distance } => Box::new(PriceDistance { distance }),
            ExitConfig::Hold => Box::new(Hold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(long: bool, entry: f64, close: f64, trend: Option<Trend>) -> ExitView {
        ExitView {
            long,
            entry_price: entry,
            close,
            trend,
        }
    }

    #[test]
    fn trend_reversal_needs_an_opposite_trend() {
        let rule = TrendReversal;
        assert!(!rule.should_exit(&view(true, 1.0, 1.0, Some(Trend::Up))));
        assert!(!rule.should_exit(&view(true, 1.0, 1.0, None)));
        assert!(rule.should_exit(&view(true, 1.0, 1.0, Some(Trend::Down))));
        assert!(rule.should_exit(&view(false, 1.0, 1.0, Some(Trend::Up))));
    }

    #[test]
    fn price_distance_is_symmetric() {
        let rule = ExitConfig::PriceDistance { distance: 0.01 }.build();
        assert!(!rule.should_exit(&view(true, 1.10, 1.105, None)));
        assert!(rule.should_exit(&view(true, 1.10, 1.11, None)));
        assert!(rule.should_exit(&view(false, 1.10, 1.09, None)));
    }

    #[test]
    fn config_round_trips_through_json() {
        let json = r#"{"rule":"price_distance","distance":0.03}"#;
        let config: ExitConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config, ExitConfig::PriceDistance { distance: 0.03 });
        assert_eq!(config.build().name(), "price distance");
    }
}
