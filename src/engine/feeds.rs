use crate::config::RunConfig;
use crate::data::{Bar, BarSeries, DataError, Resampler, TimeFrame};
use indexmap::IndexMap;

//a named bar stream; resampled feeds carry the resampler that builds them
#[derive(Debug, Clone)]
pub struct Feed {
    timeframe: TimeFrame,
    series: BarSeries,
    resampler: Option<Resampler>,
}

impl Feed {
    pub fn timeframe(&self) -> TimeFrame {
        self.timeframe
    }

    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    pub fn is_resampled(&self) -> bool {
        self.resampler.is_some()
    }
}

//every feed of a run keyed by name; the primary feed is always first
#[derive(Debug, Clone)]
pub struct Feeds {
    feeds: IndexMap<String, Feed>,
}

pub(crate) const PRIMARY: usize = 0;

impl Feeds {
    pub fn from_config(config: &RunConfig) -> Self {
        let mut feeds = IndexMap::with_capacity(config.resample.len() + 1);

        feeds.insert(
            config.primary.name.clone(),
            Feed {
                timeframe: config.primary.timeframe,
                series: BarSeries::new(),
                resampler: None,
            },
        );

        for rule in &config.resample {
            feeds.insert(
                rule.name.clone(),
                Feed {
                    timeframe: rule.timeframe,
                    series: BarSeries::new(),
                    resampler: Some(Resampler::new(rule.timeframe)),
                },
            );
        }

        Feeds { feeds }
    }

    pub fn primary_name(&self) -> &str {
        self.feeds
            .get_index(PRIMARY)
            .map(|(name, _)| name.as_str())
            .unwrap_or_default()
    }

    pub fn primary(&self) -> &BarSeries {
        &self.feeds[PRIMARY].series
    }

    pub fn get(&self, name: &str) -> Option<&Feed> {
        self.feeds.get(name)
    }

    pub fn series(&self, name: &str) -> Option<&BarSeries> {
        self.feeds.get(name).map(|feed| &feed.series)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.feeds.get_index_of(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.feeds.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    //every feed has at least one completed bar
    pub fn all_ready(&self) -> bool {
        self.feeds.values().all(|feed| !feed.series.is_empty())
    }

    //appends a primary bar and runs it through every resampler
    //returns (feed index, bar) for each bar appended this tick, primary first
    pub(crate) fn push_primary(&mut self, bar: Bar) -> Result<Vec<(usize, Bar)>, DataError> {
        let mut emitted = Vec::with_capacity(self.feeds.len());

        self.feeds[PRIMARY].series.append(bar.clone())?;

        for (index, (_, feed)) in self.feeds.iter_mut().enumerate().skip(1) {
            let Some(resampler) = feed.resampler.as_mut() else {
                continue;
            };

            if let Some(closed) = resampler.push(&bar) {
                feed.series.append(closed.clone())?;
                emitted.push((index, closed));
            }
        }

        emitted.insert(0, (PRIMARY, bar));
        Ok(emitted)
    }

    //emits every partially built coarse bar at end of data
    pub(crate) fn flush(&mut self) -> Result<Vec<(usize, Bar)>, DataError> {
        let mut emitted = Vec::new();

        for (index, (_, feed)) in self.feeds.iter_mut().enumerate() {
            let Some(resampler) = feed.resampler.as_mut() else {
                continue;
            };

            if let Some(partial) = resampler.flush() {
                feed.series.append(partial.clone())?;
                emitted.push((index, partial));
            }
        }

        Ok(emitted)
    }
}
