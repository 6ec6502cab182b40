use crate::data::Bar;
use crate::indicators::{Indicator, Line};
use crate::strategy::LineRef;

//registered indicators, each bound to the feed it consumes
#[derive(Default)]
pub struct IndicatorSet {
    entries: Vec<(usize, Box<dyn Indicator>)>,
}

impl IndicatorSet {
    pub fn new() -> Self {
        IndicatorSet::default()
    }

    //returns the index of the new indicator
    pub(crate) fn add(&mut self, feed: usize, indicator: Box<dyn Indicator>) -> usize {
        self.entries.push((feed, indicator));
        self.entries.len() - 1
    }

    //feeds a bar emitted by `feed` to every indicator attached to it
    pub(crate) fn update(&mut self, feed: usize, bar: &Bar) {
        for (source, indicator) in self.entries.iter_mut() {
            if *source == feed {
                indicator.update(bar);
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<&dyn Indicator> {
        self.entries
            .get(index)
            .map(|(_, indicator)| indicator.as_ref())
    }

    pub fn line(&self, line: LineRef) -> Option<&Line> {
        self.get(line.indicator)?.lines().get(line.line)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
