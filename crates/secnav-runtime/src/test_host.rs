//! Minimal in-memory host for unit tests.

use secnav_core::{ObserverOptions, SectionId, TabBounds, TimerToken, VisibilityBatch};
use web_time::Duration;

use crate::feed::BatchSender;
use crate::host::{
    Location, MeasureError, ObserveError, ScrollBehavior, TabStrip, Timers, Viewport,
    VisibilityObserver,
};

#[derive(Debug, Default)]
pub(crate) struct TestHost {
    pub tops: Vec<(String, f64)>,
    pub offset: f64,
    pub fragment: Option<String>,
    pub pushes: Vec<String>,
    pub scrolls: Vec<(f64, ScrollBehavior)>,
    pub revealed: Vec<String>,
    pub observer_supported: bool,
    pub sender: Option<BatchSender>,
    pub disconnects: usize,
    pub next_token: u64,
    pub wakes: Vec<TimerToken>,
    pub cancelled: Vec<TimerToken>,
    pub detached: bool,
    pub tab_width: f64,
}

impl TestHost {
    /// Sections stacked back to back, each `height` tall.
    pub fn with_sections(ids: &[&str], height: f64) -> Self {
        Self {
            tops: ids
                .iter()
                .enumerate()
                .map(|(i, id)| ((*id).to_owned(), i as f64 * height))
                .collect(),
            observer_supported: true,
            tab_width: 80.0,
            ..Self::default()
        }
    }

    pub fn send(&self, batch: VisibilityBatch) -> bool {
        self.sender.as_ref().is_some_and(|tx| tx.send(batch))
    }

    pub fn sender_open(&self) -> bool {
        self.sender.as_ref().is_some_and(BatchSender::is_open)
    }

    /// Most recent wake-up that has not been cancelled.
    pub fn pending_wake(&self) -> Option<TimerToken> {
        self.wakes
            .iter()
            .rev()
            .find(|t| !self.cancelled.contains(*t))
            .copied()
    }
}

impl Viewport for TestHost {
    fn section_top(&self, id: &SectionId) -> Option<f64> {
        self.tops
            .iter()
            .find(|(k, _)| k == id.as_str())
            .map(|(_, top)| *top)
    }

    fn scroll_offset(&self) -> f64 {
        self.offset
    }

    fn scroll_to(&mut self, offset: f64, behavior: ScrollBehavior) {
        self.scrolls.push((offset, behavior));
    }
}

impl Location for TestHost {
    fn fragment(&self) -> Option<String> {
        self.fragment.clone()
    }

    fn replace_fragment(&mut self, id: &SectionId) {
        self.fragment = Some(id.to_string());
    }

    fn push_fragment(&mut self, id: &SectionId) {
        self.fragment = Some(id.to_string());
        self.pushes.push(id.to_string());
    }
}

impl TabStrip for TestHost {
    fn measure_tab(&self, id: &SectionId) -> Result<TabBounds, MeasureError> {
        if self.detached {
            return Err(MeasureError::Detached(id.clone()));
        }
        let index = self
            .tops
            .iter()
            .position(|(k, _)| k == id.as_str())
            .ok_or_else(|| MeasureError::Missing(id.clone()))?;
        Ok(TabBounds {
            left: 20.0 + index as f64 * self.tab_width,
            width: self.tab_width,
            strip_left: 20.0,
        })
    }

    fn reveal_tab(&mut self, id: &SectionId) {
        self.revealed.push(id.to_string());
    }
}

impl VisibilityObserver for TestHost {
    fn is_supported(&self) -> bool {
        self.observer_supported
    }

    fn connect(
        &mut self,
        _options: &ObserverOptions,
        sender: BatchSender,
    ) -> Result<(), ObserveError> {
        self.sender = Some(sender);
        Ok(())
    }

    fn observe(&mut self, id: &SectionId) -> Result<(), ObserveError> {
        if self.section_top(id).is_some() {
            Ok(())
        } else {
            Err(ObserveError::MissingElement(id.clone()))
        }
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
    }
}

impl Timers for TestHost {
    fn schedule_wake(&mut self, _after: Duration) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.wakes.push(token);
        token
    }

    fn cancel_wake(&mut self, token: TimerToken) {
        self.cancelled.push(token);
    }
}
