#![forbid(unsafe_code)]

//! Scoped navigator sessions.
//!
//! [`NavigatorSession`] pairs a navigator with its host and ties teardown to
//! scope: the navigator is mounted on construction and unmounted on drop, on
//! every exit path including unwinding. Pass `&mut Page` as `H` to borrow a
//! host instead of owning it.

use secnav_core::{NavEvent, SectionId};
use web_time::Duration;

use crate::host::Host;
use crate::navigator::SectionNavigator;

/// A mounted navigator bound to its host.
#[derive(Debug)]
pub struct NavigatorSession<H: Host> {
    navigator: SectionNavigator,
    host: H,
}

impl<H: Host> NavigatorSession<H> {
    /// Mount `navigator` on `host`.
    pub fn new(mut navigator: SectionNavigator, mut host: H, now: Duration) -> Self {
        navigator.mount(&mut host, now);
        Self { navigator, host }
    }

    /// See [`SectionNavigator::update`].
    pub fn update(&mut self, event: NavEvent, now: Duration) -> bool {
        self.navigator.update(event, &mut self.host, now)
    }

    /// See [`SectionNavigator::pump`].
    pub fn pump(&mut self, now: Duration) -> bool {
        self.navigator.pump(&mut self.host, now)
    }

    /// See [`SectionNavigator::activate`].
    pub fn activate(&mut self, id: &str, now: Duration) -> bool {
        self.navigator.activate(id, &mut self.host, now)
    }

    #[must_use]
    pub fn current_active_id(&self) -> Option<SectionId> {
        self.navigator.current_active_id()
    }

    #[must_use]
    pub fn navigator(&self) -> &SectionNavigator {
        &self.navigator
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: Host> Drop for NavigatorSession<H> {
    fn drop(&mut self) {
        self.navigator.unmount(&mut self.host);
    }
}
