//! Dirty tracking against the last successfully persisted slice per step.

use std::collections::BTreeMap;

use crate::models::{PlanDocument, StepId, StepSlice};

/// Remembers what each step looked like at its last successful sync.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    baselines: BTreeMap<StepId, StepSlice>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `step`'s current slice differs from its baseline. A step that
    /// has never been synced is always changed.
    pub fn has_changed(&self, step: StepId, document: &PlanDocument) -> bool {
        self.slice_changed(&document.slice(step))
    }

    /// Same comparison for a detached slice.
    pub fn slice_changed(&self, slice: &StepSlice) -> bool {
        self.baselines.get(&slice.step()) != Some(slice)
    }

    /// Moves `slice`'s step baseline after a successful persist.
    pub fn record_synced(&mut self, slice: StepSlice) {
        self.baselines.insert(slice.step(), slice);
    }

    pub fn baseline(&self, step: StepId) -> Option<&StepSlice> {
        self.baselines.get(&step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Duration, ItineraryStop};

    fn document() -> PlanDocument {
        let mut doc = PlanDocument::default();
        doc.basics.title = Some("City Walk".to_string());
        doc.itinerary.duration = Some(Duration::hours(2));
        doc
    }

    #[test]
    fn test_never_synced_is_changed() {
        let tracker = DirtyTracker::new();
        for step in StepId::ALL {
            assert!(tracker.has_changed(step, &document()));
        }
    }

    #[test]
    fn test_unchanged_after_record() {
        let doc = document();
        let mut tracker = DirtyTracker::new();
        tracker.record_synced(doc.slice(StepId::Basics));
        assert!(!tracker.has_changed(StepId::Basics, &doc));
        assert!(tracker.has_changed(StepId::Itinerary, &doc));
    }

    #[test]
    fn test_any_field_change_is_detected() {
        let mut doc = document();
        let mut tracker = DirtyTracker::new();
        tracker.record_synced(doc.slice(StepId::Itinerary));

        doc.itinerary
            .days
            .insert("day1".to_string(), vec![ItineraryStop::new("Bazaar")]);
        assert!(tracker.has_changed(StepId::Itinerary, &doc));

        tracker.record_synced(doc.slice(StepId::Itinerary));
        doc.itinerary.days.get_mut("day1").unwrap()[0].location = Some("Johari".to_string());
        assert!(tracker.has_changed(StepId::Itinerary, &doc));
    }

    #[test]
    fn test_other_steps_do_not_affect_baseline() {
        let mut doc = document();
        let mut tracker = DirtyTracker::new();
        tracker.record_synced(doc.slice(StepId::Basics));
        doc.pricing.base_price = Some(10.0);
        assert!(!tracker.has_changed(StepId::Basics, &doc));
    }
}
