//! Creation forms that are open across requests.

use std::collections::{HashMap, VecDeque};

use tracing::debug;
use uuid::Uuid;

use spotsaver_store::SpotForm;

pub const MAX_OPEN_FORMS: usize = 100;

/// Open forms by id. Once full, opening another form cancels and drops the
/// oldest one.
#[derive(Debug)]
pub struct FormRegistry {
    forms: HashMap<Uuid, SpotForm>,
    order: VecDeque<Uuid>,
    capacity: usize,
}

impl Default for FormRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::with_capacity(MAX_OPEN_FORMS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            forms: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Returns the id of the form evicted to make room, if any.
    pub fn insert(&mut self, id: Uuid, form: SpotForm) -> Option<Uuid> {
        let mut evicted = None;
        if self.forms.len() >= self.capacity {
            while let Some(oldest) = self.order.pop_front() {
                if let Some(mut stale) = self.forms.remove(&oldest) {
                    stale.cancel();
                    debug!(form = %oldest, "Evicted oldest open form");
                    evicted = Some(oldest);
                    break;
                }
            }
        }

        self.order.push_back(id);
        self.forms.insert(id, form);
        evicted
    }

    pub fn get(&self, id: &Uuid) -> Option<&SpotForm> {
        self.forms.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut SpotForm> {
        self.forms.get_mut(id)
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<SpotForm> {
        let form = self.forms.remove(id)?;
        self.order.retain(|open| open != id);
        Some(form)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_registry_evicts_the_oldest_form() {
        let mut registry = FormRegistry::with_capacity(2);
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(registry.insert(a, SpotForm::new()), None);
        assert_eq!(registry.insert(b, SpotForm::new()), None);
        assert_eq!(registry.insert(c, SpotForm::new()), Some(a));

        assert_eq!(registry.len(), 2);
        assert!(registry.get(&a).is_none());
        assert!(registry.get(&b).is_some());
    }

    #[test]
    fn removed_forms_do_not_count_toward_eviction() {
        let mut registry = FormRegistry::with_capacity(2);
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        registry.insert(a, SpotForm::new());
        registry.insert(b, SpotForm::new());
        registry.remove(&a);

        assert_eq!(registry.insert(c, SpotForm::new()), None);
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&b).is_some());
    }
}
