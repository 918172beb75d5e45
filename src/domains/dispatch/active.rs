use std::collections::HashMap;
use std::sync::RwLock;

/// Process-wide authority for "which plan is active for this driver".
/// Activation must be a compare-and-swap against this one store; callers
/// never enforce the invariant with their own checks.
#[derive(Debug, Default)]
pub struct ActivePlanRegistry {
    inner: RwLock<HashMap<String, String>>,
}

impl ActivePlanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_plan(&self, driver_id: &str) -> Option<String> {
        self.inner
            .read()
            .expect("active plan registry poisoned")
            .get(driver_id)
            .cloned()
    }

    /// Swap the driver's active plan, but only if the current entry matches
    /// `expected`. On mismatch nothing changes and the caller sees the
    /// conflicting plan id.
    pub fn compare_and_activate(
        &self,
        driver_id: &str,
        expected: Option<&str>,
        plan_id: &str,
    ) -> Result<(), String> {
        let mut map = self.inner.write().expect("active plan registry poisoned");
        let current = map.get(driver_id).map(|s| s.as_str());
        if current != expected {
            return Err(format!(
                "driver {} already has active plan {}",
                driver_id,
                current.unwrap_or("<none>")
            ));
        }
        map.insert(driver_id.to_string(), plan_id.to_string());
        Ok(())
    }

    /// Clear the driver's entry, but only if it still points at `plan_id`.
    pub fn deactivate(&self, driver_id: &str, plan_id: &str) -> bool {
        let mut map = self.inner.write().expect("active plan registry poisoned");
        if map.get(driver_id).map(|s| s.as_str()) == Some(plan_id) {
            map.remove(driver_id);
            true
        } else {
            false
        }
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner
            .read()
            .expect("active plan registry poisoned")
            .clone()
    }
}
