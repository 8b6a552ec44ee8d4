//! Label reconciliation: compute the add/remove plan that moves an item's
//! current labels to the desired ones, then apply it through Plex.
use anyhow::Result;
use tracing::debug;

use crate::completion::CompletionStatus;
use crate::plex::{LabelTarget, PlexApi};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelPlan {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

impl LabelPlan {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// The label set after applying this plan to `current`.
    pub fn applied_to(&self, current: &[String]) -> Vec<String> {
        let mut out: Vec<String> = current
            .iter()
            .filter(|l| !self.remove.contains(l))
            .cloned()
            .collect();
        for label in &self.add {
            if !out.contains(label) {
                out.push(label.clone());
            }
        }
        out
    }
}

/// Keeps exactly `target` among the status labels. Legacy casings
/// (`complete`, `inprogress`) count as stale.
pub fn plan_status(current: &[String], target: CompletionStatus) -> LabelPlan {
    let wanted = target.label();
    let mut plan = LabelPlan::default();
    for label in current {
        let is_status = CompletionStatus::ALL
            .iter()
            .any(|s| s.label().eq_ignore_ascii_case(label));
        if is_status && label != wanted && !plan.remove.contains(label) {
            plan.remove.push(label.clone());
        }
    }
    if !current.iter().any(|l| l == wanted) {
        plan.add.push(wanted.to_string());
    }
    plan
}

/// Adds allow-listed tracker tags that are not on the item yet. Never removes.
pub fn plan_synced_tags(current: &[String], tracker_tags: &[String], allow_list: &[String]) -> LabelPlan {
    let mut plan = LabelPlan::default();
    for tag in tracker_tags {
        let tag = tag.trim();
        if tag.is_empty() || !allow_list.iter().any(|a| a.eq_ignore_ascii_case(tag)) {
            continue;
        }
        let present = current
            .iter()
            .chain(plan.add.iter())
            .any(|l| l.eq_ignore_ascii_case(tag));
        if !present {
            plan.add.push(tag.to_string());
        }
    }
    plan
}

/// Makes the labels starting with `prefix` (case-insensitive) equal `desired`.
pub fn plan_prefixed(current: &[String], prefix: &str, desired: &[String]) -> LabelPlan {
    let prefix = prefix.to_ascii_lowercase();
    let mut plan = LabelPlan::default();
    for label in current {
        let owned = label.to_ascii_lowercase().starts_with(&prefix);
        if owned && !desired.contains(label) && !plan.remove.contains(label) {
            plan.remove.push(label.clone());
        }
    }
    for label in desired {
        if !current.contains(label) && !plan.add.contains(label) {
            plan.add.push(label.clone());
        }
    }
    plan
}

/// Applies `plan` to an item currently carrying `current` and returns the
/// resulting labels. Removals go out one by one; additions are written as the
/// full label set in one edit, since Plex replaces the list on every set.
pub async fn apply_plan(
    plex: &dyn PlexApi,
    target: &LabelTarget,
    current: &[String],
    plan: &LabelPlan,
) -> Result<Vec<String>> {
    let after = plan.applied_to(current);
    for label in &plan.remove {
        debug!("Removing label '{}' from '{}'", label, target.display);
        plex.remove_label(target, label).await?;
    }
    if !plan.add.is_empty() {
        debug!("Setting labels {:?} on '{}'", after, target.display);
        plex.set_labels(target, &after).await?;
    }
    Ok(after)
}
