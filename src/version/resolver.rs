use super::AgentSpecVersion;
use crate::component::Component;
use crate::error::VersionError;
use ahash::{AHashMap, AHashSet};

/// The component that determines one side of a [`VersionBounds`] interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundingComponent {
    pub id: String,
    pub name: String,
}

impl BoundingComponent {
    fn of(component: &Component) -> Self {
        Self {
            id: component.id().to_string(),
            name: component.name().to_string(),
        }
    }
}

/// Inclusive range of format versions a component and everything it references support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBounds {
    pub min: AgentSpecVersion,
    pub min_component: BoundingComponent,
    pub max: AgentSpecVersion,
    pub max_component: BoundingComponent,
}

impl VersionBounds {
    fn own(component: &Component, apply_min_pin: bool) -> Result<Self, VersionError> {
        let (min, max) = component.own_version_bounds(apply_min_pin);
        if min > max {
            return Err(VersionError::InvalidComponentBounds {
                component: component.name().to_string(),
                min,
                max,
            });
        }
        let bounding = BoundingComponent::of(component);
        Ok(Self {
            min,
            min_component: bounding.clone(),
            max,
            max_component: bounding,
        })
    }

    /// Narrows these bounds with those of a referenced component. Ties keep the outer component.
    fn absorb(&mut self, other: &VersionBounds) {
        if other.min > self.min {
            self.min = other.min;
            self.min_component = other.min_component.clone();
        }
        if other.max < self.max {
            self.max = other.max;
            self.max_component = other.max_component.clone();
        }
    }

    pub fn contains(&self, version: AgentSpecVersion) -> bool {
        self.min <= version && version <= self.max
    }

    /// Fails unless `version` lies within the bounds, naming the blocking component.
    pub fn check(&self, version: AgentSpecVersion) -> Result<(), VersionError> {
        if version < self.min {
            return Err(VersionError::BelowMinimum {
                requested: version,
                min: self.min,
                component: self.min_component.name.clone(),
                component_id: self.min_component.id.clone(),
            });
        }
        if version > self.max {
            return Err(VersionError::AboveMaximum {
                requested: version,
                max: self.max,
                component: self.max_component.name.clone(),
                component_id: self.max_component.id.clone(),
            });
        }
        Ok(())
    }
}

/// Computes the version bounds of `component` over its whole reference graph.
///
/// A component's minimum is the highest minimum found among itself and everything it references,
/// its maximum the lowest maximum. Each distinct component (by id) is visited once.
pub fn resolve_version_bounds(component: &Component) -> Result<VersionBounds, VersionError> {
    resolve(component, true)
}

/// Same as [`resolve_version_bounds`], ignoring pinned minimums. Used to check a declared version
/// before it gets pinned onto freshly loaded components.
pub(crate) fn resolve_intrinsic_bounds(
    component: &Component,
) -> Result<VersionBounds, VersionError> {
    resolve(component, false)
}

enum Frame {
    Enter(Component),
    Exit(Component),
}

fn resolve(root: &Component, apply_min_pin: bool) -> Result<VersionBounds, VersionError> {
    let mut memo: AHashMap<String, VersionBounds> = AHashMap::new();
    let mut in_progress: AHashSet<String> = AHashSet::new();
    let mut stack = vec![Frame::Enter(root.clone())];

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter(component) => {
                if memo.contains_key(component.id()) || !in_progress.insert(component.id().to_string()) {
                    continue;
                }
                let references = component.references();
                stack.push(Frame::Exit(component));
                stack.extend(
                    references
                        .into_iter()
                        .filter(|child| !memo.contains_key(child.id()))
                        .map(Frame::Enter),
                );
            }
            Frame::Exit(component) => {
                let mut bounds = VersionBounds::own(&component, apply_min_pin)?;
                for child in component.references() {
                    // A child still in progress closes a reference cycle; its bounds reach the
                    // root through the component that first entered it.
                    if let Some(child_bounds) = memo.get(child.id()) {
                        bounds.absorb(child_bounds);
                    }
                }
                in_progress.remove(component.id());
                memo.insert(component.id().to_string(), bounds);
            }
        }
    }

    let bounds = match memo.remove(root.id()) {
        Some(bounds) => bounds,
        None => VersionBounds::own(root, apply_min_pin)?,
    };
    if bounds.min > bounds.max {
        return Err(VersionError::IncompatibleBounds {
            min: bounds.min,
            min_component: bounds.min_component.name,
            min_component_id: bounds.min_component.id,
            max: bounds.max,
            max_component: bounds.max_component.name,
            max_component_id: bounds.max_component.id,
        });
    }
    tracing::debug!(
        component = root.id(),
        min = %bounds.min,
        max = %bounds.max,
        visited = memo.len() + 1,
        "resolved version bounds"
    );
    Ok(bounds)
}
