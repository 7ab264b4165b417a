use crate::core::component::{prefixed_id, ComponentHandle};
use crate::core::error::AppError;
use crate::core::types::{ErrorCategory, Role};
use std::hash::{Hash, Hasher};

/// Reference to the component a dependency binds to. Literal ids come from
/// layout declarations; handles come from component instances declared as
/// variables before the tree is rendered.
#[derive(Clone, Debug)]
pub enum ComponentRef {
    Literal(String),
    Handle(ComponentHandle),
}

impl ComponentRef {
    /// The resolved literal id. Handle-backed refs read the instance's
    /// generated id, which is fixed from blueprint collection onwards.
    pub fn component_id(&self) -> String {
        match self {
            ComponentRef::Literal(id) => id.clone(),
            ComponentRef::Handle(handle) => handle.rendered_id(),
        }
    }

    pub(crate) fn apply_prefix(&mut self, prefix: &str) {
        match self {
            ComponentRef::Literal(id) => *id = prefixed_id(prefix, id),
            ComponentRef::Handle(handle) => handle.apply_prefix(prefix),
        }
    }
}

impl From<&str> for ComponentRef {
    fn from(id: &str) -> Self {
        ComponentRef::Literal(id.to_string())
    }
}

impl From<String> for ComponentRef {
    fn from(id: String) -> Self {
        ComponentRef::Literal(id)
    }
}

impl From<ComponentHandle> for ComponentRef {
    fn from(handle: ComponentHandle) -> Self {
        ComponentRef::Handle(handle)
    }
}

impl From<&ComponentHandle> for ComponentRef {
    fn from(handle: &ComponentHandle) -> Self {
        ComponentRef::Handle(handle.clone())
    }
}

/// One declared binding to a component property, tagged with its role.
#[derive(Clone, Debug)]
pub struct DependencySpec {
    component_ref: ComponentRef,
    property_name: String,
    role: Role,
    serverside: bool,
}

impl DependencySpec {
    fn new<C: Into<ComponentRef>, P: Into<String>>(component: C, property: P, role: Role) -> Self {
        let component_ref = component.into();
        if let ComponentRef::Handle(handle) = &component_ref {
            // Instance ids are fixed at collection time so later comparisons
            // and hashing see one stable id.
            handle.ensure_id();
        }
        DependencySpec {
            component_ref,
            property_name: property.into(),
            role,
            serverside: false,
        }
    }

    pub fn component_id(&self) -> String {
        self.component_ref.component_id()
    }

    pub fn component_ref(&self) -> &ComponentRef {
        &self.component_ref
    }

    pub fn property(&self) -> &str {
        &self.property_name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether this Output's value is kept server-side and transported as a
    /// token. Transport detail only; excluded from equality and hashing.
    pub fn is_serverside(&self) -> bool {
        self.serverside
    }

    /// `(component_id, property)` pair identifying the bound slot.
    pub fn target(&self) -> (String, String) {
        (self.component_id(), self.property_name.clone())
    }

    pub(crate) fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub(crate) fn redirect_to<C: Into<ComponentRef>, P: Into<String>>(
        &mut self,
        component: C,
        property: P,
    ) {
        self.component_ref = component.into();
        self.property_name = property.into();
    }

    pub(crate) fn apply_prefix(&mut self, prefix: &str) {
        self.component_ref.apply_prefix(prefix);
    }

    pub(crate) fn validate(&self) -> Result<(), AppError> {
        if self.component_id().is_empty() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                format!("dependency on property '{}' has an empty component id", self.property_name),
            )
            .with_code("CBK-SPEC-001"));
        }
        if self.property_name.is_empty() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                format!(
                    "dependency on component '{}' has an empty property name",
                    self.component_id()
                ),
            )
            .with_code("CBK-SPEC-001"));
        }
        Ok(())
    }
}

impl PartialEq for DependencySpec {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role
            && self.property_name == other.property_name
            && self.component_id() == other.component_id()
    }
}

impl Eq for DependencySpec {}

impl Hash for DependencySpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.component_id().hash(state);
        self.property_name.hash(state);
        self.role.hash(state);
    }
}

impl std::fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}.{})", self.role, self.component_id(), self.property_name)
    }
}

/// Bind a component property as a callback output.
pub fn output<C: Into<ComponentRef>, P: Into<String>>(component: C, property: P) -> DependencySpec {
    DependencySpec::new(component, property, Role::Output)
}

/// Bind a component property as a firing input.
pub fn input<C: Into<ComponentRef>, P: Into<String>>(component: C, property: P) -> DependencySpec {
    DependencySpec::new(component, property, Role::Input)
}

/// Bind a component property as read-only state.
pub fn state<C: Into<ComponentRef>, P: Into<String>>(component: C, property: P) -> DependencySpec {
    DependencySpec::new(component, property, Role::State)
}

/// Bind a component property as a pure trigger: it fires the callback but its
/// value never reaches the handler.
pub fn trigger<C: Into<ComponentRef>, P: Into<String>>(component: C, property: P) -> DependencySpec {
    DependencySpec::new(component, property, Role::Trigger)
}

/// Output whose value stays server-side; the client only ever sees a token.
pub fn serverside_output<C: Into<ComponentRef>, P: Into<String>>(
    component: C,
    property: P,
) -> DependencySpec {
    let mut spec = DependencySpec::new(component, property, Role::Output);
    spec.serverside = true;
    spec
}

/// One positional argument of a callback declaration: a single spec or a list
/// of specs. Declarations mix both freely; collection flattens them.
pub enum DependencyItem {
    One(DependencySpec),
    Many(Vec<DependencySpec>),
}

impl DependencyItem {
    pub fn into_specs(self) -> Vec<DependencySpec> {
        match self {
            DependencyItem::One(spec) => vec![spec],
            DependencyItem::Many(specs) => specs,
        }
    }
}

impl From<DependencySpec> for DependencyItem {
    fn from(spec: DependencySpec) -> Self {
        DependencyItem::One(spec)
    }
}

impl From<Vec<DependencySpec>> for DependencyItem {
    fn from(specs: Vec<DependencySpec>) -> Self {
        DependencyItem::Many(specs)
    }
}
