//! Type descriptors: the schema metadata driving validated construction.
//!
//! A [`TypeDescriptor`] describes one constructible type: its ordered
//! fields, its construction form (default or creator-based), whether it is
//! validated, and the object- and creator-level constraints declared on it.
//! Descriptors are immutable once built and shared behind `Arc`.

mod construction;
mod field;

pub use construction::{
    Construction, ConstructorError, CreatorFn, ScalarConstruction, ScalarFn, SeedFn,
};
pub use field::{FieldDescriptor, FieldKind};

use indexmap::IndexMap;

use crate::rules::{CreatorConstraint, ObjectConstraint};

/// The marker that puts a type under validation, with optional per-type
/// overrides of the synthetic `Required` and `ValidInput` message
/// templates.
#[derive(Debug, Clone, Default)]
pub struct ValidatedMarker {
    pub required_message: Option<String>,
    pub valid_input_message: Option<String>,
}

impl ValidatedMarker {
    /// A marker with the default messages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the synthetic `Required` message template.
    pub fn required_message(mut self, template: impl Into<String>) -> Self {
        self.required_message = Some(template.into());
        self
    }

    /// Overrides the synthetic `ValidInput` message template.
    pub fn valid_input_message(mut self, template: impl Into<String>) -> Self {
        self.valid_input_message = Some(template.into());
        self
    }
}

/// Schema metadata for one constructible type.
///
/// # Example
///
/// ```rust
/// use inquest::{Constraint, Construction, FieldDescriptor, FieldKind, TypeDescriptor};
///
/// let point = TypeDescriptor::builder("Point")
///     .field(FieldDescriptor::new("x", FieldKind::Int).constraint(Constraint::not_null()))
///     .field(FieldDescriptor::new("y", FieldKind::Int).constraint(Constraint::not_null()))
///     .construction(Construction::creator_to_map(["x".to_string(), "y".to_string()]))
///     .validated()
///     .build()
///     .unwrap();
/// assert_eq!(point.type_name(), "Point");
/// ```
#[derive(Debug)]
pub struct TypeDescriptor {
    type_name: String,
    fields: IndexMap<String, FieldDescriptor>,
    construction: Construction,
    scalar: Option<ScalarConstruction>,
    validated: Option<ValidatedMarker>,
    object_constraints: Vec<ObjectConstraint>,
    creator_constraints: Vec<CreatorConstraint>,
}

impl TypeDescriptor {
    /// Starts building a descriptor for the named type.
    pub fn builder(type_name: impl Into<String>) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder {
            type_name: type_name.into(),
            fields: IndexMap::new(),
            construction: Construction::default_form(),
            scalar: None,
            validated: None,
            object_constraints: Vec::new(),
            creator_constraints: Vec::new(),
        }
    }

    /// The type's name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The declared fields, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    /// Looks up a field by wire name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// The construction form.
    pub fn construction(&self) -> &Construction {
        &self.construction
    }

    /// The scalar construction form, if the type accepts scalar input.
    pub fn scalar(&self) -> Option<&ScalarConstruction> {
        self.scalar.as_ref()
    }

    /// The validation marker, if the type is validated.
    pub fn validated(&self) -> Option<&ValidatedMarker> {
        self.validated.as_ref()
    }

    /// Object-level constraints.
    pub fn object_constraints(&self) -> &[ObjectConstraint] {
        &self.object_constraints
    }

    /// Creator-group constraints.
    pub fn creator_constraints(&self) -> &[CreatorConstraint] {
        &self.creator_constraints
    }

    /// The field backing the creator parameter at `index`, if any.
    pub fn creator_field(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields
            .values()
            .find(|f| f.creator_index == Some(index))
    }

    /// Names of object types referenced by fields, for registry
    /// reference checking.
    pub fn referenced_types(&self) -> Vec<String> {
        fn collect(kind: &FieldKind, into: &mut Vec<String>) {
            match kind {
                FieldKind::Object(name) => into.push(name.clone()),
                FieldKind::Array(inner) | FieldKind::Map(inner) => collect(inner, into),
                _ => {}
            }
        }
        let mut refs = Vec::new();
        for field in self.fields.values() {
            collect(&field.kind, &mut refs);
        }
        refs
    }
}

/// Errors raised while assembling a [`TypeDescriptor`].
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// A field with the same wire name was declared twice.
    #[error("field '{field}' declared twice on type '{type_name}'")]
    DuplicateField { type_name: String, field: String },

    /// A creator parameter does not correspond to any declared field.
    #[error("creator parameter '{param}' has no matching field on type '{type_name}'")]
    UnknownCreatorParameter { type_name: String, param: String },
}

/// Consuming builder for [`TypeDescriptor`].
pub struct TypeDescriptorBuilder {
    type_name: String,
    fields: IndexMap<String, FieldDescriptor>,
    construction: Construction,
    scalar: Option<ScalarConstruction>,
    validated: Option<ValidatedMarker>,
    object_constraints: Vec<ObjectConstraint>,
    creator_constraints: Vec<CreatorConstraint>,
}

impl TypeDescriptorBuilder {
    /// Declares a field. Declaration order is preserved and determines
    /// reporting order for absent-field violations.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Sets the construction form.
    pub fn construction(mut self, construction: Construction) -> Self {
        self.construction = construction;
        self
    }

    /// Sets the scalar construction form.
    pub fn scalar(mut self, scalar: ScalarConstruction) -> Self {
        self.scalar = Some(scalar);
        self
    }

    /// Marks the type as validated with default messages.
    pub fn validated(mut self) -> Self {
        self.validated = Some(ValidatedMarker::default());
        self
    }

    /// Marks the type as validated with the given marker.
    pub fn validated_with(mut self, marker: ValidatedMarker) -> Self {
        self.validated = Some(marker);
        self
    }

    /// Declares an object-level constraint.
    pub fn object_constraint(mut self, constraint: ObjectConstraint) -> Self {
        self.object_constraints.push(constraint);
        self
    }

    /// Declares a creator-group constraint.
    pub fn creator_constraint(mut self, constraint: CreatorConstraint) -> Self {
        self.creator_constraints.push(constraint);
        self
    }

    /// Finishes the descriptor, assigning creator indexes to parameter
    /// fields and checking that every parameter names a declared field.
    pub fn build(mut self) -> Result<TypeDescriptor, DescriptorError> {
        let params: Vec<String> = self.construction.params().to_vec();
        for (index, param) in params.iter().enumerate() {
            match self.fields.get_mut(param) {
                Some(field) => field.creator_index = Some(index),
                None => {
                    return Err(DescriptorError::UnknownCreatorParameter {
                        type_name: self.type_name,
                        param: param.clone(),
                    })
                }
            }
        }

        Ok(TypeDescriptor {
            type_name: self.type_name,
            fields: self.fields,
            construction: self.construction,
            scalar: self.scalar,
            validated: self.validated,
            object_constraints: self.object_constraints,
            creator_constraints: self.creator_constraints,
        })
    }
}
