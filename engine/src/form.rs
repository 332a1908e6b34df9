//! Form input fields and keyboard focus.

use devlens_types::{FieldSpec, FormField, ServiceVariant, ui::DraftInput};

/// Keyboard focus target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Field(FormField),
    Submit,
    /// The `[ Edit ]` control (button trigger only).
    EditButton,
    /// The result text, or the editor while editing.
    Result,
}

/// Text the reviewer has typed into the variant's fields.
#[derive(Debug, Clone, Default)]
pub struct Form {
    variant: ServiceVariant,
    primary: DraftInput,
    secondary: DraftInput,
    instruction: DraftInput,
}

impl Form {
    #[must_use]
    pub fn new(variant: ServiceVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn variant(&self) -> ServiceVariant {
        self.variant
    }

    #[must_use]
    pub fn fields(&self) -> &'static [FormField] {
        self.variant.fields()
    }

    #[must_use]
    pub fn spec(&self, field: FormField) -> FieldSpec {
        self.variant.field_spec(field)
    }

    #[must_use]
    pub fn field(&self, field: FormField) -> &DraftInput {
        match field {
            FormField::Primary => &self.primary,
            FormField::Secondary => &self.secondary,
            FormField::Instruction => &self.instruction,
        }
    }

    pub fn field_mut(&mut self, field: FormField) -> &mut DraftInput {
        match field {
            FormField::Primary => &mut self.primary,
            FormField::Secondary => &mut self.secondary,
            FormField::Instruction => &mut self.instruction,
        }
    }

    #[must_use]
    pub fn primary_text(&self) -> &str {
        self.primary.text()
    }

    /// Raw field contents for a submission. Fields the variant lacks are `None`.
    #[must_use]
    pub fn submission_fields(&self) -> (&str, Option<&str>, Option<&str>) {
        (
            self.primary.text(),
            self.optional_text(FormField::Secondary),
            self.optional_text(FormField::Instruction),
        )
    }

    fn optional_text(&self, field: FormField) -> Option<&str> {
        if self.variant.has_field(field) {
            Some(self.field(field).text())
        } else {
            None
        }
    }
}
