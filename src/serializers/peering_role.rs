use crate::error::{FieldErrors, Result};
use crate::model::PeeringRole;
use crate::serializers::input::{is_valid_color, is_valid_slug, Input};
use crate::serializers::representation::{conflicts, FieldSource, Mapper};
use crate::store::Store;

const DEFAULT_COLOR: &str = "9e9e9e";

#[async_trait::async_trait]
impl Mapper for PeeringRole {
    const FIELDS: &'static [&'static str] = &["id", "url", "name", "slug", "color", "description"];
    const REQUIRED: &'static [&'static str] = &["name", "slug"];

    fn blank() -> Self {
        PeeringRole::new("", "", DEFAULT_COLOR)
    }

    fn map(&self) -> Vec<(&'static str, FieldSource)> {
        vec![
            ("name", FieldSource::value(self.name.clone())),
            ("slug", FieldSource::value(self.slug.clone())),
            ("color", FieldSource::value(self.color.clone())),
            ("description", FieldSource::value(self.description.clone())),
        ]
    }

    fn apply(&mut self, input: &mut Input) {
        if let Some(name) = input.take::<String>("name") {
            if name.trim().is_empty() {
                input.error("name", "This field may not be blank.");
            }
            self.name = name;
        }
        if let Some(slug) = input.take::<String>("slug") {
            if !is_valid_slug(&slug) {
                input.error(
                    "slug",
                    "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
                );
            }
            self.slug = slug;
        }
        if let Some(color) = input.take::<String>("color") {
            if !is_valid_color(&color) {
                input.error("color", "Enter a valid hexadecimal RGB color code.");
            }
            self.color = color.to_lowercase();
        }
        if let Some(description) = input.text("description") {
            self.description = description;
        }
    }

    async fn validate<S: Store + ?Sized>(&self, store: &S, _previous: Option<&Self>) -> Result<FieldErrors> {
        let mut errors = FieldErrors::new();
        if conflicts(store, self, |other: &Self| other.name == self.name).await? {
            errors.add("name", "Peering role with this name already exists.");
        }
        if conflicts(store, self, |other: &Self| other.slug == self.slug).await? {
            errors.add("slug", "Peering role with this slug already exists.");
        }
        Ok(errors)
    }
}
