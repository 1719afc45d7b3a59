//! Core expense category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// A validated, non-empty category name of at most 100 characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    pub const MAX_LENGTH: usize = 100;

    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is
    /// empty after trimming, or [Error::TextTooLong] if it is too long.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else if name.chars().count() > Self::MAX_LENGTH {
            Err(Error::TextTooLong {
                field: "Category name",
                max: Self::MAX_LENGTH,
            })
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A display color in the form `#rrggbb`, stored in lowercase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryColor(String);

impl CategoryColor {
    /// Create a color from a hex string like `#1F2937`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidColor] if `color` is not `#` followed by six hex digits.
    pub fn new(color: &str) -> Result<Self, Error> {
        let color = color.trim();
        let is_valid = color.len() == 7
            && color.starts_with('#')
            && color[1..].chars().all(|c| c.is_ascii_hexdigit());

        if is_valid {
            Ok(Self(color.to_ascii_lowercase()))
        } else {
            Err(Error::InvalidColor(color.to_owned()))
        }
    }

    pub fn new_unchecked(color: &str) -> Self {
        Self(color.to_owned())
    }
}

impl Default for CategoryColor {
    fn default() -> Self {
        Self::new_unchecked("#6b7280")
    }
}

impl AsRef<str> for CategoryColor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Database identifier for a category.
pub type CategoryId = i64;

/// A kind of expense shared by all users, e.g. 'Food' or 'Veterinarian'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ExpenseCategory {
    pub id: CategoryId,
    pub name: CategoryName,
    pub description: String,
    pub color: CategoryColor,
}

/// The validated fields of a category before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub name: CategoryName,
    pub description: String,
    pub color: CategoryColor,
}

/// Form data for category creation and editing.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CategoryFormData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
}

impl CategoryFormData {
    /// Validate the form, an empty color falls back to the default color.
    pub fn validate(&self) -> Result<NewCategory, Error> {
        let name = CategoryName::new(&self.name)?;
        let color = if self.color.trim().is_empty() {
            CategoryColor::default()
        } else {
            CategoryColor::new(&self.color)?
        };

        Ok(NewCategory {
            name,
            description: self.description.trim().to_owned(),
            color,
        })
    }
}

impl From<&ExpenseCategory> for CategoryFormData {
    fn from(category: &ExpenseCategory) -> Self {
        Self {
            name: category.name.to_string(),
            description: category.description.clone(),
            color: category.color.as_ref().to_owned(),
        }
    }
}

#[cfg(test)]
mod category_domain_tests {
    use crate::{
        Error,
        category::{CategoryColor, CategoryFormData, CategoryName},
    };

    #[test]
    fn name_fails_on_just_whitespace() {
        assert_eq!(CategoryName::new("\n\t \r"), Err(Error::EmptyCategoryName));
    }

    #[test]
    fn name_fails_when_too_long() {
        let name = "a".repeat(101);

        assert!(matches!(
            CategoryName::new(&name),
            Err(Error::TextTooLong { max: 100, .. })
        ));
    }

    #[test]
    fn name_is_trimmed() {
        assert_eq!(CategoryName::new("  Food ").unwrap().as_ref(), "Food");
    }

    #[test]
    fn color_is_lowercased() {
        assert_eq!(CategoryColor::new("#A1B2C3").unwrap().as_ref(), "#a1b2c3");
    }

    #[test]
    fn color_rejects_bad_values() {
        for color in ["red", "#abc", "#abcdeg", "a1b2c3d"] {
            assert_eq!(
                CategoryColor::new(color),
                Err(Error::InvalidColor(color.to_owned())),
                "{color} should be rejected"
            );
        }
    }

    #[test]
    fn empty_color_uses_default() {
        let form = CategoryFormData {
            name: "Toys".to_owned(),
            description: String::new(),
            color: String::new(),
        };

        assert_eq!(form.validate().unwrap().color, CategoryColor::default());
    }
}
