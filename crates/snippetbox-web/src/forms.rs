//! Snippet creation form.

use snippetbox_core::form::{self, Field, FieldParseError, FormFields};
use snippetbox_core::validator::{self, Validator};

/// Maximum title length, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Lifetimes a snippet may be created with, in days, with their labels.
pub const EXPIRY_CHOICES: &[(i64, &str)] = &[(365, "One Year"), (7, "One Week"), (1, "One Day")];

/// Lifetime preselected on an empty form.
pub const DEFAULT_EXPIRES_DAYS: i64 = 365;

/// Data posted to `/snippet/create`.
///
/// `Default` gives the decode target, with every field unset. Use
/// [`SnippetCreateForm::new`] for the blank form shown to the user.
#[derive(Debug, Default)]
pub struct SnippetCreateForm {
    pub title: String,
    pub content: String,
    pub expires: i64,
    pub validator: Validator,
}

impl SnippetCreateForm {
    /// Blank form with the default lifetime selected.
    pub fn new() -> Self {
        Self {
            expires: DEFAULT_EXPIRES_DAYS,
            ..Default::default()
        }
    }

    /// Run the field checks, recording errors on the embedded validator.
    ///
    /// Returns whether the form is valid.
    pub fn validate(&mut self) -> bool {
        self.validator.check_field(
            validator::required(&self.title),
            "title",
            "This field cannot be blank",
        );
        self.validator.check_field(
            validator::max_chars(&self.title, MAX_TITLE_CHARS),
            "title",
            "This field cannot be more than 100 characters long",
        );
        self.validator.check_field(
            validator::required(&self.content),
            "content",
            "This field cannot be blank",
        );

        let permitted: Vec<i64> = EXPIRY_CHOICES.iter().map(|(days, _)| *days).collect();
        self.validator.check_field(
            validator::permitted_value(&self.expires, &permitted),
            "expires",
            "This field must equal 1, 7 or 365",
        );

        self.validator.valid()
    }
}

fn parse_title(form: &mut SnippetCreateForm, value: &str) -> Result<(), FieldParseError> {
    form.title = value.to_string();
    Ok(())
}

fn parse_content(form: &mut SnippetCreateForm, value: &str) -> Result<(), FieldParseError> {
    form.content = value.to_string();
    Ok(())
}

fn parse_expires(form: &mut SnippetCreateForm, value: &str) -> Result<(), FieldParseError> {
    form.expires = form::parse_int(value)?;
    Ok(())
}

impl FormFields for SnippetCreateForm {
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "title",
            parse: parse_title,
        },
        Field {
            key: "content",
            parse: parse_content,
        },
        Field {
            key: "expires",
            parse: parse_expires,
        },
    ];
}
