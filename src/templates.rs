//! Starter documents for new files.

use std::fmt;

/// A starter document offered when creating a new file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    CodeSampleReadme,
    ApiSpec,
    ConceptualArticle,
    Simple,
}

impl Template {
    /// All templates, in menu order.
    pub const ALL: [Template; 4] = [
        Template::CodeSampleReadme,
        Template::ApiSpec,
        Template::ConceptualArticle,
        Template::Simple,
    ];

    /// Resolve a menu label. Unknown labels fall back to the simple file.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Code sample readme" => Self::CodeSampleReadme,
            "API spec" => Self::ApiSpec,
            "Conceptual article" => Self::ConceptualArticle,
            _ => Self::Simple,
        }
    }

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CodeSampleReadme => "Code sample readme",
            Self::ApiSpec => "API spec",
            Self::ConceptualArticle => "Conceptual article",
            Self::Simple => "Simple file",
        }
    }

    /// Markdown body of the template.
    pub fn content(&self) -> &'static str {
        match self {
            Self::CodeSampleReadme => include_str!("../templates/readme-code-sample.md"),
            Self::ApiSpec => include_str!("../templates/object-definition.md"),
            Self::ConceptualArticle => include_str!("../templates/conceptual-article.md"),
            Self::Simple => include_str!("../templates/simple-file.md"),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
