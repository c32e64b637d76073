//! Description enrichment for the synthetic providers.

/// Keyword to qualifier, first hit wins.
type QualifierTable = &'static [(&'static str, &'static str)];

const BASIC: QualifierTable = &[
    ("website", "Web Development"),
    ("web ", "Web Development"),
    ("logo", "Logo Design"),
    ("design", "Design Work"),
    ("consult", "Consulting"),
    ("content", "Content Writing"),
];

const STANDARD: QualifierTable = &[
    ("website", "Custom Design with Responsive Layout"),
    ("web ", "Custom Design with Responsive Layout"),
    ("logo", "Brand Identity Design"),
    ("seo", "Search Engine Optimization"),
    ("content", "Professional Copywriting"),
    ("copywriting", "Professional Copywriting"),
    ("consult", "Expert Advisory Session"),
    ("hosting", "Managed Hosting Plan"),
    ("design", "Creative Design Work"),
];

const ADVANCED: QualifierTable = &[
    ("delivery", "Home Delivery Service"),
    ("website", "Custom Design with Responsive Layout and Mobile Optimization"),
    ("web ", "Custom Design with Responsive Layout and Mobile Optimization"),
    ("logo", "Brand Identity Design with Style Guide"),
    ("seo", "Search Engine Optimization and Keyword Research"),
    ("marketing", "Multi-channel Campaign Management"),
    ("content", "Professional Copywriting with SEO Review"),
    ("copywriting", "Professional Copywriting with SEO Review"),
    ("consult", "Expert Advisory Session with Written Report"),
    ("hosting", "Managed Hosting Plan with Daily Backups"),
    ("maintenance", "Ongoing Support and Updates"),
    ("design", "Creative Design Work with Revisions"),
];

/// How much qualifying text a provider appends to item descriptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Enrichment {
    #[default]
    None,
    Basic,
    Standard,
    Advanced,
}

impl Enrichment {
    fn table(self) -> QualifierTable {
        match self {
            Enrichment::None => &[],
            Enrichment::Basic => BASIC,
            Enrichment::Standard => STANDARD,
            Enrichment::Advanced => ADVANCED,
        }
    }

    /// Qualifier for a description, if any keyword matches.
    pub fn qualifier(self, description: &str) -> Option<&'static str> {
        let lower = format!("{} ", description.to_lowercase());
        self.table()
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, qualifier)| *qualifier)
    }

    /// Append `" (qualifier)"` unless the description already carries one.
    pub fn enrich(self, description: &str) -> String {
        if description.contains('(') {
            return description.to_string();
        }

        match self.qualifier(description) {
            Some(qualifier) => format!("{} ({})", description, qualifier),
            None => description.to_string(),
        }
    }
}
