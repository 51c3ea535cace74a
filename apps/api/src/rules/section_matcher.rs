/// Decides whether a normalized section title satisfies a normalized synonym.
///
/// Both arguments have already been through `normalize_section_title`.
pub trait SectionMatcher: Send + Sync {
    fn matches(&self, title: &str, synonym: &str) -> bool;

    fn name(&self) -> &'static str;
}

/// Lenient matching: the synonym may appear anywhere in the title.
/// "Education & Volunteering" satisfies education; so does "Continuing education".
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl SectionMatcher for SubstringMatcher {
    fn matches(&self, title: &str, synonym: &str) -> bool {
        title.contains(synonym)
    }

    fn name(&self) -> &'static str {
        "substring"
    }
}

/// Strict matching: the whole title must equal the synonym.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl SectionMatcher for ExactMatcher {
    fn matches(&self, title: &str, synonym: &str) -> bool {
        title == synonym
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}
