//! System label vocabulary.
//!
//! The vocabulary is injected configuration: deployments may replace the
//! built-in lists with a JSON file (`LABEL_VOCABULARY_PATH`).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::labels::validate_label_name;
use crate::models::{LabelCategory, LabelTemplate, RagStatus};

/// Environment variable pointing at a JSON vocabulary file.
pub const ENV_LABEL_VOCABULARY_PATH: &str = "LABEL_VOCABULARY_PATH";

/// The closed set of system labels seeded into every organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelVocabulary {
    pub content_types: Vec<LabelTemplate>,
    pub departments: Vec<LabelTemplate>,
}

fn entry(
    name: &str,
    display_name: &str,
    description: &str,
    color: &str,
    category: LabelCategory,
    retention_days: Option<i32>,
    rag_default: RagStatus,
) -> LabelTemplate {
    LabelTemplate {
        name: name.to_string(),
        display_name: display_name.to_string(),
        description: Some(description.to_string()),
        color: color.to_string(),
        icon: None,
        category,
        retention_days,
        rag_default,
    }
}

impl Default for LabelVocabulary {
    #[rustfmt::skip]
    fn default() -> Self {
        use LabelCategory::{ContentType as C, Department as D};
        use RagStatus::{Eligible, Excluded, Pending};

        Self {
            content_types: vec![
                entry("TUTORIAL", "Tutorial", "Step-by-step instructional walkthrough", "#3B82F6", C, None, Eligible),
                entry("DEMO", "Demo", "Product or feature demonstration", "#8B5CF6", C, None, Eligible),
                entry("TRAINING", "Training", "Onboarding or formal training material", "#10B981", C, None, Eligible),
                entry("PRESENTATION", "Presentation", "Slide-driven talk or pitch", "#6366F1", C, None, Eligible),
                entry("ANNOUNCEMENT", "Announcement", "Company or team announcement", "#F59E0B", C, Some(180), Eligible),
                entry("MEETING", "Meeting", "Recorded meeting or call", "#64748B", C, Some(90), Pending),
                entry("INTERVIEW", "Interview", "Candidate or customer interview", "#EC4899", C, Some(60), Excluded),
                entry("STATUS_UPDATE", "Status Update", "Short progress or standup update", "#14B8A6", C, Some(30), Excluded),
                entry("FEEDBACK", "Feedback", "Review, critique, or feedback session", "#F97316", C, Some(30), Excluded),
                entry("TROUBLESHOOTING", "Troubleshooting", "Bug report or issue reproduction", "#EF4444", C, Some(14), Eligible),
                entry("QUICK_NOTE", "Quick Note", "Brief informal recording", "#A3A3A3", C, Some(7), Excluded),
                entry("PERSONAL", "Personal", "Personal or off-topic recording", "#D946EF", C, Some(30), Excluded),
            ],
            departments: vec![
                entry("TECH", "Engineering", "Engineering and technical topics", "#2563EB", D, None, Pending),
                entry("PRODUCT", "Product", "Product management and design", "#7C3AED", D, None, Pending),
                entry("SALES", "Sales", "Sales conversations and enablement", "#059669", D, None, Pending),
                entry("MARKETING", "Marketing", "Marketing campaigns and content", "#DB2777", D, None, Pending),
                entry("SUPPORT", "Customer Support", "Customer support and success", "#0891B2", D, None, Pending),
                entry("OPERATIONS", "Operations", "Business operations and process", "#CA8A04", D, None, Pending),
                entry("FINANCE", "Finance", "Finance and accounting", "#65A30D", D, None, Excluded),
                entry("HR", "People", "People operations and HR", "#E11D48", D, None, Excluded),
                entry("LEGAL", "Legal", "Legal and compliance", "#475569", D, None, Excluded),
                entry("LEADERSHIP", "Leadership", "Executive and leadership communication", "#B45309", D, None, Pending),
            ],
        }
    }
}

impl LabelVocabulary {
    /// Load from `LABEL_VOCABULARY_PATH` if set, otherwise the built-in lists.
    pub fn from_env() -> Result<Self> {
        match std::env::var(ENV_LABEL_VOCABULARY_PATH) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Load and validate a JSON vocabulary file.
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
            .map_err(|e| Error::Config(format!("Invalid label vocabulary in {}: {}", path, e)))
    }

    /// Parse and validate a JSON vocabulary.
    pub fn from_json(raw: &str) -> Result<Self> {
        let vocabulary: Self = serde_json::from_str(raw)?;
        vocabulary.validate()?;
        Ok(vocabulary)
    }

    /// Every entry must have a valid, unique name and sit in the list matching its category.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for (list, category) in [
            (&self.content_types, LabelCategory::ContentType),
            (&self.departments, LabelCategory::Department),
        ] {
            for template in list {
                validate_label_name(&template.name)?;
                if template.category != category {
                    return Err(Error::Config(format!(
                        "Label {} is listed under {} but has category {}",
                        template.name, category, template.category
                    )));
                }
                if !seen.insert(template.name.as_str()) {
                    return Err(Error::Config(format!(
                        "Label {} appears more than once in the vocabulary",
                        template.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// All templates, content types first.
    pub fn all(&self) -> impl Iterator<Item = &LabelTemplate> {
        self.content_types.iter().chain(self.departments.iter())
    }

    /// Number of system labels seeded per organization.
    pub fn len(&self) -> usize {
        self.content_types.len() + self.departments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn content_type_names(&self) -> Vec<&str> {
        self.content_types.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn department_names(&self) -> Vec<&str> {
        self.departments.iter().map(|t| t.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary_is_valid() {
        let vocab = LabelVocabulary::default();
        vocab.validate().unwrap();
        assert!(!vocab.is_empty());
        assert_eq!(vocab.len(), vocab.all().count());
    }

    #[test]
    fn test_default_troubleshooting_has_two_week_retention() {
        let vocab = LabelVocabulary::default();
        let t = vocab
            .content_types
            .iter()
            .find(|t| t.name == "TROUBLESHOOTING")
            .unwrap();
        assert_eq!(t.retention_days, Some(14));
        let tech = vocab.departments.iter().find(|t| t.name == "TECH").unwrap();
        assert_eq!(tech.retention_days, None);
    }

    #[test]
    fn test_from_json_round_trip() {
        let vocab = LabelVocabulary::default();
        let json = serde_json::to_string(&vocab).unwrap();
        assert_eq!(LabelVocabulary::from_json(&json).unwrap(), vocab);
    }

    #[test]
    fn test_rejects_misfiled_category() {
        let mut vocab = LabelVocabulary::default();
        let mut misfiled = vocab.departments[0].clone();
        misfiled.name = "MISFILED".into();
        vocab.content_types.push(misfiled);
        assert!(matches!(vocab.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let mut vocab = LabelVocabulary::default();
        let dup = vocab.content_types[0].clone();
        vocab.content_types.push(dup);
        assert!(vocab.validate().is_err());
    }

    #[test]
    fn test_rejects_invalid_name() {
        let json = r##"{"content_types":[{"name":"bad name","display_name":"Bad","color":"#000","category":"content_type"}],"departments":[]}"##;
        assert!(LabelVocabulary::from_json(json).is_err());
    }
}
